//! Session workflow orchestration.
//!
//! Every operation follows the same shape: lock the session, apply a pure
//! transition, unlock, and only then await the remote call. The session
//! lock is never held across a remote call, so snapshots stay readable and
//! other cards stay editable while a request is in flight.

use std::sync::Arc;

use decora_core::error::CoreError;
use decora_core::image::UploadedImage;
use decora_core::workflow::{Completion, EditTicket, GenerationTicket, WorkflowState, WorkflowView};
use decora_events::NotificationSink;
use tokio::task::JoinHandle;

use crate::remote::RemoteGeneration;

/// Per-session state container.
pub type Session = tokio::sync::Mutex<WorkflowState>;

/// Runs workflow transitions around the remote generation calls.
#[derive(Clone)]
pub struct Orchestrator {
    remote: Arc<dyn RemoteGeneration>,
    sink: Arc<dyn NotificationSink>,
}

impl Orchestrator {
    pub fn new(remote: Arc<dyn RemoteGeneration>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { remote, sink }
    }

    pub async fn view(&self, session: &Session) -> WorkflowView {
        session.lock().await.view()
    }

    pub async fn supply_image(
        &self,
        session: &Session,
        image: UploadedImage,
    ) -> Result<(), CoreError> {
        session.lock().await.supply_image(image)
    }

    /// Validate the email, hand it to the notification sink, and return
    /// the ticket for the analysis run.
    pub async fn confirm_email(
        &self,
        session: &Session,
        email: &str,
    ) -> Result<GenerationTicket, CoreError> {
        let ticket = session.lock().await.confirm_email(email)?;
        if let Some(email) = &ticket.email {
            self.sink.notify(email);
        }
        Ok(ticket)
    }

    pub async fn skip_email(&self, session: &Session) -> Result<GenerationTicket, CoreError> {
        session.lock().await.skip_email()
    }

    /// Space analysis followed by the initial proposal batch.
    ///
    /// Failures are recorded on the session as a user-facing message and
    /// never propagate. Returns [`Completion::Stale`] when the run was
    /// superseded before it finished.
    pub async fn run_generation(&self, session: &Session, ticket: GenerationTicket) -> Completion {
        let epoch = ticket.epoch;

        let analysis = match self.remote.analyze_space(&ticket.image).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!(epoch, error = %e, "Space analysis failed");
                return session
                    .lock()
                    .await
                    .generation_failed(epoch, &e.to_string());
            }
        };
        tracing::debug!(epoch, analysis = %analysis, "Space analysed");

        if session.lock().await.analysis_completed(epoch, analysis) == Completion::Stale {
            tracing::debug!(epoch, "Analysis run superseded, skipping proposals");
            return Completion::Stale;
        }

        let proposals = match self.remote.generate_initial_proposals(&ticket.image).await {
            Ok(proposals) => proposals,
            Err(e) => {
                tracing::error!(epoch, error = %e, "Proposal generation failed");
                return session
                    .lock()
                    .await
                    .generation_failed(epoch, &e.to_string());
            }
        };

        let mut state = session.lock().await;
        match state.proposals_generated(epoch, proposals) {
            Ok(completion) => {
                if completion == Completion::Applied {
                    tracing::info!(epoch, "Proposals ready");
                }
                completion
            }
            Err(e) => {
                tracing::error!(epoch, error = %e, "Rejected proposal batch");
                state.generation_failed(epoch, "")
            }
        }
    }

    /// Returns `false` when ignored because the global loading flag is set.
    pub async fn select(&self, session: &Session, proposal_id: &str) -> Result<bool, CoreError> {
        session.lock().await.select_for_editing(proposal_id)
    }

    pub async fn begin_edit(
        &self,
        session: &Session,
        proposal_id: &str,
        instruction: &str,
    ) -> Result<EditTicket, CoreError> {
        session.lock().await.begin_edit(proposal_id, instruction)
    }

    /// Apply one edit to one proposal. Only that proposal's image changes.
    pub async fn run_edit(&self, session: &Session, ticket: EditTicket) -> Completion {
        let result = self
            .remote
            .apply_edit(&ticket.image, &ticket.mime_type, &ticket.instruction)
            .await;

        let mut state = session.lock().await;
        match result {
            Ok(image) => {
                let completion = state.edit_completed(ticket.epoch, &ticket.proposal_id, image);
                tracing::info!(
                    style_id = %ticket.proposal_id,
                    applied = completion == Completion::Applied,
                    "Edit finished"
                );
                completion
            }
            Err(e) => {
                tracing::error!(style_id = %ticket.proposal_id, error = %e, "Edit failed");
                state.edit_failed(ticket.epoch, &ticket.proposal_id, &e.to_string())
            }
        }
    }

    pub async fn dismiss_error(&self, session: &Session) {
        session.lock().await.dismiss_error();
    }

    pub async fn reset(&self, session: &Session) {
        session.lock().await.reset();
    }

    // ---- detached runs ----

    /// Run [`run_generation`](Self::run_generation) on a background task.
    pub fn spawn_generation(
        &self,
        session: Arc<Session>,
        ticket: GenerationTicket,
    ) -> JoinHandle<Completion> {
        let this = self.clone();
        tokio::spawn(async move { this.run_generation(&session, ticket).await })
    }

    /// Run [`run_edit`](Self::run_edit) on a background task.
    pub fn spawn_edit(&self, session: Arc<Session>, ticket: EditTicket) -> JoinHandle<Completion> {
        let this = self.clone();
        tokio::spawn(async move { this.run_edit(&session, ticket).await })
    }
}
