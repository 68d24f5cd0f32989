//! Workflow state machine for one user session.
//!
//! [`WorkflowState`] is a plain struct; every user action and every remote
//! outcome is a method that validates the current phase and mutates the
//! state in one step. Methods that start remote work hand back a ticket
//! ([`GenerationTicket`], [`EditTicket`]) carrying everything the remote
//! call needs plus the state `epoch` it was issued under. Completions
//! report their ticket's epoch back; if the session was reset or given a
//! new image in the meantime the result is discarded.
//!
//! ```text
//! Empty --image--> AwaitingEmail --email/skip--> Analyzing --ok--> ProposalsReady
//!                       ^                            |
//!                       +----------- failure --------+
//! ProposalsReady: select(id) / edit(id) per card, reset -> Empty
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::image::{EncodedImage, UploadedImage};
use crate::proposal::{Product, StyleProposal};
use crate::style::{is_catalog_style, PROPOSAL_COUNT};

// ---------------------------------------------------------------------------
// User-facing messages
// ---------------------------------------------------------------------------

pub const MSG_ANALYZING_SPACE: &str = "Analizando tu espacio...";
pub const MSG_GENERATING_PROPOSALS: &str = "Generando propuestas de decoración...";
pub const MSG_APPLYING_EDIT: &str = "Aplicando tus ajustes...";

/// Fallback when a generation failure carries no message.
pub const GENERIC_GENERATION_ERROR: &str = "Ocurrió un error inesperado.";
/// Fallback when an edit failure carries no message.
pub const GENERIC_EDIT_ERROR: &str = "Ocurrió un error al editar la imagen.";

/// Use `message` if it has content, else `fallback`.
pub fn user_message(message: &str, fallback: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Empty,
    AwaitingEmail,
    Analyzing,
    ProposalsReady,
}

/// Global loading sub-phase while [`Phase::Analyzing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPhase {
    AnalyzingSpace,
    GeneratingProposals,
}

impl LoadingPhase {
    pub fn message(self) -> &'static str {
        match self {
            LoadingPhase::AnalyzingSpace => MSG_ANALYZING_SPACE,
            LoadingPhase::GeneratingProposals => MSG_GENERATING_PROPOSALS,
        }
    }
}

/// Whether a remote completion was applied or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Work order for the analysis + initial generation run.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub epoch: u64,
    pub image: Arc<UploadedImage>,
    /// Address to forward to the notification sink; `None` when bypassed.
    pub email: Option<String>,
}

/// Work order for a single proposal edit.
#[derive(Debug, Clone)]
pub struct EditTicket {
    pub epoch: u64,
    pub proposal_id: String,
    pub image: EncodedImage,
    pub mime_type: String,
    /// Whitespace-trimmed, never empty.
    pub instruction: String,
}

// ---------------------------------------------------------------------------
// WorkflowState
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct WorkflowState {
    phase: Phase,
    image: Option<Arc<UploadedImage>>,
    analysis: Option<String>,
    proposals: Vec<StyleProposal>,
    selected: Option<String>,
    loading: Option<LoadingPhase>,
    /// Proposals with an edit in flight (per-card loading).
    editing: BTreeSet<String>,
    error: Option<String>,
    epoch: u64,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- accessors ----

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn image(&self) -> Option<&Arc<UploadedImage>> {
        self.image.as_ref()
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn proposals(&self) -> &[StyleProposal] {
        &self.proposals
    }

    pub fn proposal(&self, id: &str) -> Option<&StyleProposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn loading(&self) -> Option<LoadingPhase> {
        self.loading
    }

    /// The global loading flag. Per-card edits do not set it.
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.editing.contains(id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // ---- intake ----

    /// Accept a new room photo and wait for the email step.
    ///
    /// Replaces any previous image and its results.
    pub fn supply_image(&mut self, image: UploadedImage) -> Result<(), CoreError> {
        if self.phase == Phase::Analyzing {
            return Err(CoreError::Conflict(
                "An analysis is already in progress".to_string(),
            ));
        }
        let epoch = self.epoch + 1;
        *self = Self {
            phase: Phase::AwaitingEmail,
            image: Some(Arc::new(image)),
            epoch,
            ..Self::default()
        };
        Ok(())
    }

    /// Confirm the captured email and start the analysis run.
    pub fn confirm_email(&mut self, email: &str) -> Result<GenerationTicket, CoreError> {
        let email = email.trim();
        if !email.validate_email() {
            return Err(CoreError::Validation(format!(
                "'{email}' is not a valid email address"
            )));
        }
        self.begin_analysis(Some(email.to_string()))
    }

    /// Start the analysis run without capturing an email.
    pub fn skip_email(&mut self) -> Result<GenerationTicket, CoreError> {
        self.begin_analysis(None)
    }

    fn begin_analysis(&mut self, email: Option<String>) -> Result<GenerationTicket, CoreError> {
        if self.phase != Phase::AwaitingEmail {
            return Err(CoreError::Conflict(
                "No image is waiting for the email step".to_string(),
            ));
        }
        let image = self
            .image
            .clone()
            .ok_or_else(|| CoreError::Internal("Awaiting email without an image".to_string()))?;

        self.phase = Phase::Analyzing;
        self.loading = Some(LoadingPhase::AnalyzingSpace);
        self.error = None;

        Ok(GenerationTicket {
            epoch: self.epoch,
            image,
            email,
        })
    }

    // ---- analysis run outcomes ----

    /// Store the space analysis and move on to proposal generation.
    pub fn analysis_completed(&mut self, epoch: u64, analysis: String) -> Completion {
        if !self.is_current_run(epoch) {
            return Completion::Stale;
        }
        self.analysis = Some(analysis);
        self.loading = Some(LoadingPhase::GeneratingProposals);
        Completion::Applied
    }

    /// Store the proposal batch.
    ///
    /// The batch must be exactly one proposal per catalog style; anything
    /// else is rejected without touching the state.
    pub fn proposals_generated(
        &mut self,
        epoch: u64,
        proposals: Vec<StyleProposal>,
    ) -> Result<Completion, CoreError> {
        if !self.is_current_run(epoch) {
            return Ok(Completion::Stale);
        }
        validate_batch(&proposals)?;

        self.proposals = proposals;
        self.loading = None;
        self.phase = Phase::ProposalsReady;
        Ok(Completion::Applied)
    }

    /// Record a failed analysis run. The image is kept so the user can
    /// retry from the email step.
    pub fn generation_failed(&mut self, epoch: u64, message: &str) -> Completion {
        if !self.is_current_run(epoch) {
            return Completion::Stale;
        }
        self.error = Some(user_message(message, GENERIC_GENERATION_ERROR));
        self.loading = None;
        self.proposals.clear();
        self.phase = Phase::AwaitingEmail;
        Completion::Applied
    }

    fn is_current_run(&self, epoch: u64) -> bool {
        epoch == self.epoch && self.phase == Phase::Analyzing
    }

    // ---- editing ----

    /// Mark a proposal as the one being edited.
    ///
    /// Returns `Ok(false)` without changing anything while the global
    /// loading flag is set.
    pub fn select_for_editing(&mut self, id: &str) -> Result<bool, CoreError> {
        if self.is_loading() {
            return Ok(false);
        }
        if self.proposal(id).is_none() {
            return Err(proposal_not_found(id));
        }
        self.selected = Some(id.to_string());
        Ok(true)
    }

    /// Validate an edit instruction and mark the card as loading.
    pub fn begin_edit(&mut self, id: &str, instruction: &str) -> Result<EditTicket, CoreError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(CoreError::Validation(
                "Edit instruction must not be empty".to_string(),
            ));
        }
        if self.phase != Phase::ProposalsReady {
            return Err(CoreError::Conflict("Proposals are not ready".to_string()));
        }
        let proposal = self.proposal(id).ok_or_else(|| proposal_not_found(id))?;
        if self.editing.contains(id) {
            return Err(CoreError::Conflict(format!(
                "An edit is already in progress for proposal '{id}'"
            )));
        }

        let ticket = EditTicket {
            epoch: self.epoch,
            proposal_id: proposal.id.clone(),
            image: proposal.image.clone(),
            mime_type: edit_mime_type(proposal),
            instruction: instruction.to_string(),
        };

        self.editing.insert(ticket.proposal_id.clone());
        self.selected = Some(ticket.proposal_id.clone());
        self.error = None;
        Ok(ticket)
    }

    /// Replace the edited proposal's image in place.
    pub fn edit_completed(&mut self, epoch: u64, id: &str, image: EncodedImage) -> Completion {
        if epoch != self.epoch || !self.editing.remove(id) {
            return Completion::Stale;
        }
        match self.proposals.iter_mut().find(|p| p.id == id) {
            Some(proposal) => {
                proposal.replace_image(image);
                Completion::Applied
            }
            None => Completion::Stale,
        }
    }

    /// Record a failed edit; the previous image stays.
    pub fn edit_failed(&mut self, epoch: u64, id: &str, message: &str) -> Completion {
        if epoch != self.epoch || !self.editing.remove(id) {
            return Completion::Stale;
        }
        self.error = Some(user_message(message, GENERIC_EDIT_ERROR));
        Completion::Applied
    }

    // ---- misc ----

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Discard everything and return to [`Phase::Empty`].
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self {
            epoch,
            ..Self::default()
        };
    }

    /// Snapshot for the rendering layer.
    pub fn view(&self) -> WorkflowView {
        WorkflowView {
            phase: self.phase,
            epoch: self.epoch,
            image: self.image.as_deref().map(ImageView::from),
            analysis: self.analysis.clone(),
            proposals: self
                .proposals
                .iter()
                .map(|p| ProposalView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    image_data_url: p.image.to_data_url(),
                    description: p.description.clone(),
                    furniture_recs: p.furniture_recs.clone(),
                    color_recs: p.color_recs.clone(),
                    products: p.products.clone(),
                    edit_count: p.edit_count,
                    is_selected: self.selected.as_deref() == Some(p.id.as_str()),
                    is_editing: self.editing.contains(&p.id),
                })
                .collect(),
            selected_proposal: self.selected.clone(),
            is_loading: self.is_loading(),
            loading_message: self.loading.map(LoadingPhase::message),
            editing: self.editing.iter().cloned().collect(),
            error: self.error.clone(),
        }
    }
}

fn proposal_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Proposal",
        id: id.to_string(),
    }
}

/// Exactly one proposal per catalog style, no duplicates.
fn validate_batch(proposals: &[StyleProposal]) -> Result<(), CoreError> {
    if proposals.len() != PROPOSAL_COUNT {
        return Err(CoreError::Internal(format!(
            "Expected {PROPOSAL_COUNT} proposals, got {}",
            proposals.len()
        )));
    }
    let ids: BTreeSet<&str> = proposals.iter().map(|p| p.id.as_str()).collect();
    if ids.len() != PROPOSAL_COUNT || !ids.iter().all(|id| is_catalog_style(id)) {
        return Err(CoreError::Internal(format!(
            "Proposal ids {ids:?} do not match the style catalog"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowView {
    pub phase: Phase,
    pub epoch: u64,
    pub image: Option<ImageView>,
    pub analysis: Option<String>,
    pub proposals: Vec<ProposalView>,
    pub selected_proposal: Option<String>,
    pub is_loading: bool,
    pub loading_message: Option<&'static str>,
    pub editing: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub mime_type: String,
    pub data_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl From<&UploadedImage> for ImageView {
    fn from(image: &UploadedImage) -> Self {
        let (width, height) = image.dimensions().unzip();
        Self {
            mime_type: image.mime_type().to_string(),
            data_url: image.data_url(),
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    pub id: String,
    pub name: String,
    pub image_data_url: String,
    pub description: String,
    pub furniture_recs: String,
    pub color_recs: String,
    pub products: Vec<Product>,
    pub edit_count: u32,
    pub is_selected: bool,
    pub is_editing: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// MIME type sent with an edit: the current image's own, or the original
/// upload's when the image carries none.
fn edit_mime_type(proposal: &StyleProposal) -> String {
    let own = proposal.image.mime_type.trim();
    if own.is_empty() {
        proposal.original_mime_type.clone()
    } else {
        own.to_string()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::proposal::{ProductSuggestion, StyleDetails};
    use crate::style::STYLE_CATALOG;

    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    fn upload() -> UploadedImage {
        UploadedImage::from_upload(JPEG_HEADER.to_vec(), Some("image/jpeg")).unwrap()
    }

    fn batch() -> Vec<StyleProposal> {
        STYLE_CATALOG
            .iter()
            .map(|style| {
                StyleProposal::assemble(
                    style,
                    EncodedImage::new("image/png", format!("{}-v0", style.id)),
                    StyleDetails {
                        description: format!("{} description", style.name),
                        furniture_recs: "muebles".to_string(),
                        color_recs: "colores".to_string(),
                        products: (0..5)
                            .map(|i| ProductSuggestion {
                                name: format!("{} producto {i}", style.id),
                                url: None,
                            })
                            .collect(),
                    },
                    "image/jpeg",
                )
            })
            .collect()
    }

    /// Drive a fresh state all the way to `ProposalsReady`.
    fn ready_state() -> WorkflowState {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.confirm_email("a@b.com").unwrap();
        state.analysis_completed(ticket.epoch, "Living room, modern style".to_string());
        state.proposals_generated(ticket.epoch, batch()).unwrap();
        state
    }

    #[test]
    fn new_state_is_empty() {
        let state = WorkflowState::new();
        assert_eq!(state.phase(), Phase::Empty);
        assert!(state.image().is_none());
        assert!(state.proposals().is_empty());
        assert!(!state.is_loading());
    }

    #[test]
    fn supply_image_awaits_email() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        assert_eq!(state.phase(), Phase::AwaitingEmail);
        assert!(state.image().is_some());
        assert_eq!(state.epoch(), 1);
    }

    #[test]
    fn confirm_email_starts_analysis() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.confirm_email("  a@b.com ").unwrap();

        assert_eq!(ticket.email.as_deref(), Some("a@b.com"));
        assert_eq!(ticket.epoch, state.epoch());
        assert_eq!(state.phase(), Phase::Analyzing);
        assert_eq!(state.loading(), Some(LoadingPhase::AnalyzingSpace));
        assert_eq!(state.view().loading_message, Some(MSG_ANALYZING_SPACE));
    }

    #[test]
    fn confirm_email_rejects_invalid_address() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        assert_matches!(state.confirm_email("nope"), Err(CoreError::Validation(_)));
        assert_eq!(state.phase(), Phase::AwaitingEmail);
    }

    #[test]
    fn confirm_email_without_image_conflicts() {
        let mut state = WorkflowState::new();
        assert_matches!(state.confirm_email("a@b.com"), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn skip_email_starts_analysis_without_address() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.skip_email().unwrap();
        assert!(ticket.email.is_none());
        assert_eq!(state.phase(), Phase::Analyzing);
    }

    #[test]
    fn supply_image_rejected_while_analyzing() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        state.skip_email().unwrap();
        assert_matches!(state.supply_image(upload()), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn analysis_then_proposals_reach_ready() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.confirm_email("a@b.com").unwrap();

        assert_eq!(
            state.analysis_completed(ticket.epoch, "Dormitorio clásico".to_string()),
            Completion::Applied
        );
        assert_eq!(state.loading(), Some(LoadingPhase::GeneratingProposals));
        assert!(state.proposals().is_empty());

        assert_eq!(
            state.proposals_generated(ticket.epoch, batch()).unwrap(),
            Completion::Applied
        );
        assert_eq!(state.phase(), Phase::ProposalsReady);
        assert!(!state.is_loading());
        assert_eq!(state.proposals().len(), 3);
        assert_eq!(state.analysis(), Some("Dormitorio clásico"));
    }

    #[test]
    fn partial_batch_is_rejected_without_mutation() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.skip_email().unwrap();
        let mut partial = batch();
        partial.pop();

        assert_matches!(
            state.proposals_generated(ticket.epoch, partial),
            Err(CoreError::Internal(_))
        );
        assert!(state.proposals().is_empty());
        assert_eq!(state.phase(), Phase::Analyzing);
    }

    #[test]
    fn duplicate_ids_in_batch_are_rejected() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.skip_email().unwrap();
        let mut dupes = batch();
        dupes[2].id = dupes[0].id.clone();
        assert!(state.proposals_generated(ticket.epoch, dupes).is_err());
    }

    #[test]
    fn generation_failure_clears_loading_and_returns_to_email_step() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.skip_email().unwrap();

        assert_eq!(
            state.generation_failed(ticket.epoch, "quota exceeded"),
            Completion::Applied
        );
        assert!(!state.is_loading());
        assert_eq!(state.phase(), Phase::AwaitingEmail);
        assert_eq!(state.error(), Some("quota exceeded"));
        assert!(state.proposals().is_empty());
        assert!(state.image().is_some());
    }

    #[test]
    fn generation_failure_without_message_uses_generic_text() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.skip_email().unwrap();
        state.generation_failed(ticket.epoch, "  ");
        assert_eq!(state.error(), Some(GENERIC_GENERATION_ERROR));
    }

    #[test]
    fn retry_after_failure_clears_error() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.skip_email().unwrap();
        state.generation_failed(ticket.epoch, "boom");
        state.confirm_email("a@b.com").unwrap();
        assert!(state.error().is_none());
        assert_eq!(state.phase(), Phase::Analyzing);
    }

    #[test]
    fn results_after_reset_are_stale() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.skip_email().unwrap();
        state.reset();

        assert_eq!(
            state.analysis_completed(ticket.epoch, "late".to_string()),
            Completion::Stale
        );
        assert_eq!(
            state.proposals_generated(ticket.epoch, batch()).unwrap(),
            Completion::Stale
        );
        assert_eq!(state.generation_failed(ticket.epoch, "late"), Completion::Stale);
        assert_eq!(state.phase(), Phase::Empty);
        assert!(state.analysis().is_none());
        assert!(state.error().is_none());
    }

    #[test]
    fn select_for_editing_keeps_single_selection() {
        let mut state = ready_state();
        assert!(state.select_for_editing("nordico").unwrap());
        assert!(state.select_for_editing("moderno").unwrap());
        assert_eq!(state.selected(), Some("moderno"));

        let view = state.view();
        let selected: Vec<_> = view.proposals.iter().filter(|p| p.is_selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "moderno");
    }

    #[test]
    fn select_while_loading_is_noop() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        state.skip_email().unwrap();
        assert!(!state.select_for_editing("nordico").unwrap());
        assert!(state.selected().is_none());
    }

    #[test]
    fn select_unknown_proposal_is_not_found() {
        let mut state = ready_state();
        assert_matches!(
            state.select_for_editing("barroco"),
            Err(CoreError::NotFound { .. })
        );
    }

    #[test]
    fn blank_edit_instruction_is_rejected_before_any_ticket() {
        let mut state = ready_state();
        assert_matches!(state.begin_edit("moderno", "   \t"), Err(CoreError::Validation(_)));
        assert!(!state.is_editing("moderno"));
    }

    #[test]
    fn begin_edit_scopes_loading_to_one_card() {
        let mut state = ready_state();
        let ticket = state.begin_edit("moderno", "  add a blue sofa ").unwrap();

        assert_eq!(ticket.instruction, "add a blue sofa");
        assert_eq!(ticket.mime_type, "image/png");
        assert_eq!(ticket.image.data, "moderno-v0");
        assert!(state.is_editing("moderno"));
        assert!(!state.is_editing("nordico"));
        assert!(!state.is_loading());
        assert_eq!(state.selected(), Some("moderno"));
        // Other cards remain interactive.
        assert!(state.begin_edit("nordico", "más plantas").is_ok());
    }

    #[test]
    fn edit_ticket_falls_back_to_original_mime_type() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        let ticket = state.skip_email().unwrap();
        let mut proposals = batch();
        proposals[1].image = EncodedImage::new("", "moderno-v0");
        state.proposals_generated(ticket.epoch, proposals).unwrap();

        let ticket = state.begin_edit("moderno", "más luz").unwrap();
        assert_eq!(ticket.mime_type, "image/jpeg");
    }

    #[test]
    fn concurrent_edit_on_same_card_conflicts() {
        let mut state = ready_state();
        state.begin_edit("moderno", "add a blue sofa").unwrap();
        assert_matches!(
            state.begin_edit("moderno", "and a rug"),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn edit_completion_replaces_only_target_image() {
        let mut state = ready_state();
        let before = state.proposals().to_vec();
        let ticket = state.begin_edit("moderno", "add a blue sofa").unwrap();

        assert_eq!(
            state.edit_completed(
                ticket.epoch,
                &ticket.proposal_id,
                EncodedImage::new("image/png", "moderno-v1")
            ),
            Completion::Applied
        );

        let after = state.proposals();
        let ids: Vec<_> = after.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["nordico", "moderno", "clasico"]);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1].image.data, "moderno-v1");
        assert_eq!(after[1].edit_count, 1);
        assert_eq!(after[1].description, before[1].description);
        assert_eq!(after[1].products, before[1].products);
        assert!(!state.is_editing("moderno"));
    }

    #[test]
    fn edit_failure_keeps_previous_image() {
        let mut state = ready_state();
        let before = state.proposals().to_vec();
        let ticket = state.begin_edit("clasico", "quitar la alfombra").unwrap();

        state.edit_failed(ticket.epoch, &ticket.proposal_id, "");

        assert_eq!(state.proposals(), before.as_slice());
        assert_eq!(state.error(), Some(GENERIC_EDIT_ERROR));
        assert!(!state.is_editing("clasico"));
        assert!(!state.is_loading());
    }

    #[test]
    fn edit_completion_after_reset_is_stale() {
        let mut state = ready_state();
        let ticket = state.begin_edit("moderno", "add a blue sofa").unwrap();
        state.reset();
        assert_eq!(
            state.edit_completed(ticket.epoch, "moderno", EncodedImage::new("image/png", "x")),
            Completion::Stale
        );
        assert!(state.proposals().is_empty());
    }

    #[test]
    fn edit_before_proposals_conflicts() {
        let mut state = WorkflowState::new();
        state.supply_image(upload()).unwrap();
        assert_matches!(state.begin_edit("moderno", "x"), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn reset_clears_everything_at_once() {
        let mut state = ready_state();
        state.select_for_editing("nordico").unwrap();
        let ticket = state.begin_edit("clasico", "x").unwrap();
        state.edit_failed(ticket.epoch, "clasico", "boom");
        let epoch = state.epoch();

        state.reset();

        assert_eq!(state.phase(), Phase::Empty);
        assert!(state.image().is_none());
        assert!(state.analysis().is_none());
        assert!(state.proposals().is_empty());
        assert!(state.error().is_none());
        assert!(state.selected().is_none());
        assert!(!state.is_loading());
        assert_eq!(state.epoch(), epoch + 1);
    }

    #[test]
    fn dismiss_error_only_clears_error() {
        let mut state = ready_state();
        let ticket = state.begin_edit("nordico", "x").unwrap();
        state.edit_failed(ticket.epoch, "nordico", "boom");
        state.dismiss_error();
        assert!(state.error().is_none());
        assert_eq!(state.proposals().len(), 3);
    }

    #[test]
    fn view_serializes_snake_case_phase() {
        let state = ready_state();
        let json = serde_json::to_value(state.view()).unwrap();
        assert_eq!(json["phase"], "proposals_ready");
        assert_eq!(json["proposals"].as_array().unwrap().len(), 3);
        assert_eq!(json["image"]["mime_type"], "image/jpeg");
        assert!(json["proposals"][0]["image_data_url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[test]
    fn user_message_falls_back_when_blank() {
        assert_eq!(user_message("", "fallback"), "fallback");
        assert_eq!(user_message(" real ", "fallback"), "real");
    }
}
