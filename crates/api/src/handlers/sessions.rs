//! Handlers for the `/sessions` resource.
//!
//! Each session is one decorating workflow. Generation and edits run on
//! background tasks; their handlers answer `202 Accepted` with the current
//! snapshot and clients poll `GET /sessions/{id}` for progress.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use decora_core::error::CoreError;
use decora_core::image::UploadedImage;
use decora_core::types::{SessionId, Timestamp};
use decora_core::workflow::WorkflowView;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::sessions::SessionEntry;
use crate::state::AppState;

/// Multipart field carrying the room photo.
const IMAGE_FIELD: &str = "image";

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Session snapshot: identity plus the workflow view.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: SessionId,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub workflow: WorkflowView,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub instruction: String,
}

type SnapshotResponse = Json<DataResponse<SessionResponse>>;

async fn snapshot(state: &AppState, entry: &SessionEntry) -> SnapshotResponse {
    let workflow = state.orchestrator.view(&entry.session).await;
    Json(DataResponse {
        data: SessionResponse {
            id: entry.id,
            created_at: entry.created_at,
            workflow,
        },
    })
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions
pub async fn create(State(state): State<AppState>) -> (StatusCode, SnapshotResponse) {
    let entry = state.sessions.create().await;
    (StatusCode::CREATED, snapshot(&state, &entry).await)
}

/// GET /api/v1/sessions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<SnapshotResponse> {
    let entry = state.sessions.get(id).await?;
    Ok(snapshot(&state, &entry).await)
}

/// DELETE /api/v1/sessions/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<StatusCode> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Image and email steps
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions/{id}/image
///
/// Accepts either a multipart form with an `image` field or the raw image
/// as the request body. The type is sniffed from the bytes; the declared
/// content type is only a fallback.
pub async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    headers: HeaderMap,
    request: Request,
) -> AppResult<SnapshotResponse> {
    let entry = state.sessions.get(id).await?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (bytes, declared_mime) = match content_type.as_deref() {
        Some(ct) if ct.starts_with("multipart/form-data") => {
            let multipart = Multipart::from_request(request, &state)
                .await
                .map_err(|e| rejection_error(e.status(), e.body_text()))?;
            read_image_field(multipart).await?
        }
        _ => {
            let bytes = Bytes::from_request(request, &state)
                .await
                .map_err(|e| rejection_error(e.status(), e.body_text()))?;
            (bytes.to_vec(), content_type)
        }
    };

    let image = UploadedImage::from_upload(bytes, declared_mime.as_deref())?;
    tracing::info!(
        session_id = %id,
        mime_type = image.mime_type(),
        size = image.bytes().len(),
        "Room photo uploaded"
    );

    state.orchestrator.supply_image(&entry.session, image).await?;
    Ok(snapshot(&state, &entry).await)
}

/// Pull the `image` field out of a multipart form. Other fields are ignored.
async fn read_image_field(mut multipart: Multipart) -> AppResult<(Vec<u8>, Option<String>)> {
    let mut image: Option<(Vec<u8>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection_error(e.status(), e.body_text()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let declared = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| rejection_error(e.status(), e.body_text()))?;
            image = Some((data.to_vec(), declared));
        }
    }

    image.ok_or_else(|| AppError::BadRequest(format!("Missing required '{IMAGE_FIELD}' field")))
}

fn rejection_error(status: StatusCode, message: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(message)
    } else {
        AppError::BadRequest(message)
    }
}

/// POST /api/v1/sessions/{id}/email
///
/// Records the email and starts the analysis run.
pub async fn confirm_email(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(input): Json<EmailRequest>,
) -> AppResult<(StatusCode, SnapshotResponse)> {
    let entry = state.sessions.get(id).await?;
    let ticket = state
        .orchestrator
        .confirm_email(&entry.session, &input.email)
        .await?;

    tracing::info!(session_id = %id, "Email confirmed, starting analysis");
    state
        .orchestrator
        .spawn_generation(entry.session.clone(), ticket);
    Ok((StatusCode::ACCEPTED, snapshot(&state, &entry).await))
}

/// POST /api/v1/sessions/{id}/email/skip
pub async fn skip_email(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<(StatusCode, SnapshotResponse)> {
    let entry = state.sessions.get(id).await?;
    let ticket = state.orchestrator.skip_email(&entry.session).await?;

    tracing::info!(session_id = %id, "Email skipped, starting analysis");
    state
        .orchestrator
        .spawn_generation(entry.session.clone(), ticket);
    Ok((StatusCode::ACCEPTED, snapshot(&state, &entry).await))
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions/{id}/proposals/{style}/select
///
/// Ignored (snapshot unchanged) while the analysis run is in progress.
pub async fn select_proposal(
    State(state): State<AppState>,
    Path((id, style)): Path<(SessionId, String)>,
) -> AppResult<SnapshotResponse> {
    let entry = state.sessions.get(id).await?;
    if !state.orchestrator.select(&entry.session, &style).await? {
        tracing::debug!(session_id = %id, style_id = %style, "Selection ignored while loading");
    }
    Ok(snapshot(&state, &entry).await)
}

/// POST /api/v1/sessions/{id}/proposals/{style}/edit
pub async fn edit_proposal(
    State(state): State<AppState>,
    Path((id, style)): Path<(SessionId, String)>,
    Json(input): Json<EditRequest>,
) -> AppResult<(StatusCode, SnapshotResponse)> {
    let entry = state.sessions.get(id).await?;
    let ticket = state
        .orchestrator
        .begin_edit(&entry.session, &style, &input.instruction)
        .await?;

    tracing::info!(session_id = %id, style_id = %style, "Edit started");
    state.orchestrator.spawn_edit(entry.session.clone(), ticket);
    Ok((StatusCode::ACCEPTED, snapshot(&state, &entry).await))
}

/// GET /api/v1/sessions/{id}/proposals/{style}/image
///
/// The proposal's current image as raw bytes.
pub async fn proposal_image(
    State(state): State<AppState>,
    Path((id, style)): Path<(SessionId, String)>,
) -> AppResult<impl IntoResponse> {
    let entry = state.sessions.get(id).await?;
    let image = entry
        .session
        .lock()
        .await
        .proposal(&style)
        .map(|p| p.image.clone())
        .ok_or_else(|| CoreError::NotFound {
            entity: "Proposal",
            id: style.clone(),
        })?;

    let bytes = image
        .decode()
        .map_err(|e| AppError::BadGateway(format!("Proposal '{style}' has no usable image: {e}")))?;
    Ok(([(CONTENT_TYPE, image.mime_type)], bytes))
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

/// DELETE /api/v1/sessions/{id}/error
pub async fn dismiss_error(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<SnapshotResponse> {
    let entry = state.sessions.get(id).await?;
    state.orchestrator.dismiss_error(&entry.session).await;
    Ok(snapshot(&state, &entry).await)
}

/// POST /api/v1/sessions/{id}/reset
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<SnapshotResponse> {
    let entry = state.sessions.get(id).await?;
    state.orchestrator.reset(&entry.session).await;
    tracing::info!(session_id = %id, "Session reset");
    Ok(snapshot(&state, &entry).await)
}
