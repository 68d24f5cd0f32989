//! Decorating operations composed over a [`ContentModel`].
//!
//! [`GenerationClient`] knows which model and instruction each operation
//! uses and how to read its reply. The initial batch runs all six backend
//! calls (restyle + describe for each of the three catalog styles) at once
//! and fails as a unit.

use std::sync::Arc;

use decora_core::error::CoreError;
use decora_core::image::{EncodedImage, UploadedImage};
use decora_core::prompts::{describe_style_prompt, ANALYZE_SPACE_PROMPT};
use decora_core::proposal::{StyleDetails, StyleProposal};
use decora_core::style::STYLE_CATALOG;
use serde_json::json;

use crate::api::{ContentModel, GeminiApiError};
use crate::config::GeminiConfig;
use crate::messages::{GenerateContentRequest, GenerationConfig, Part};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Api(#[from] GeminiApiError),

    /// The backend refused the prompt.
    #[error("The request was blocked by the model: {0}")]
    Blocked(String),

    #[error("The model did not produce an image")]
    NoImage,

    #[error("The model did not produce any text")]
    NoText,

    /// The structured reply did not match the style details schema.
    #[error("Malformed style details: {0}")]
    MalformedDetails(#[from] serde_json::Error),

    /// The image to send failed local validation; no request was made.
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] CoreError),
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Response schema for [`GenerationClient::describe_style`].
pub fn style_details_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": { "type": "STRING" },
            "furnitureRecs": { "type": "STRING" },
            "colorRecs": { "type": "STRING" },
            "products": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "url": {
                            "type": "STRING",
                            "description": "URL simulada a mercadolibre.com"
                        }
                    },
                    "required": ["name"]
                }
            }
        },
        "required": ["description", "furnitureRecs", "colorRecs", "products"]
    })
}

// ---------------------------------------------------------------------------
// GenerationClient
// ---------------------------------------------------------------------------

pub struct GenerationClient {
    model: Arc<dyn ContentModel>,
    text_model: String,
    image_model: String,
}

impl GenerationClient {
    pub fn new(
        model: Arc<dyn ContentModel>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            model,
            text_model: text_model.into(),
            image_model: image_model.into(),
        }
    }

    /// Use the model names from `config`.
    pub fn from_config(model: Arc<dyn ContentModel>, config: &GeminiConfig) -> Self {
        Self::new(model, config.text_model.clone(), config.image_model.clone())
    }

    /// Short classification of the room type and its current style.
    pub async fn analyze_space(&self, image: &UploadedImage) -> Result<String, GenerationError> {
        let request = GenerateContentRequest::new(vec![
            Part::text(ANALYZE_SPACE_PROMPT),
            Part::inline(image.mime_type(), image.encoded().data.clone()),
        ]);

        let response = self.model.generate_content(&self.text_model, &request).await?;
        if let Some(reason) = response.block_reason() {
            return Err(GenerationError::Blocked(reason.to_string()));
        }
        let text = response.text().ok_or(GenerationError::NoText)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::NoText);
        }
        Ok(text.to_string())
    }

    /// Structured description, recommendations and products for a style.
    pub async fn describe_style(&self, style_name: &str) -> Result<StyleDetails, GenerationError> {
        let request = GenerateContentRequest::new(vec![Part::text(describe_style_prompt(
            style_name,
        ))])
        .with_config(GenerationConfig::structured(style_details_schema()));

        let response = self.model.generate_content(&self.text_model, &request).await?;
        if let Some(reason) = response.block_reason() {
            return Err(GenerationError::Blocked(reason.to_string()));
        }
        let text = response.text().ok_or(GenerationError::NoText)?;
        Ok(serde_json::from_str(text.trim())?)
    }

    /// Re-render `image` following `instruction`; the first image part of
    /// the reply is the result.
    pub async fn render_styled_image(
        &self,
        image_data: &str,
        mime_type: &str,
        instruction: &str,
    ) -> Result<EncodedImage, GenerationError> {
        let request = GenerateContentRequest::new(vec![
            Part::text(instruction),
            Part::inline(mime_type, image_data),
        ])
        .with_config(GenerationConfig::image_only());

        let response = self
            .model
            .generate_content(&self.image_model, &request)
            .await?;
        if let Some(reason) = response.block_reason() {
            return Err(GenerationError::Blocked(reason.to_string()));
        }
        response
            .first_image()
            .cloned()
            .map(EncodedImage::from)
            .ok_or(GenerationError::NoImage)
    }

    /// One proposal per catalog style, in catalog order, or an error.
    ///
    /// Within a style the restyle and the description run concurrently,
    /// and the three styles run concurrently with each other. The first
    /// failure aborts the batch; calls still in flight are dropped.
    pub async fn generate_initial_proposals(
        &self,
        image: &UploadedImage,
    ) -> Result<Vec<StyleProposal>, GenerationError> {
        let encoded = image.encoded();

        let runs = STYLE_CATALOG.iter().map(|style| async move {
            let (styled, details) = tokio::try_join!(
                self.render_styled_image(&encoded.data, &encoded.mime_type, style.instruction),
                self.describe_style(style.name),
            )?;
            tracing::debug!(style_id = style.id, "Style proposal ready");
            Ok::<_, GenerationError>(StyleProposal::assemble(
                style,
                styled,
                details,
                image.mime_type(),
            ))
        });

        let proposals = futures::future::try_join_all(runs).await?;
        tracing::info!(count = proposals.len(), "Initial proposals generated");
        Ok(proposals)
    }

    /// Re-render one proposal's current image with a user instruction.
    ///
    /// The image must decode to a non-empty payload; otherwise this fails
    /// before contacting the backend. The payload is sent as `mime_type`.
    pub async fn apply_edit(
        &self,
        image: &EncodedImage,
        mime_type: &str,
        instruction: &str,
    ) -> Result<EncodedImage, GenerationError> {
        image.decode()?;
        self.render_styled_image(image.data.trim(), mime_type, instruction)
            .await
    }
}
