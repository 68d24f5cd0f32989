//! Seam between the workflow and the generation backend.

use async_trait::async_trait;
use decora_core::image::{EncodedImage, UploadedImage};
use decora_core::proposal::StyleProposal;
use decora_gemini::{GenerationClient, GenerationError};

/// The three remote operations the workflow needs.
#[async_trait]
pub trait RemoteGeneration: Send + Sync {
    async fn analyze_space(&self, image: &UploadedImage) -> Result<String, GenerationError>;

    async fn generate_initial_proposals(
        &self,
        image: &UploadedImage,
    ) -> Result<Vec<StyleProposal>, GenerationError>;

    async fn apply_edit(
        &self,
        image: &EncodedImage,
        mime_type: &str,
        instruction: &str,
    ) -> Result<EncodedImage, GenerationError>;
}

#[async_trait]
impl RemoteGeneration for GenerationClient {
    async fn analyze_space(&self, image: &UploadedImage) -> Result<String, GenerationError> {
        GenerationClient::analyze_space(self, image).await
    }

    async fn generate_initial_proposals(
        &self,
        image: &UploadedImage,
    ) -> Result<Vec<StyleProposal>, GenerationError> {
        GenerationClient::generate_initial_proposals(self, image).await
    }

    async fn apply_edit(
        &self,
        image: &EncodedImage,
        mime_type: &str,
        instruction: &str,
    ) -> Result<EncodedImage, GenerationError> {
        GenerationClient::apply_edit(self, image, mime_type, instruction).await
    }
}
