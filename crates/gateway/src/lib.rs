use async_trait::async_trait;
use futures::future::try_join;
use shared::{
    domain::{ImageArtifact, Style, UserImage},
    error::{GenerationError, GenerationStage},
};
use tracing::debug;

mod http;

pub use http::{HttpGatewayConfig, HttpGenerationGateway};

/// The two remote generation calls a workflow run depends on.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn transform_image(
        &self,
        image: &UserImage,
        prompt: &str,
    ) -> Result<ImageArtifact, GenerationError>;

    async fn generate_caption(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Stand-in used when no remote service is configured; every call fails
/// with `reason`.
pub struct UnavailableGateway {
    reason: String,
}

impl UnavailableGateway {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GenerationGateway for UnavailableGateway {
    async fn transform_image(
        &self,
        _image: &UserImage,
        _prompt: &str,
    ) -> Result<ImageArtifact, GenerationError> {
        Err(GenerationError::new(GenerationStage::ImageTransform, &self.reason))
    }

    async fn generate_caption(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::new(GenerationStage::Caption, &self.reason))
    }
}

/// Issues the image transform and the caption call together and waits for
/// both. Resolves to the first failure as soon as either call fails; there
/// is no partial result.
pub async fn generate_pair(
    gateway: &dyn GenerationGateway,
    image: &UserImage,
    style: &Style,
) -> Result<(ImageArtifact, String), GenerationError> {
    debug!(style = %style.id, "issuing image transform and caption calls");
    let (artifact, caption) = try_join(
        gateway.transform_image(image, &style.image_prompt),
        gateway.generate_caption(&style.caption_prompt),
    )
    .await?;
    debug!(style = %style.id, mime_type = %artifact.mime_type, "generation pair completed");
    Ok((artifact, caption))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
