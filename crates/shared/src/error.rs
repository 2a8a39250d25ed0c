use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when a failed generation carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    ImageTransform,
    Caption,
}

impl std::fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImageTransform => f.write_str("image transform"),
            Self::Caption => f.write_str("caption"),
        }
    }
}

/// Failure of either remote generation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} generation failed: {}", self.user_message())]
pub struct GenerationError {
    pub stage: GenerationStage,
    pub message: Option<String>,
}

impl GenerationError {
    pub fn new(stage: GenerationStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: Some(message.into()),
        }
    }

    pub fn without_message(stage: GenerationStage) -> Self {
        Self {
            stage,
            message: None,
        }
    }

    /// Text suitable for the error banner.
    pub fn user_message(&self) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
