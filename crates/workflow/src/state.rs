use shared::domain::{ImageArtifact, Style, UserImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Selecting,
    Loading,
    Result,
}

/// Transient per-session state. Which fields are meaningful depends on
/// `phase`: `Loading` needs a style, `Result` needs the user image plus
/// both generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowState {
    pub phase: Phase,
    pub user_image: Option<UserImage>,
    pub selected_style: Option<Style>,
    pub generated_image: Option<ImageArtifact>,
    pub generated_caption: Option<String>,
    pub error: Option<String>,
}

impl WorkflowState {
    pub fn selecting() -> Self {
        Self::default()
    }
}
