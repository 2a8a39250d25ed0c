//! User actions, generation outcomes, and the side effects transitions request.

use shared::{
    domain::{HistoryItem, ImageArtifact, Style, UserImage},
    error::GenerationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Declined
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowAction {
    Submit {
        image: UserImage,
        style: Style,
    },
    GenerationSucceeded {
        image: ImageArtifact,
        caption: String,
        completed_at: i64,
    },
    GenerationFailed(GenerationError),
    TryAnother,
    ViewHistoryItem(HistoryItem),
    ClearHistory(Confirmation),
    DismissError,
}

impl WorkflowAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::GenerationSucceeded { .. } => "generation_succeeded",
            Self::GenerationFailed(_) => "generation_failed",
            Self::TryAnother => "try_another",
            Self::ViewHistoryItem(_) => "view_history_item",
            Self::ClearHistory(_) => "clear_history",
            Self::DismissError => "dismiss_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Generate { image: UserImage, style: Style },
    AppendHistory(HistoryItem),
    ClearHistory,
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generate { .. } => "generate",
            Self::AppendHistory(_) => "append_history",
            Self::ClearHistory => "clear_history",
        }
    }
}
