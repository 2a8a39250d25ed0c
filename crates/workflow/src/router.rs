//! Maps workflow state to the screen to show.

use shared::domain::{ImageArtifact, Style, UserImage};

use crate::state::{Phase, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen<'a> {
    Selecting {
        user_image: Option<&'a UserImage>,
        error: Option<&'a str>,
    },
    Loading {
        style: &'a Style,
    },
    Result {
        user_image: &'a UserImage,
        generated_image: &'a ImageArtifact,
        generated_caption: &'a str,
        style: Option<&'a Style>,
    },
}

/// Inconsistent state (loading without a style, a result missing one of its
/// artifacts) falls back to the selection screen instead of failing.
pub fn route(state: &WorkflowState) -> Screen<'_> {
    match state.phase {
        Phase::Loading => {
            if let Some(style) = &state.selected_style {
                return Screen::Loading { style };
            }
        }
        Phase::Result => {
            if let (Some(user_image), Some(generated_image), Some(generated_caption)) = (
                &state.user_image,
                &state.generated_image,
                &state.generated_caption,
            ) {
                return Screen::Result {
                    user_image,
                    generated_image,
                    generated_caption,
                    style: state.selected_style.as_ref(),
                };
            }
        }
        Phase::Selecting => {}
    }

    Screen::Selecting {
        user_image: state.user_image.as_ref(),
        error: state.error.as_deref(),
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
