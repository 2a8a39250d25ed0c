//! Pure state transitions. Each user action maps to a named function that
//! takes the current state and returns the next state plus the side effects
//! the controller must run.

use shared::{
    domain::{HistoryItem, ImageArtifact, Style, UserImage},
    error::GenerationError,
};
use storage::HistoryStore;
use tracing::{debug, warn};

use crate::{
    controller::events::{Confirmation, Effect, WorkflowAction},
    state::{Phase, WorkflowState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: WorkflowState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: WorkflowState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn unchanged(state: &WorkflowState) -> Self {
        Self::to(state.clone())
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

pub fn reduce(state: &WorkflowState, action: WorkflowAction) -> Transition {
    match action {
        WorkflowAction::Submit { image, style } => submit(state, image, style),
        WorkflowAction::GenerationSucceeded {
            image,
            caption,
            completed_at,
        } => generation_succeeded(state, image, caption, completed_at),
        WorkflowAction::GenerationFailed(err) => generation_failed(state, &err),
        WorkflowAction::TryAnother => try_another(state),
        WorkflowAction::ViewHistoryItem(item) => view_history_item(state, item),
        WorkflowAction::ClearHistory(confirmation) => clear_history(state, confirmation),
        WorkflowAction::DismissError => dismiss_error(state),
    }
}

pub fn submit(state: &WorkflowState, image: UserImage, style: Style) -> Transition {
    if state.phase != Phase::Selecting {
        debug!(phase = ?state.phase, "ignoring submit outside selection");
        return Transition::unchanged(state);
    }

    let next = WorkflowState {
        phase: Phase::Loading,
        user_image: Some(image.clone()),
        selected_style: Some(style.clone()),
        generated_image: None,
        generated_caption: None,
        error: None,
    };
    Transition::to(next).with_effect(Effect::Generate { image, style })
}

pub fn generation_succeeded(
    state: &WorkflowState,
    image: ImageArtifact,
    caption: String,
    completed_at: i64,
) -> Transition {
    if state.phase != Phase::Loading {
        warn!(phase = ?state.phase, "dropping generation result outside loading");
        return Transition::unchanged(state);
    }
    let (Some(user_image), Some(style)) = (&state.user_image, &state.selected_style) else {
        warn!("dropping generation result for a run without image or style");
        return Transition::unchanged(state);
    };

    let item = HistoryItem {
        id: HistoryStore::make_id(completed_at),
        user_image: user_image.clone(),
        generated_image: image.clone(),
        generated_caption: caption.clone(),
        style: style.clone(),
        timestamp: completed_at,
    };
    let next = WorkflowState {
        phase: Phase::Result,
        user_image: Some(user_image.clone()),
        selected_style: Some(style.clone()),
        generated_image: Some(image),
        generated_caption: Some(caption),
        error: None,
    };
    Transition::to(next).with_effect(Effect::AppendHistory(item))
}

/// Back to selection with the failure surfaced. The in-flight image is
/// discarded, so the next run needs a fresh one.
pub fn generation_failed(state: &WorkflowState, err: &GenerationError) -> Transition {
    if state.phase != Phase::Loading {
        warn!(phase = ?state.phase, "dropping generation failure outside loading");
        return Transition::unchanged(state);
    }

    Transition::to(WorkflowState {
        error: Some(err.user_message()),
        ..WorkflowState::selecting()
    })
}

pub fn try_another(state: &WorkflowState) -> Transition {
    if state.phase != Phase::Result {
        debug!(phase = ?state.phase, "ignoring try-another outside result");
        return Transition::unchanged(state);
    }
    Transition::to(WorkflowState::selecting())
}

/// Replays a stored creation; never touches the gateway.
pub fn view_history_item(state: &WorkflowState, item: HistoryItem) -> Transition {
    if state.phase == Phase::Loading {
        debug!("ignoring history replay while loading");
        return Transition::unchanged(state);
    }

    Transition::to(WorkflowState {
        phase: Phase::Result,
        user_image: Some(item.user_image),
        selected_style: Some(item.style),
        generated_image: Some(item.generated_image),
        generated_caption: Some(item.generated_caption),
        error: None,
    })
}

/// Leaves the workflow state alone; only the history is affected.
pub fn clear_history(state: &WorkflowState, confirmation: Confirmation) -> Transition {
    match confirmation {
        Confirmation::Confirmed => Transition::unchanged(state).with_effect(Effect::ClearHistory),
        Confirmation::Declined => {
            debug!("history clear declined");
            Transition::unchanged(state)
        }
    }
}

pub fn dismiss_error(state: &WorkflowState) -> Transition {
    Transition::to(WorkflowState {
        error: None,
        ..state.clone()
    })
}

#[cfg(test)]
#[path = "../tests/reducer_tests.rs"]
mod tests;
