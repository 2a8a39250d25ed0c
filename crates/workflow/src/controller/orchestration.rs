//! Runs reducer transitions and the side effects they request against the
//! generation gateway and the history store.

use std::{collections::VecDeque, sync::Arc};

use gateway::{generate_pair, GenerationGateway};
use shared::domain::{History, HistoryItemId, Style, UserImage};
use storage::HistoryStore;
use tracing::{debug, error, info, warn};

use crate::{
    clock::Clock,
    controller::{
        events::{Confirmation, Effect, WorkflowAction},
        reducer::{reduce, Transition},
    },
    router::{route, Screen},
    state::WorkflowState,
};

/// Sole owner of the workflow state and the in-memory history.
pub struct WorkflowController {
    state: WorkflowState,
    history: History,
    gateway: Arc<dyn GenerationGateway>,
    store: HistoryStore,
    clock: Arc<dyn Clock>,
}

impl WorkflowController {
    /// Loads the persisted history once and starts in selection.
    pub async fn bootstrap(
        gateway: Arc<dyn GenerationGateway>,
        store: HistoryStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let history = store.load().await;
        info!(items = history.len(), "workflow controller ready");
        Self {
            state: WorkflowState::selecting(),
            history,
            gateway,
            store,
            clock,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn screen(&self) -> Screen<'_> {
        route(&self.state)
    }

    /// Applies `action` and every follow-up action its effects produce.
    /// Returns once the workflow is quiescent again.
    pub async fn dispatch(&mut self, action: WorkflowAction) {
        let mut pending = VecDeque::from([action]);
        while let Some(action) = pending.pop_front() {
            let action_name = action.name();
            let Transition { state, effects } = reduce(&self.state, action);
            debug!(
                action = action_name,
                from = ?self.state.phase,
                to = ?state.phase,
                effects = effects.len(),
                "workflow transition"
            );
            self.state = state;

            for effect in effects {
                if let Some(follow_up) = self.run_effect(effect).await {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    pub async fn submit(&mut self, image: UserImage, style: Style) {
        self.dispatch(WorkflowAction::Submit { image, style }).await;
    }

    pub async fn try_another(&mut self) {
        self.dispatch(WorkflowAction::TryAnother).await;
    }

    /// Replays the history item with `id`. Returns false when no such item
    /// exists, leaving the state untouched.
    pub async fn open_history_item(&mut self, id: &HistoryItemId) -> bool {
        let Some(item) = self.history.find(id).cloned() else {
            warn!(%id, "requested history item does not exist");
            return false;
        };
        self.dispatch(WorkflowAction::ViewHistoryItem(item)).await;
        true
    }

    pub async fn clear_history(&mut self, confirmation: Confirmation) {
        self.dispatch(WorkflowAction::ClearHistory(confirmation)).await;
    }

    pub async fn dismiss_error(&mut self) {
        self.dispatch(WorkflowAction::DismissError).await;
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<WorkflowAction> {
        debug!(effect = effect.name(), "running workflow effect");
        match effect {
            Effect::Generate { image, style } => {
                match generate_pair(self.gateway.as_ref(), &image, &style).await {
                    Ok((image, caption)) => Some(WorkflowAction::GenerationSucceeded {
                        image,
                        caption,
                        completed_at: self.clock.now_millis(),
                    }),
                    Err(err) => {
                        warn!(style = %style.id, "generation failed: {err}");
                        Some(WorkflowAction::GenerationFailed(err))
                    }
                }
            }
            Effect::AppendHistory(item) => {
                let id = item.id.clone();
                self.history = match self.store.append(&self.history, item.clone()).await {
                    Ok(updated) => updated,
                    Err(err) => {
                        error!(%id, "failed to persist history, keeping it in memory: {err:#}");
                        self.history.prepend_bounded(item)
                    }
                };
                None
            }
            Effect::ClearHistory => {
                if let Err(err) = self.store.clear().await {
                    error!("failed to clear persisted history: {err:#}");
                }
                self.history = History::new();
                info!("history cleared");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;
