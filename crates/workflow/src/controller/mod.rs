//! Controller layer: user actions, reducer-style state transitions, and effect orchestration.

pub mod events;
pub mod orchestration;
pub mod reducer;
