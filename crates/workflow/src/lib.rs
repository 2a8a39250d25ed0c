//! Selection → generation → result workflow: state, transitions and the
//! controller that runs their side effects.

pub mod clock;
pub mod controller;
pub mod router;
pub mod state;

pub use clock::{Clock, SystemClock};
pub use controller::{
    events::{Confirmation, Effect, WorkflowAction},
    orchestration::WorkflowController,
    reducer::{reduce, Transition},
};
pub use router::{route, Screen};
pub use state::{Phase, WorkflowState};
