//! Boot sequencing for the experience shell.
//!
//! Progress advances through fixed milestones on timers until it reaches the
//! background gate at 80%. The interface is revealed only once the renderer
//! has also reported ready; a watchdog forces completion if that never
//! happens.

mod latch;
mod sequencer;
mod stage;

pub use latch::{Latch, ReadinessJoin};
pub use sequencer::{BootEvent, BootSequencer, BootState};
pub use stage::BootStage;
