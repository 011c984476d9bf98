//! Host application profile scenarios.

mod session_termination;

pub use session_termination::SessionTerminationTest;
