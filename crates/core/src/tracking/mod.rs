//! Session tracking: state machine, ports and crash recovery

pub mod ports;
pub mod recovery;
pub mod state_machine;

pub use recovery::{CrashRecoveryService, RecoveryReport};
pub use state_machine::{GracePeriods, SessionStateMachine};
