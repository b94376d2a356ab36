//! Domain types and models

pub mod session;
pub mod stats;
pub mod tracking;

pub use session::{Session, SessionDraft};
pub use stats::ProjectTotal;
pub use tracking::{MonitorEvent, SessionEvent, Signals, TrackingState, TrackingStatus};
