//! Background tasks that drive session tracking
//!
//! - Event router: serializes monitor events and ticks into the state machine
//! - Session persister: writes lifecycle notifications to the store
//!
//! Both follow the same runtime rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout on joins

pub mod error;
pub mod event_router;
pub mod session_persister;

pub use error::{SchedulerError, SchedulerResult};
pub use event_router::{EventRouter, EventRouterConfig};
pub use session_persister::SessionPersister;
