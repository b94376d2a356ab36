//! Platform adapters for the project and activity monitors
//!
//! Both monitors poll external helper programs: the Resolve bridge script
//! (plus an optional focus helper) and an optional idle helper.

pub mod activity;
pub mod process;
pub mod project_monitor;
pub mod resolve;

mod polling;

pub use activity::{
    activity_probe_from_config, ActivityProbe, AlwaysActive, IdleCommandProbe,
    PollingActivityMonitor,
};
pub use process::{run_probe, ProbeOutput};
pub use project_monitor::{project_edges, PollingProjectMonitor, ProjectProbe, ProjectReading};
pub use resolve::{install_bridge_script, parse_bridge_output, BridgeAnswer, ResolveScriptProbe};
