pub mod monitor;
pub mod snapshot;

pub use monitor::{MonitorInterval, StopSignal, install_ctrl_handler, run_monitor};
pub use snapshot::{ChangeSet, ScanSnapshot, diff, scan_all};
