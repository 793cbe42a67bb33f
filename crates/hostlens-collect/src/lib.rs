//! OS state collectors.
//!
//! Snapshot collectors (`processes`, `connections`, `system_info`) return
//! the current records and swallow enumeration failures into empty
//! sequences after logging. The live probes (`live_pids`,
//! `process_name`, `current_connections`) back the monitors and report
//! failures so a cycle can be retried.

mod error;
mod net;
mod process;
mod system;

pub use error::CollectError;
pub use net::{connections, current_connections, TcpState};
pub use process::{live_pids, process_name, processes};
pub use system::system_info;
