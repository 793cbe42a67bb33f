//! Agent wiring: lifecycle control, bootstrap, and the query loop.

mod lifecycle;
pub mod repl;

pub use lifecycle::{Agent, ShutdownCoordinator};
