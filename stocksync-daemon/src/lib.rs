//! Tokio host for sync passes: a single pass or one pass per interval,
//! with Ctrl-C wired to the run's cancel flag.

mod error;
pub mod logging;
mod runtime;

pub use error::DaemonError;
pub use logging::{init_tracing, LogFormat};
pub use runtime::{
    run, run_loop, run_once, run_once_blocking, start_blocking, LoopOptions, LoopReport,
};
