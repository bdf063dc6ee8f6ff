//! # stocksync-sync
//!
//! Run orchestration: feed + catalog + location → reconcile → apply.
//!
//! Call [`pipeline::plan`] to compute decisions without writing anything, or
//! [`pipeline::run`] for a full pass. Both are blocking and sequential.

pub mod cancel;
pub mod error;
pub mod pipeline;
pub mod run_log;

pub use cancel::CancelToken;
pub use error::SyncError;
pub use pipeline::{plan, run, Plan, RunOptions, RunReport, RunSummary};
