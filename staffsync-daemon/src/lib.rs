//! HTTP daemon: intake, listing, reconcile queue and change mirroring.

mod error;
pub mod routes;
mod runtime;

pub use error::{ApiError, DaemonError};
pub use routes::{router, AppState};
pub use runtime::{init_tracing, run, run_with_context, spawn_processor, start_blocking, ReconcileQueue};
