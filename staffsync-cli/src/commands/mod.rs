pub mod add;
pub mod list;
pub mod mirror;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};

use staffsync_core::StaffsyncConfig;
use staffsync_sync::SyncContext;

pub fn load_config(explicit: Option<&Path>) -> Result<StaffsyncConfig> {
    StaffsyncConfig::resolve(explicit).context("failed to load configuration")
}

/// Resolve the config and build the live sheet + store context.
pub fn live_context(explicit: Option<&Path>) -> Result<SyncContext> {
    let config = load_config(explicit)?;
    staffsync_daemon::init_tracing();
    SyncContext::from_config(&config).context("failed to set up sheet and store clients")
}

/// `staffsync serve`
pub fn serve(explicit: Option<&Path>) -> Result<()> {
    let config = load_config(explicit)?;
    staffsync_daemon::start_blocking(config).context("daemon exited with error")
}
