//! Progress reporting for long-running sync passes.

use anyhow::Result;
use log::info;

/// Receives `(current, max, message)` updates after each major phase.
///
/// Failures are logged by the caller and never stop the pass.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, current: usize, max: usize, message: &str) -> Result<()>;
}

/// Writes progress to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn on_progress(&self, current: usize, max: usize, message: &str) -> Result<()> {
        info!("📊 {} ({}/{})", message, current, max);
        Ok(())
    }
}
