//! `staffsync mirror`: apply one change event file to the sheet.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use staffsync_sync::{ChangeEvent, MirrorOutcome};

use super::live_context;

/// Arguments for `staffsync mirror`.
#[derive(Args, Debug)]
pub struct MirrorArgs {
    /// JSON file holding `{operation, new_data?, old_data?}`.
    pub event: PathBuf,
}

impl MirrorArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let contents = fs::read_to_string(&self.event)
            .with_context(|| format!("failed to read change event {}", self.event.display()))?;
        let event: ChangeEvent = serde_json::from_str(&contents)
            .with_context(|| format!("invalid change event in {}", self.event.display()))?;

        let ctx = live_context(config)?;
        let outcome = ctx
            .mirror(&event)
            .with_context(|| format!("failed to mirror {} event", event.operation))?;

        let check = "✓".green().bold();
        match outcome {
            MirrorOutcome::Appended(row) => println!("{check} {} appended row {row}", event.operation),
            MirrorOutcome::Updated(row) => println!("{check} {} updated row {row}", event.operation),
            MirrorOutcome::Cleared(row) => println!("{check} {} cleared row {row}", event.operation),
            MirrorOutcome::NotFound => println!(
                "{} {} matched no sheet row; nothing changed",
                "·".bright_black(),
                event.operation
            ),
        }
        Ok(())
    }
}
