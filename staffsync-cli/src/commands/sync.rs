//! `staffsync sync`: one full sheet/store reconciliation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use staffsync_sync::ReconcileReport;

use super::live_context;

/// Arguments for `staffsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Emit the reconcile report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "direction")]
    direction: &'static str,
    #[tabled(rename = "added")]
    added: String,
    #[tabled(rename = "updated")]
    updated: String,
    #[tabled(rename = "written")]
    written: String,
}

impl SyncArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let ctx = live_context(config)?;
        let report = ctx.reconcile().context("sync failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
            return Ok(());
        }

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &ReconcileReport) {
    let rows = vec![
        CountRow {
            direction: "sheet → store",
            added: report.sheet_to_db.added.to_string(),
            updated: report.sheet_to_db.updated.to_string(),
            written: report.sheet_to_db.total().to_string(),
        },
        CountRow {
            direction: "store → sheet",
            added: "-".to_string(),
            updated: "-".to_string(),
            written: report.db_to_sheet.to_string(),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());

    println!(
        "{} synced in {} ms at {}",
        "✓".green().bold(),
        report.sync_duration_ms,
        report.timestamp
    );
    println!("{table}");
    println!(
        "{} records in store, {} rows in sheet",
        report.total_in_db, report.total_in_sheet
    );
}
