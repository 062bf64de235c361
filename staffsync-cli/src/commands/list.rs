//! `staffsync list`: employees in the store, ordered by name.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use staffsync_core::EmployeeRecord;
use staffsync_store::EmployeeFilter;

use super::live_context;

/// Arguments for `staffsync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only employees in this department.
    #[arg(long)]
    pub department: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct EmployeeTableRow {
    #[tabled(rename = "row id")]
    row_id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "email")]
    email: String,
    #[tabled(rename = "department")]
    department: String,
    #[tabled(rename = "phone")]
    phone: String,
    #[tabled(rename = "last synced")]
    last_synced: String,
}

impl ListArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let filter = EmployeeFilter {
            department: self.department.filter(|d| !d.trim().is_empty()),
        };
        let ctx = live_context(config)?;
        let records = ctx
            .list_employees(&filter)
            .context("failed to list employees")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&records).context("failed to serialize employees")?
            );
            return Ok(());
        }

        if records.is_empty() {
            println!("No employees found.");
            return Ok(());
        }

        let rows: Vec<EmployeeTableRow> = records.iter().map(table_row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn table_row(record: &EmployeeRecord) -> EmployeeTableRow {
    EmployeeTableRow {
        row_id: record.effective_row_id().to_string(),
        name: record.name.clone(),
        email: record.email.clone(),
        department: record.department.clone().unwrap_or_default(),
        phone: record.phone.clone().unwrap_or_default(),
        last_synced: record
            .last_synced_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string()),
    }
}
