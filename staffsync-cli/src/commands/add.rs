//! `staffsync add`: intake of one employee.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use staffsync_core::NewEmployee;

use super::live_context;

/// Arguments for `staffsync add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub department: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,
}

impl AddArgs {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let employee = NewEmployee {
            name: self.name,
            email: self.email,
            department: self.department,
            phone: self.phone,
        };
        employee.validate()?;

        let ctx = live_context(config)?;
        let record = ctx
            .add_employee(employee)
            .context("failed to add employee")?;

        let row_id = record.effective_row_id();
        println!(
            "{} added {} <{}> as {}",
            "✓".green().bold(),
            record.name,
            record.email,
            row_id.as_str().bold()
        );
        Ok(())
    }
}
