//! Reconciliation CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use homevault_core::error::AppError;
use homevault_worker::Runtime;
use homevault_worker::scan::{ScanDeletedReport, ScanNewReport};

use crate::output::{self, OutputFormat};

/// Arguments for scan commands
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Scan subcommand
    #[command(subcommand)]
    pub command: ScanCommand,
}

/// Scan subcommands
#[derive(Debug, Subcommand)]
pub enum ScanCommand {
    /// Catalog files and directories found in home directories
    New,
    /// Remove nodes whose content is gone
    Deleted,
    /// Run both, deleted first
    All,
}

/// One line of a scan summary
#[derive(Debug, Serialize, Tabled)]
struct SummaryRow {
    sweep: &'static str,
    metric: &'static str,
    count: usize,
}

fn deleted_rows(report: &ScanDeletedReport) -> Vec<SummaryRow> {
    vec![
        SummaryRow { sweep: "deleted", metric: "files checked", count: report.files_checked },
        SummaryRow { sweep: "deleted", metric: "files removed", count: report.files_removed.len() },
        SummaryRow { sweep: "deleted", metric: "dirs removed", count: report.dirs_removed.len() },
        SummaryRow { sweep: "deleted", metric: "errors", count: report.errors },
    ]
}

fn new_rows(report: &ScanNewReport) -> Vec<SummaryRow> {
    vec![
        SummaryRow { sweep: "new", metric: "users", count: report.users },
        SummaryRow { sweep: "new", metric: "dirs created", count: report.dirs_created.len() },
        SummaryRow { sweep: "new", metric: "files created", count: report.files_created.len() },
        SummaryRow { sweep: "new", metric: "already cataloged", count: report.existing },
        SummaryRow { sweep: "new", metric: "type mismatches", count: report.mismatches.len() },
        SummaryRow { sweep: "new", metric: "errors", count: report.errors },
    ]
}

fn warn_mismatches(report: &ScanNewReport) {
    for path in &report.mismatches {
        output::print_warning(&format!("Type mismatch left for review: {path}"));
    }
}

/// Execute scan commands
pub async fn execute(args: &ScanArgs, runtime: &Runtime, format: OutputFormat) -> Result<(), AppError> {
    let scanner = &runtime.scanner;

    match &args.command {
        ScanCommand::New => {
            let report = scanner.scan_new().await?;
            match format {
                OutputFormat::Json => output::print_item(&report, format),
                OutputFormat::Table => {
                    output::print_list(&new_rows(&report), format);
                    warn_mismatches(&report);
                }
            }
        }
        ScanCommand::Deleted => {
            let report = scanner.scan_deleted().await?;
            match format {
                OutputFormat::Json => output::print_item(&report, format),
                OutputFormat::Table => output::print_list(&deleted_rows(&report), format),
            }
        }
        ScanCommand::All => {
            let report = scanner.scan_all().await?;
            match format {
                OutputFormat::Json => output::print_item(&report, format),
                OutputFormat::Table => {
                    let mut rows = deleted_rows(&report.deleted);
                    rows.extend(new_rows(&report.new));
                    output::print_list(&rows, format);
                    warn_mismatches(&report.new);
                }
            }
        }
    }

    Ok(())
}
