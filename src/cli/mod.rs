pub mod dashboard;
pub mod report;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "agrodash",
    about = "Read-only financial dashboard for the QuimQuinAgro association books."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate reports without the dashboard.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show the store path and which tables are present.
    Status,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Monthly cash flow: income and expense totals per month.
    Cash,
    /// The ten largest expense concepts in a date range.
    Expenses {
        /// Start date: YYYY-MM-DD (default: fiscal year start)
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD (default: fiscal year end)
        #[arg(long = "to")]
        to_date: Option<String>,
    },
    /// Receivable collections by partner for a fiscal year.
    Receivables {
        /// Fiscal year: 2023, 2024 or 2025
        #[arg(long, default_value_t = 2025)]
        year: i32,
        /// Partner display name (default: all partners)
        #[arg(long)]
        partner: Option<String>,
    },
}
