use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "fifo-engine")]
#[command(about = "Predictive storage governance for hierarchical archives", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one full scan → forecast → evaluate → cleanup cycle
    Cycle,
    /// Scan the archive root and persist today's snapshot
    Scan,
    /// Scan, then forecast tomorrow's usage and evaluate it against the limit
    Forecast,
    /// Show scheduler and usage status
    Status {
        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// FIFO cleanup down to the configured target fraction of the limit
    Cleanup {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Generate a synthetic 14-day archive for testing
    Generate {
        /// Total dataset size in GB
        size_gb: f64,
    },
    /// Generate one synthetic day of data
    GenerateDay {
        /// Size of the day in MB
        size_mb: f64,
        /// Day offset from today (negative for the past)
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Run the background scheduler until Enter is pressed
    Schedule {
        /// Daily wall-clock time as HH:MM
        #[arg(long, conflicts_with = "every_minutes")]
        at: Option<String>,
        /// Fixed interval in minutes
        #[arg(long)]
        every_minutes: Option<u32>,
    },
    /// Per-entity average weights over the trailing window
    Weights {
        #[arg(long, default_value_t = 14)]
        days: u32,
    },
    /// Recent deletion-ledger entries, newest first
    Logs {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Print configuration values
    PrintConfig,
}
