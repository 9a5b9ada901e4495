use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use safenav_core::ContentFilterMode;

#[derive(Parser, Debug)]
#[command(name = "safenav")]
#[command(author, version, about = "SafeNav parental navigation policy")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "safenav.yaml", env = "SAFENAV_CONFIG")]
    pub config: String,

    /// Store file, overrides `store_path` from the config
    #[arg(short, long, global = true, env = "SAFENAV_STORE")]
    pub store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate URLs against the stored policy
    Check {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Local time to evaluate at, "YYYY-MM-DD HH:MM"
        #[arg(long, value_parser = parse_local_time)]
        at: Option<NaiveDateTime>,

        /// Write blocks to the audit log
        #[arg(long)]
        record: bool,

        /// Print decisions as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Manage blocked domains
    Domain {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Manage blocked keywords
    Keyword {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Manage whitelisted domains for strict mode
    Whitelist {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Turn whitelist-only browsing on or off
    Strict {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Manage the weekly browsing schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Set how sensitive words are handled
    Filter {
        #[arg(value_parser = parse_filter_mode)]
        mode: ContentFilterMode,
    },

    /// Show browsing history
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Delete all history instead
        #[arg(long)]
        clear: bool,
    },

    /// Show blocked attempts
    Blocked {
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Delete all blocked attempts instead
        #[arg(long)]
        clear: bool,
    },

    /// Summarize blocked attempts
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Read URLs from stdin and decide each one as it arrives
    Watch {
        /// Print Prometheus metrics on exit
        #[arg(long)]
        prometheus: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListAction {
    Add { value: String },
    Remove { value: String },
    List,
}

#[derive(Subcommand, Debug)]
pub enum ScheduleAction {
    Show,
    Enable,
    Disable,
    /// Suspend or resume the schedule temporarily
    Override {
        #[arg(value_enum)]
        state: Toggle,
    },
    AddRule {
        /// Days of week, 0 = Sunday
        #[arg(long, value_delimiter = ',', required = true)]
        days: Vec<u8>,

        /// "HH:MM"
        #[arg(long)]
        start: String,

        /// "HH:MM", inclusive
        #[arg(long)]
        end: String,

        /// Store a deny rule; deny rules are kept but never consulted
        #[arg(long)]
        deny: bool,
    },
    Clear,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}

fn parse_local_time(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M").map_err(|e| e.to_string())
}

fn parse_filter_mode(s: &str) -> Result<ContentFilterMode, String> {
    s.parse().map_err(|e: safenav_core::Error| e.to_string())
}
