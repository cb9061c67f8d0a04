use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub fn parse() -> Cli {
    Cli::parse()
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Turn console debugging information on
    #[arg(short, long)]
    pub console: bool,

    /// Log to a file
    #[arg(short, long, value_name = "FILE", default_value = "tankfarm.log")]
    pub log_file: PathBuf,

    /// Verbosity: -v for info, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Database URL, overrides DATABASE_URL
    #[arg(short, long, value_name = "URL")]
    pub database: Option<String>,

    /// Maximum number of pooled database connections
    #[arg(long, default_value_t = 4)]
    pub pool_size: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending database migrations and exit
    Migrate {},

    /// Station management
    Station {
        #[command(subcommand)]
        action: StationAction,
    },

    /// Daily entries
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Daily entry remarks
    Remarks {
        #[command(subcommand)]
        action: RemarksAction,
    },

    /// Chart series as of a date
    Trend {
        #[arg(value_enum)]
        kind: TrendKind,

        #[command(flatten)]
        key: EntryKey,
    },

    /// Fit, predict and flag anomalies on an inventory trend field
    Forecast {
        #[command(flatten)]
        key: EntryKey,

        /// Inventory series field, e.g. totalVolAt20C
        #[arg(short, long, default_value = "totalVolAt20C")]
        field: String,

        #[command(flatten)]
        threshold: Threshold,
    },

    /// Fit, predict and flag anomalies on a JSON array of records
    Analyze {
        /// JSON file holding an array of objects
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Numeric field to analyze, e.g. totalFlowRate
        #[arg(short, long)]
        field: String,

        #[command(flatten)]
        threshold: Threshold,
    },
}

#[derive(Args)]
pub struct EntryKey {
    /// Station id
    #[arg(short, long)]
    pub station: i32,

    /// Entry date (YYYY-MM-DD)
    #[arg(short = 'D', long)]
    pub date: NaiveDate,
}

#[derive(Args)]
pub struct Threshold {
    /// Standard deviations from the mean before a point is an anomaly
    #[arg(short, long, default_value_t = tankfarm::analytics::DEFAULT_ANOMALY_THRESHOLD)]
    pub threshold: f64,
}

#[derive(Subcommand)]
pub enum StationAction {
    /// Create a station
    Add { name: String },

    /// Rename a station
    Rename { id: i32, name: String },

    /// Delete a station with all its entries
    Delete { id: i32 },

    /// List stations
    List {},
}

#[derive(Subcommand)]
pub enum EntryAction {
    /// Save a daily entry from a JSON payload
    Save {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show one daily entry with its totals
    Show {
        #[command(flatten)]
        key: EntryKey,
    },

    /// All entries of a station, oldest first
    History {
        #[arg(short, long)]
        station: i32,
    },

    /// Delete one daily entry
    Delete {
        #[command(flatten)]
        key: EntryKey,
    },
}

#[derive(Subcommand)]
pub enum RemarksAction {
    /// Print the remarks of an entry
    Get {
        #[command(flatten)]
        key: EntryKey,
    },

    /// Replace the remarks of an entry
    Set {
        #[command(flatten)]
        key: EntryKey,

        /// Remark texts, in display order
        texts: Vec<String>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum TrendKind {
    /// Station stock, last 15 days
    Inventory,

    /// Tank temperature, density and water, last 10 days
    Quality,

    /// Deliveries and stock reconciliation, last 15 days
    Kpi,
}
