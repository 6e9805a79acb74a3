use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ufo_sightings::Status;
use ufo_sightings::config::DEFAULT_BASE_URL;

#[derive(Parser)]
#[command(name = "ufo-sightings")]
#[command(about = "Browse and report UFO sightings from the shared catalog and this device")]
#[command(version)]
pub(crate) struct Args {
    /// Base URL of the sightings API
    #[arg(long, env = "UFO_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Directory holding locally submitted sightings
    #[arg(long, env = "UFO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "UFO_TIMEOUT_SECS", default_value = "10")]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List every known sighting, ordered by id
    List {
        /// Only show sightings with this status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Show the details of one or more sightings
    Show {
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Maximum number of concurrent lookups
        #[arg(short, long, default_value = "5")]
        concurrent: usize,
    },

    /// Report a new sighting
    Add {
        #[arg(short, long)]
        description: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Your name
        #[arg(short, long, default_value = "")]
        name: String,

        /// How to reach you
        #[arg(short, long, default_value = "")]
        contact: String,

        /// Picture URI
        #[arg(short, long)]
        picture: Option<String>,

        /// When it happened (RFC 3339); defaults to now
        #[arg(long)]
        date: Option<String>,
    },

    /// Write the reconciled listing to a CSV file
    Export {
        /// Output CSV filename
        #[arg(short, long, default_value = "sightings.csv")]
        output: PathBuf,
    },

    /// Print totals by status and the date range
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StatusArg {
    Confirmed,
    Unconfirmed,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Confirmed => Status::Confirmed,
            StatusArg::Unconfirmed => Status::Unconfirmed,
        }
    }
}
