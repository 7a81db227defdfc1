//! Command-line definitions for `feed_harvest`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use harvester_core::Field;

use crate::logging::LogDestination;

/// Harvest posts from a lazily loaded social feed as JSON lines.
#[derive(Parser)]
#[command(name = "feed_harvest", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// RON file overriding retry limits and selectors
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal, global = true)]
    pub log: LogDestination,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay recorded page snapshots from a directory
    Replay {
        /// Directory of `*.html` renders, one per scroll step, in name order
        dir: PathBuf,

        /// Skip settle and load retry waits
        #[arg(long)]
        no_wait: bool,

        #[command(flatten)]
        harvest: HarvestArgs,
    },
    /// Harvest the live feed in a Chromium browser
    #[cfg(feature = "chrome")]
    Live {
        #[arg(long, env = "FEED_HARVEST_EMAIL")]
        email: String,

        #[arg(long, env = "FEED_HARVEST_PASSWORD", hide_env_values = true)]
        password: String,

        /// Browser profile directory, reused between runs
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        #[command(flatten)]
        harvest: HarvestArgs,
    },
}

#[derive(Args)]
pub struct HarvestArgs {
    /// Comma-separated fields to extract; all fields when omitted
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<Field>,

    /// Stop after this many records
    #[arg(long)]
    pub limit: Option<usize>,

    /// Print the sidebar ads after the records
    #[arg(long)]
    pub ads: bool,
}
