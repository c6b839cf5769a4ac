//! Command-line argument parsing for athena-glance.
//!
//! Uses clap; every connection flag overrides the matching config file value.

use crate::config::{AthenaConfig, Config, PollingConfig};
use clap::Parser;
use std::path::PathBuf;

/// Run distribution and select queries against Amazon Athena.
#[derive(Parser, Debug)]
#[command(name = "athena-glance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Athena database
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// S3 bucket receiving query results
    #[arg(short = 'b', long, value_name = "BUCKET")]
    pub bucket: Option<String>,

    /// Folder within the bucket receiving query results
    #[arg(short = 'f', long, value_name = "FOLDER")]
    pub folder: Option<String>,

    /// AWS region
    #[arg(short = 'r', long, value_name = "REGION")]
    pub region: Option<String>,

    /// Athena workgroup
    #[arg(long, value_name = "NAME")]
    pub workgroup: Option<String>,

    /// Endpoint override (e.g. a local emulator)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Maximum number of status checks per query
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Seconds between status checks
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use an in-memory mock service instead of Athena (no credentials needed)
    #[arg(long)]
    pub mock: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Converts connection flags to an AthenaConfig overlay.
    pub fn to_athena_config(&self) -> AthenaConfig {
        AthenaConfig {
            database: self.database.clone(),
            output_bucket: self.bucket.clone(),
            output_folder: self.folder.clone(),
            region: self.region.clone(),
            workgroup: self.workgroup.clone(),
            endpoint: self.endpoint.clone(),
        }
    }

    /// Applies CLI overrides on top of a loaded config.
    pub fn apply_to(&self, config: &mut Config) {
        config.athena.merge(&self.to_athena_config());

        let PollingConfig {
            max_attempts,
            poll_interval_secs,
        } = config.polling;
        config.polling = PollingConfig {
            max_attempts: self.max_attempts.unwrap_or(max_attempts),
            poll_interval_secs: self.poll_interval.unwrap_or(poll_interval_secs),
        };
    }
}
