// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_tracing;
use crate::{aggregator, client, fetch_result};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use heagg_client::Role;
use heagg_config::{load_config, AggregationMode, AppConfig, ConfigOverrides, ValidUrl};
use std::path::PathBuf;
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "heagg")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")"))]
#[command(about = "Aggregate numbers from many participants without revealing any single one", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `heagg -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_tracing(self.log_level());

        let config = self.load_config()?;
        info!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::Aggregator { .. } => aggregator::execute(&config).await?,
            Commands::Client { role, .. } => client::execute(&config, role).await?,
            Commands::FetchResult { .. } => fetch_result::execute(&config).await?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        load_config(self.config.clone(), &self.command.overrides())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the aggregation server
    Aggregator {
        /// Interface to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Take part in an aggregation run
    Client {
        /// Base URL of the aggregator, eg. http://192.168.1.10:5000
        #[arg(long = "agg")]
        aggregator_url: Option<ValidUrl>,

        /// keyholder, client (contributor) or decryptor
        #[arg(long)]
        role: Role,

        /// Label sent along with the uploaded ciphertext
        #[arg(long)]
        client_id: Option<String>,

        /// How the decryptor turns the decrypted sum into the published aggregate
        #[arg(long)]
        aggregation: Option<AggregationMode>,

        /// Where the keyholder keeps its secret context
        #[arg(long)]
        secret_path: Option<PathBuf>,

        /// Send values unencrypted. Only for environments without BFV support.
        #[arg(long, action = ArgAction::SetTrue)]
        insecure_passthrough: bool,

        /// Derive the update from the synthetic dataset instead of fetching summary data
        #[arg(long, action = ArgAction::SetTrue)]
        synthetic: bool,
    },

    /// Print the published aggregate
    FetchResult {
        /// Base URL of the aggregator
        #[arg(long = "agg")]
        aggregator_url: Option<ValidUrl>,
    },
}

/// Only flags that were actually given override configuration
fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

impl Commands {
    pub fn overrides(&self) -> ConfigOverrides {
        match self {
            Commands::Aggregator { host, port } => ConfigOverrides {
                host: host.clone(),
                port: *port,
                ..ConfigOverrides::default()
            },
            Commands::Client {
                aggregator_url,
                client_id,
                aggregation,
                secret_path,
                insecure_passthrough,
                synthetic,
                ..
            } => ConfigOverrides {
                aggregator_url: aggregator_url.clone(),
                client_id: client_id.clone(),
                aggregation: *aggregation,
                secret_path: secret_path.clone(),
                synthetic_data: flag(*synthetic),
                insecure_passthrough: flag(*insecure_passthrough),
                ..ConfigOverrides::default()
            },
            Commands::FetchResult { aggregator_url } => ConfigOverrides {
                aggregator_url: aggregator_url.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}
