// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, relative_to, resolve_config_path};
use crate::validation::ValidUrl;
use crate::yaml::load_yaml_with_env;
use anyhow::{anyhow, bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use heagg_fhe_params::{BfvPreset, DEFAULT_BFV_PRESET};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::info;

pub const DEFAULT_CONFIG_NAME: &str = "heagg.config.yaml";
pub const ENV_PREFIX: &str = "HEAGG_";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_SECRET_PATH: &str = "local_secret_context.ctx";
pub const DEFAULT_SUMMARY_URL: &str = "https://api.covid19api.com/summary";

/// How the decryptor turns the decrypted sum into the published aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Publish the sum of all contributions
    Sum,
    /// Publish the sum divided by the number of contributions
    #[default]
    Mean,
}

impl AggregationMode {
    pub fn apply(&self, sum: f64, contributions: u32) -> f64 {
        match self {
            AggregationMode::Sum => sum,
            AggregationMode::Mean if contributions == 0 => sum,
            AggregationMode::Mean => sum / f64::from(contributions),
        }
    }
}

impl FromStr for AggregationMode {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregationMode::Sum),
            "mean" | "average" | "avg" => Ok(AggregationMode::Mean),
            other => bail!("Unknown aggregation mode '{other}'. Expected 'sum' or 'mean'."),
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMode::Sum => f.write_str("sum"),
            AggregationMode::Mean => f.write_str("mean"),
        }
    }
}

/// The `aggregator` key in configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Interface to bind to
    pub host: String,
    /// Port to listen on. The `PORT` environment variable overrides it.
    pub port: u16,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// When set every stored public context is also written to this file
    pub public_context_write_path: Option<PathBuf>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            public_context_write_path: None,
        }
    }
}

/// The `client` key in configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the aggregator, eg. http://192.168.1.10:5000
    pub aggregator_url: Option<ValidUrl>,
    /// Optional label sent along with uploaded ciphertexts
    pub client_id: Option<String>,
    pub aggregation: AggregationMode,
    /// Where the keyholder keeps its secret context
    pub secret_path: PathBuf,
    /// Source of the summary data contributors derive their update from
    pub summary_url: ValidUrl,
    /// Skip the network and derive updates from the synthetic dataset
    pub synthetic_data: bool,
    /// Send values unencrypted. Only for environments without BFV support.
    pub insecure_passthrough: bool,
    pub bfv_preset: BfvPreset,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            aggregator_url: None,
            client_id: None,
            aggregation: AggregationMode::default(),
            secret_path: PathBuf::from(DEFAULT_SECRET_PATH),
            summary_url: ValidUrl::from_str(DEFAULT_SUMMARY_URL)
                .expect("DEFAULT_SUMMARY_URL is a valid url"),
            synthetic_data: false,
            insecure_passthrough: false,
            bfv_preset: DEFAULT_BFV_PRESET,
        }
    }
}

impl ClientConfig {
    pub fn aggregator_url(&self) -> Result<&ValidUrl> {
        self.aggregator_url.as_ref().ok_or_else(|| {
            anyhow!("No aggregator URL configured. Pass --agg or set client.aggregator_url.")
        })
    }
}

/// The config actually used throughout the app
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    aggregator: AggregatorConfig,
    client: ClientConfig,
    /// The config file the values were read from, if any
    #[serde(skip)]
    config_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn aggregator(&self) -> &AggregatorConfig {
        &self.aggregator
    }

    pub fn client(&self) -> &ClientConfig {
        &self.client
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Relative paths in configuration are relative to the config file's folder
    fn resolve_paths(&mut self, base: &Path) {
        self.client.secret_path = relative_to(base, &self.client.secret_path);
        self.aggregator.public_context_write_path = self
            .aggregator
            .public_context_write_path
            .as_ref()
            .map(|p| relative_to(base, p));
    }
}

/// Value struct for passing command line flags to the configuration
#[derive(Default, Clone, Debug)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub aggregator_url: Option<ValidUrl>,
    pub client_id: Option<String>,
    pub aggregation: Option<AggregationMode>,
    pub secret_path: Option<PathBuf>,
    pub synthetic_data: Option<bool>,
    pub insecure_passthrough: Option<bool>,
}

impl ConfigOverrides {
    fn apply(&self, figment: Figment, cwd: &Path) -> Figment {
        let mut figment = figment;
        if let Some(host) = &self.host {
            figment = figment.merge(Serialized::default("aggregator.host", host));
        }
        if let Some(port) = self.port {
            figment = figment.merge(Serialized::default("aggregator.port", port));
        }
        if let Some(url) = &self.aggregator_url {
            figment = figment.merge(Serialized::default("client.aggregator_url", url));
        }
        if let Some(client_id) = &self.client_id {
            figment = figment.merge(Serialized::default("client.client_id", client_id));
        }
        if let Some(mode) = self.aggregation {
            figment = figment.merge(Serialized::default("client.aggregation", mode));
        }
        // Paths given on the command line are relative to where the command runs
        if let Some(path) = &self.secret_path {
            figment = figment.merge(Serialized::default(
                "client.secret_path",
                relative_to(cwd, path),
            ));
        }
        if let Some(flag) = self.synthetic_data {
            figment = figment.merge(Serialized::default("client.synthetic_data", flag));
        }
        if let Some(flag) = self.insecure_passthrough {
            figment = figment.merge(Serialized::default("client.insecure_passthrough", flag));
        }
        figment
    }
}

/// Load the config at `config_file`, or the first `heagg.config.yaml` found from the current
/// folder upwards, and layer environment and command line values on top.
pub fn load_config(config_file: Option<String>, overrides: &ConfigOverrides) -> Result<AppConfig> {
    let cwd = env::current_dir()?;
    let resolved_config_path = resolve_config_path(
        find_in_parent,                 // finding strategy
        cwd.clone(),                    // cwd
        DEFAULT_CONFIG_NAME,            // heagg.config.yaml
        config_file.map(PathBuf::from), // explicit --config
    );
    load_config_from(&cwd, resolved_config_path, overrides)
}

/// Same as [`load_config`] with the working directory and config file already resolved
pub fn load_config_from(
    cwd: &Path,
    config_file: Option<PathBuf>,
    overrides: &ConfigOverrides,
) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = &config_file {
        let loaded_yaml = load_yaml_with_env(path).context("Configuration file not found")?;
        figment = figment.merge(Yaml::string(&loaded_yaml));
        info!("Loaded configuration from {}", path.display());
    }

    let figment = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Env::raw().only(&["PORT"]).map(|_| "aggregator.port".into()));
    let figment = overrides.apply(figment, cwd);

    let mut config: AppConfig = figment.extract().context("Could not parse configuration")?;

    let base = config_file
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf());
    config.resolve_paths(&base);
    config.config_file = config_file;

    Ok(config)
}
