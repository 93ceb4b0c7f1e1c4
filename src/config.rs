use crate::{
    cache::{
        MaxAge,
        RefreshFallbacks,
        StalenessPolicy,
    },
    explorer::RetryPolicy,
    orchestrator::{
        MissingDataPolicy,
        OrchestratorConfig,
    },
    primitives::Address,
    render::{
        LayoutKind,
        RingStyle,
    },
};

use clap::Parser;
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct InspectorConfig {
    /// JSON-RPC endpoint used to read the diamond's facets.
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Url,
    /// Diamond address. When absent, it is taken from `--config-url`.
    #[arg(long, env = "DIAMOND_ADDRESS")]
    pub diamond: Option<Address>,
    /// Remote configuration document providing `diamondAddress`.
    #[arg(long)]
    pub config_url: Option<Url>,
    /// Etherscan-compatible explorer API.
    #[arg(long, default_value = "https://api.etherscan.io/v2/api")]
    pub explorer_url: Url,
    /// Chain id sent with every explorer request, defaults to Base.
    #[arg(long, default_value = "8453")]
    pub chain_id: u64,
    /// Explorer API key.
    #[arg(long, env = "EXPLORER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Path of the facet cache database, defaults to `./facet-cache`.
    #[arg(long, default_value = "./facet-cache")]
    pub cache_path: String,
    /// Attempts per explorer request.
    #[arg(long, default_value = "3")]
    pub retries: u32,
    /// Delay before the first explorer attempt, in milliseconds.
    #[arg(long, default_value = "600")]
    pub retry_base_delay_ms: u64,
    /// Added to the delay for every further attempt, in milliseconds.
    #[arg(long, default_value = "400")]
    pub retry_step_ms: u64,
    /// Pause between two facets, in milliseconds.
    #[arg(long, default_value = "600")]
    pub throttle_ms: u64,
    /// Timeout of a single explorer request, in seconds.
    #[arg(long, default_value = "15")]
    pub request_timeout_secs: u64,
    /// How facets without a resolved name or ABI are reported.
    #[arg(long, value_enum, default_value_t = MissingDataPolicy::Placeholder)]
    pub on_missing_data: MissingDataPolicy,
    /// Layout printed with the report.
    #[arg(long, value_enum, default_value_t = LayoutKind::Graph)]
    pub layout: LayoutKind,
    /// Use the compact ring geometry.
    #[arg(long)]
    pub compact: bool,
    /// If set, cached entries older than this many seconds are refreshed.
    #[arg(long)]
    pub max_entry_age_secs: Option<u64>,
    /// Method to call on the diamond once facets are resolved, by name or
    /// `0x`-prefixed selector.
    #[arg(long)]
    pub read: Option<String>,
    /// Argument for `--read`, repeated once per input.
    #[arg(long = "arg", requires = "read")]
    pub args: Vec<String>,
}

impl InspectorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            step: Duration::from_millis(self.retry_step_ms),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            throttle: Duration::from_millis(self.throttle_ms),
            on_missing_data: self.on_missing_data,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn staleness_policy(&self) -> Box<dyn StalenessPolicy> {
        match self.max_entry_age_secs {
            Some(secs) => Box::new(MaxAge(Duration::from_secs(secs))),
            None => Box::new(RefreshFallbacks),
        }
    }

    pub fn ring_style(&self) -> RingStyle {
        if self.compact {
            RingStyle::compact()
        } else {
            RingStyle::default()
        }
    }

    /// The diamond to inspect: `--diamond`, else the remote configuration's
    /// `diamondAddress`.
    pub async fn resolve_diamond(&self) -> Result<Address, ConfigError> {
        if let Some(diamond) = self.diamond {
            return Ok(diamond);
        }
        let url = self.config_url.as_ref().ok_or(ConfigError::MissingDiamond)?;
        RemoteConfig::fetch(url, self.request_timeout())
            .await?
            .diamond_address
            .ok_or(ConfigError::MissingDiamond)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No diamond address configured")]
    MissingDiamond,
    #[error("Failed to fetch remote configuration")]
    RemoteError(#[from] reqwest::Error),
}

/// Public deployment configuration served by the portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteConfig {
    pub diamond_address: Option<Address>,
    pub mint_soon: bool,
    pub has_explorer_key: bool,
    pub directory_facet_name: Option<String>,
    pub directory_facet_address: Option<Address>,
}

impl RemoteConfig {
    pub async fn fetch(url: &Url, timeout: Duration) -> Result<Self, ConfigError> {
        let config = reqwest::Client::builder()
            .timeout(timeout)
            .build()?
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<Self>()
            .await?;
        debug!(target: "diamond-inspector::config", ?config, "Fetched remote configuration");
        Ok(config)
    }
}
