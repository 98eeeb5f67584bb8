use std::{
    collections::HashMap, net::SocketAddr, path::Path, path::PathBuf, str::FromStr, time::Duration,
};

use clap::Parser;
use ethers_core::types::Address;
use ethers_providers::{Http, Provider};
use ethers_signers::{LocalWallet, Signer};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{errors::ConfigError, routes::FullNodeRpcs};

/// L1 settlement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L1Config {
    /// L1 client rpc url
    pub rpc_url: String,
    /// The chain id verification transactions are signed for.
    pub chain_id: u64,
    /// The settlement (rollup manager) contract address.
    pub rollup_manager_contract: String,
    /// Extra gas added on top of estimates when publishing.
    pub gas_offset: u64,
}

impl Default for L1Config {
    fn default() -> Self {
        Self {
            rpc_url: String::from(""),
            chain_id: 1,
            rollup_manager_contract: String::from("0x0000000000000000000000000000000000000000"),
            gas_offset: 80_000,
        }
    }
}

/// A system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The JSON-RPC listen address.
    pub rpc_listen_addr: String,
    /// The private key used to publish verification transactions.
    pub private_key: String,
    /// L1 settlement configuration.
    pub l1: L1Config,
    /// Rollup id to trusted full node endpoint table.
    ///
    /// Keys are stringified rollup ids, the only map key shape TOML and
    /// environment providers can carry.
    pub full_node_rpcs: HashMap<String, String>,
    /// Data directory for the persistent store.
    pub data_dir: String,
    /// The monitored pool polling interval, in seconds.
    pub poll_interval_secs: u64,
    /// Confirmation depth before a published transaction is final.
    pub confirmations: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|home| home.join(".concord/db").display().to_string())
            .unwrap_or_else(|| String::from(".concord/db"));
        Self {
            rpc_listen_addr: String::from("0.0.0.0:8545"),
            // A fully public development key. _Only_ recommended for testing purposes.
            private_key: String::from(
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            ),
            l1: L1Config::default(),
            full_node_rpcs: HashMap::new(),
            data_dir,
            poll_interval_secs: 5,
            confirmations: 6,
        }
    }
}

impl Config {
    /// Loads the configuration by merging defaults, an optional TOML file,
    /// and `CONCORD_`-prefixed environment variables, in that order.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        Ok(figment
            .merge(Env::prefixed("CONCORD_").split("__"))
            .extract()?)
    }

    /// Constructs an L1 provider
    pub fn get_l1_client(&self) -> Result<Provider<Http>, ConfigError> {
        Provider::<Http>::try_from(self.l1.rpc_url.as_str())
            .map_err(|_| ConfigError::InvalidL1ClientUrl)
    }

    /// Parses the configured private key into a publishing wallet bound to
    /// the L1 chain id.
    pub fn get_wallet(&self) -> Result<LocalWallet, ConfigError> {
        let key = self
            .private_key
            .strip_prefix("0x")
            .unwrap_or(&self.private_key);
        let wallet: LocalWallet = key.parse().map_err(|_| ConfigError::InvalidPrivateKey)?;
        Ok(wallet.with_chain_id(self.l1.chain_id))
    }

    /// Parses the settlement contract address.
    pub fn get_contract_address(&self) -> Result<Address, ConfigError> {
        Address::from_str(&self.l1.rollup_manager_contract)
            .map_err(|_| ConfigError::InvalidContractAddress)
    }

    /// Parses the RPC listen address.
    pub fn get_listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.rpc_listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(self.rpc_listen_addr.clone()))
    }

    /// Parses the configured route table into typed rollup ids.
    pub fn get_full_node_rpcs(&self) -> Result<FullNodeRpcs, ConfigError> {
        self.full_node_rpcs
            .iter()
            .map(|(id, url)| {
                let id = id
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidRollupId(id.clone()))?;
                Ok((id, url.clone()))
            })
            .collect()
    }

    /// The monitored pool polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// The Concord CLI
#[derive(Parser)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,
    /// The L1 client rpc url
    #[clap(short = 'l', long, env = "L1_RPC_URL")]
    l1_rpc_url: Option<String>,
    /// The JSON-RPC listen address
    #[clap(short = 'a', long)]
    rpc_listen_addr: Option<String>,
    /// The data directory for the persistent store
    #[clap(short = 'd', long)]
    data_dir: Option<String>,
    /// Widen the default log filter to debug
    #[clap(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolves the CLI arguments into a [Config].
    pub fn to_config(self) -> Result<Config, ConfigError> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(url) = self.l1_rpc_url {
            config.l1.rpc_url = url;
        }
        if let Some(addr) = self.rpc_listen_addr {
            config.rpc_listen_addr = addr;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_wallet_parses_and_binds_chain_id() {
        let config = Config::default();
        let wallet = config.get_wallet().unwrap();
        assert_eq!(wallet.chain_id(), 1);
    }

    #[test]
    fn route_table_keys_parse_into_rollup_ids() {
        let mut config = Config::default();
        config
            .full_node_rpcs
            .insert(String::from("1"), String::from("http://node:8123"));
        let routes = config.get_full_node_rpcs().unwrap();
        assert_eq!(routes.get(&1).map(String::as_str), Some("http://node:8123"));

        config
            .full_node_rpcs
            .insert(String::from("not-a-rollup"), String::from("http://node:8123"));
        assert!(matches!(
            config.get_full_node_rpcs(),
            Err(ConfigError::InvalidRollupId(_))
        ));
    }

    #[test]
    fn bad_contract_address_is_rejected() {
        let config = Config {
            l1: L1Config {
                rollup_manager_contract: String::from("not-an-address"),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.get_contract_address(),
            Err(ConfigError::InvalidContractAddress)
        ));
    }
}
