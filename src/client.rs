use std::sync::Arc;

use ethers_signers::Signer;
use eyre::Result;

use crate::{
    config::Config,
    monitor::TxMonitor,
    node::HttpConnector,
    pipeline::{Pipeline, MONITORED_TX_OWNER},
    routes::RouteRegistry,
    rpc::InteropEndpoints,
    server,
    settlement::RollupManager,
    store::SledStore,
    txmgr::SledTxManager,
};

/// Concord
///
/// This is the primary Concord client.
///
/// It wires configuration into the claim verification pipeline, spawns the
/// monitored pool publisher, and serves the interop RPC surface.
#[derive(Debug, Clone)]
pub struct Concord {
    /// The inner config
    config: Config,
}

impl Concord {
    /// Constructs a new Concord instance from an optional [Config]
    pub fn new(config: Option<Config>) -> Self {
        Self {
            config: config.unwrap_or_default(),
        }
    }

    /// Runs the Concord service.
    ///
    /// This blocks until the RPC server stops or the publisher exits.
    pub async fn start(&self) -> Result<()> {
        let wallet = self.config.get_wallet()?;
        let provider = self.config.get_l1_client()?;
        let contract = self.config.get_contract_address()?;
        let publisher = wallet.address();

        tracing::info!(
            target: "concord",
            publisher = ?publisher,
            contract = ?contract,
            rollups = self.config.full_node_rpcs.len(),
            "Starting claim verification pipeline"
        );

        let store = SledStore::open(&self.config.data_dir)?;
        let pool = SledTxManager::new(store.handle());
        let registry = RouteRegistry::new(self.config.get_full_node_rpcs()?);
        let settlement = RollupManager::new(provider.clone(), contract, publisher);

        let pipeline = Pipeline::new(
            contract,
            publisher,
            self.config.l1.gas_offset,
            registry,
            Arc::new(settlement),
            Arc::new(HttpConnector),
            Arc::new(store),
            Arc::new(pool.clone()),
        );
        let endpoints = InteropEndpoints::new(Arc::new(pipeline));

        let monitor = TxMonitor::new(
            MONITORED_TX_OWNER.to_string(),
            pool,
            provider,
            wallet,
            self.config.poll_interval(),
            self.config.confirmations,
        );
        let monitor_handle = monitor.spawn();

        let server_handle = server::start(self.config.get_listen_addr()?, endpoints).await?;

        tokio::select! {
            result = monitor_handle => {
                result??;
            }
            _ = server_handle.clone().stopped() => {
                tracing::info!(target: "concord", "RPC server stopped");
            }
        }
        Ok(())
    }
}
