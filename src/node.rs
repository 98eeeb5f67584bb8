//! Node
//!
//! Encapsulates logic for interacting with a rollup full node. The pipeline
//! connects to the node registered for the claim's rollup and fetches the
//! canonical record of the batch the claim refers to; the record is fetched
//! fresh per request and never cached here.

use async_trait::async_trait;
use ethers_core::types::{H256, U64};
use ethers_providers::{Http, Provider};
use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

#[cfg(test)]
use mockall::automock;

/// The full node's authoritative record for a batch number.
///
/// Fields absent from the node's response default to zero values, so a
/// missing commitment never aliases a matching one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalBatch {
    /// The batch number.
    pub number: U64,
    /// The state root the node recorded for this batch.
    pub state_root: H256,
    /// The local exit root the node recorded for this batch.
    pub local_exit_root: H256,
    /// The global exit root at this batch.
    pub global_exit_root: H256,
    /// The accumulated input hash at this batch.
    pub acc_input_hash: H256,
    /// The batch timestamp.
    pub timestamp: U64,
    /// Whether the node considers the batch closed.
    pub closed: bool,
}

/// Rollup Full Node Client
///
/// The seam between the pipeline and a rollup's own node.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FullNodeClient: Send + Sync {
    /// Fetches the canonical batch record for `number`.
    async fn batch_by_number(&self, number: u64) -> Result<CanonicalBatch, ClientError>;
}

/// Full Node Connector
///
/// Builds a [FullNodeClient] for a resolved endpoint. The pipeline connects
/// per request, so route changes never require a restart.
#[cfg_attr(test, automock)]
pub trait FullNodeConnector: Send + Sync {
    /// Connects to the full node at `url`.
    fn connect(&self, url: String) -> Result<Box<dyn FullNodeClient>, ClientError>;
}

/// A Rollup Node over HTTP JSON-RPC.
#[derive(Debug, Clone)]
pub struct RollupNode {
    client: Provider<Http>,
}

impl RollupNode {
    /// Creates a new rollup node client.
    pub fn new(url: &str) -> Result<Self, ClientError> {
        let client =
            Provider::<Http>::try_from(url).map_err(|e| ClientError::Rpc(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FullNodeClient for RollupNode {
    async fn batch_by_number(&self, number: u64) -> Result<CanonicalBatch, ClientError> {
        let batch: Option<CanonicalBatch> = self
            .client
            .request("zkevm_getBatchByNumber", (U64::from(number), false))
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;
        batch.ok_or_else(|| ClientError::NotFound(format!("batch {number}")))
    }
}

/// [FullNodeConnector] for HTTP rollup nodes.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector;

impl FullNodeConnector for HttpConnector {
    fn connect(&self, url: String) -> Result<Box<dyn FullNodeClient>, ClientError> {
        Ok(Box::new(RollupNode::new(&url)?))
    }
}
