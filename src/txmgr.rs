//! Transaction Manager
//!
//! The durable pool of monitored L1 transactions. The pipeline creates a
//! record per accepted claim inside its submission scope; a background
//! publisher owns the record afterwards, publishing it to L1 and driving its
//! lifecycle to a terminal state. The pipeline never transitions a record
//! itself, it only creates and reads them.

use std::fmt;

use ethers_core::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

use crate::errors::TxManagerError;
use crate::store::StateScope;

/// The L1 call handed to the monitored pool for a verified claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    /// The publishing address.
    pub from: Address,
    /// The settlement contract the call targets.
    pub to: Address,
    /// Ether value carried by the call.
    pub value: U256,
    /// The verification calldata.
    pub data: Bytes,
    /// Extra gas added on top of the estimate when publishing.
    pub gas_offset: u64,
}

/// Lifecycle state of a monitored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitoredStatus {
    /// Recorded in the pool, not yet published.
    Created,
    /// Published to L1, awaiting confirmation.
    Sent,
    /// Mined and confirmed.
    Confirmed,
    /// Reverted or permanently unpublishable.
    Failed,
}

impl fmt::Display for MonitoredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Created => "created",
            Self::Sent => "sent",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        write!(f, "{token}")
    }
}

/// A monitored transaction record as persisted in the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredTx {
    /// The owner namespace the record is filed under.
    pub owner: String,
    /// The record identifier, the hex of the originating claim's hash.
    pub id: String,
    /// The L1 call to publish.
    pub request: TxRequest,
    /// Current lifecycle state.
    pub status: MonitoredStatus,
    /// The hash of the published L1 transaction, once sent.
    pub sent_tx_hash: Option<H256>,
    /// Unix timestamp at which the record entered the pool.
    pub created_at: i64,
}

/// The projection of a monitored record returned to status lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredResult {
    /// The record identifier.
    pub id: String,
    /// Current lifecycle state.
    pub status: MonitoredStatus,
    /// The hash of the published L1 transaction, once sent.
    pub sent_tx_hash: Option<H256>,
}

/// Monitored Transaction Pool
///
/// The seam between the pipeline and the submission subsystem. `add` stages
/// the record through the caller's scope so that enqueueing and the scope's
/// other writes land atomically; `result` reads through the scope.
pub trait TxManager: Send + Sync {
    /// Registers a monitored transaction under `owner`/`id` inside `scope`.
    fn add(
        &self,
        owner: &str,
        id: &str,
        request: TxRequest,
        scope: &mut dyn StateScope,
    ) -> Result<(), TxManagerError>;

    /// Looks up the monitored record under `owner`/`id` through `scope`.
    fn result(
        &self,
        owner: &str,
        id: &str,
        scope: &dyn StateScope,
    ) -> Result<MonitoredResult, TxManagerError>;
}

/// [TxManager] persisting records in a sled tree.
#[derive(Debug, Clone)]
pub struct SledTxManager {
    db: sled::Db,
}

impl SledTxManager {
    /// Constructs a pool over the given store handle.
    pub fn new(db: sled::Db) -> Self {
        Self { db }
    }

    fn key(owner: &str, id: &str) -> Vec<u8> {
        format!("monitored/{owner}/{id}").into_bytes()
    }

    fn decode(raw: &[u8]) -> Result<MonitoredTx, TxManagerError> {
        serde_json::from_slice(raw).map_err(|e| TxManagerError::Codec(e.to_string()))
    }

    /// Returns all non-terminal records under `owner`, oldest key first.
    ///
    /// Publisher-facing: scans the backing tree directly, outside any scope.
    pub fn pending(&self, owner: &str) -> Result<Vec<MonitoredTx>, TxManagerError> {
        let prefix = format!("monitored/{owner}/").into_bytes();
        let mut records = Vec::new();
        for entry in self.db.scan_prefix(prefix) {
            let (_, raw) = entry.map_err(|e| TxManagerError::Store(e.into()))?;
            let record = Self::decode(&raw)?;
            if matches!(record.status, MonitoredStatus::Created | MonitoredStatus::Sent) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Persists an updated record. Publisher-facing.
    pub fn update(&self, record: &MonitoredTx) -> Result<(), TxManagerError> {
        let raw = serde_json::to_vec(record).map_err(|e| TxManagerError::Codec(e.to_string()))?;
        self.db
            .insert(Self::key(&record.owner, &record.id), raw)
            .map_err(|e| TxManagerError::Store(e.into()))?;
        Ok(())
    }
}

impl TxManager for SledTxManager {
    fn add(
        &self,
        owner: &str,
        id: &str,
        request: TxRequest,
        scope: &mut dyn StateScope,
    ) -> Result<(), TxManagerError> {
        let key = Self::key(owner, id);
        if scope.get(&key)?.is_some() {
            return Err(TxManagerError::AlreadyExists(id.to_string()));
        }
        let record = MonitoredTx {
            owner: owner.to_string(),
            id: id.to_string(),
            request,
            status: MonitoredStatus::Created,
            sent_tx_hash: None,
            created_at: chrono::Utc::now().timestamp(),
        };
        let raw = serde_json::to_vec(&record).map_err(|e| TxManagerError::Codec(e.to_string()))?;
        scope.put(&key, &raw)?;
        Ok(())
    }

    fn result(
        &self,
        owner: &str,
        id: &str,
        scope: &dyn StateScope,
    ) -> Result<MonitoredResult, TxManagerError> {
        let key = Self::key(owner, id);
        match scope.get(&key)? {
            Some(raw) => {
                let record = Self::decode(&raw)?;
                Ok(MonitoredResult {
                    id: record.id,
                    status: record.status,
                    sent_tx_hash: record.sent_tx_hash,
                })
            }
            None => Err(TxManagerError::NotFound(id.to_string())),
        }
    }
}
