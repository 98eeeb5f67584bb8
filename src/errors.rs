use ethers_core::types::{Address, SignatureError, H256};
use thiserror::Error;

/// Configuration Error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// L1 client URL is invalid
    #[error("l1 client url is invalid")]
    InvalidL1ClientUrl,
    /// The configured private key could not be parsed
    #[error("invalid publisher private key")]
    InvalidPrivateKey,
    /// The settlement contract address could not be parsed
    #[error("invalid settlement contract address")]
    InvalidContractAddress,
    /// The RPC listen address could not be parsed
    #[error("invalid rpc listen address: {0}")]
    InvalidListenAddr(String),
    /// A route table key is not a rollup id
    #[error("invalid rollup id in route table: {0}")]
    InvalidRollupId(String),
    /// Failed to extract the configuration from file and environment
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

/// Errors surfaced by the chain and full node RPC collaborators.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying JSON-RPC transport failed
    #[error("rpc transport error: {0}")]
    Rpc(String),
    /// Calldata construction or decoding failed
    #[error("abi error: {0}")]
    Abi(String),
    /// The queried record does not exist on the remote node
    #[error("not found: {0}")]
    NotFound(String),
}

/// Persistent store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened
    #[error("failed to open store: {0}")]
    Open(String),
    /// A transactional scope could not be started
    #[error("failed to begin scope: {0}")]
    Begin(String),
    /// Staged writes could not be applied
    #[error("failed to commit scope: {0}")]
    Commit(String),
    /// Staged writes could not be discarded
    #[error("failed to roll back scope: {0}")]
    Rollback(String),
    /// The backend rejected a read or staged write
    #[error("store backend error: {0}")]
    Backend(String),
    /// The scope was already released
    #[error("scope already released")]
    Released,
}

impl From<sled::Error> for StoreError {
    fn from(value: sled::Error) -> Self {
        Self::Backend(value.to_string())
    }
}

/// Monitored transaction pool errors.
#[derive(Debug, Error)]
pub enum TxManagerError {
    /// A monitored transaction with this identifier already exists
    #[error("monitored tx {0} already exists")]
    AlreadyExists(String),
    /// No monitored transaction exists under this identifier
    #[error("monitored tx {0} not found")]
    NotFound(String),
    /// The record could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(String),
    /// The persistent store rejected the operation
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Pipeline Error
///
/// One variant per verification and submission gate, in gate order. A claim
/// is submitted only if every gate passes; the first failing gate aborts the
/// call with its variant and nothing past it runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The claim's rollup has no registered full node endpoint
    #[error("there is no RPC registered for rollup {0}")]
    RouteNotFound(u32),
    /// The claim could not be encoded into a verification call
    #[error("failed to build verify ZKP tx data: {0}")]
    ProofBuild(#[source] ClientError),
    /// The settlement contract rejected the simulated verification call
    #[error("failed to call verify ZKP response: {0}")]
    ProofRejected(#[source] ClientError),
    /// The signer could not be recovered from the claim signature
    #[error("failed to recover signer from signature: {0}")]
    InvalidSignature(#[source] SignatureError),
    /// The trusted sequencer could not be read from the settlement contract
    #[error("failed to get trusted sequencer from L1: {0}")]
    SignerLookup(#[source] ClientError),
    /// The recovered signer is not the sequencer the settlement contract trusts
    #[error("unexpected signer: recovered {recovered:?}, L1 trusts {expected:?}")]
    UnauthorizedSigner {
        /// The signer recovered from the claim signature
        recovered: Address,
        /// The sequencer address the settlement contract trusts
        expected: Address,
    },
    /// The canonical batch could not be fetched from the rollup's full node
    #[error("failed to get batch from our node: {0}")]
    BatchFetch(#[source] ClientError),
    /// The canonical batch disagrees with the roots asserted by the claim
    #[error(
        "mismatch detected: claim state root {claim_state_root:?} vs batch {batch_state_root:?}, \
         claim local exit root {claim_exit_root:?} vs batch {batch_exit_root:?}"
    )]
    BatchMismatch {
        /// State root asserted by the claim
        claim_state_root: H256,
        /// State root recorded by the full node
        batch_state_root: H256,
        /// Local exit root asserted by the claim
        claim_exit_root: H256,
        /// Local exit root recorded by the full node
        batch_exit_root: H256,
    },
    /// A transactional scope could not be started for submission
    #[error("failed to begin dbTx: {0}")]
    ScopeBegin(#[source] StoreError),
    /// The monitored pool rejected the transaction
    #[error("failed to add tx to the monitored pool: {0}")]
    Enqueue(#[source] TxManagerError),
    /// The submission scope failed to commit.
    ///
    /// The monitored record may already be durable in the pool even though
    /// this call reports failure; operators must reconcile.
    #[error("failed to commit dbTx: {0}")]
    ScopeCommit(#[source] StoreError),
}

/// Status resolution errors.
#[derive(Debug, Error)]
pub enum StatusError {
    /// A transactional scope could not be started for the lookup
    #[error("failed to begin dbTx: {0}")]
    Begin(#[source] StoreError),
    /// The monitored pool lookup failed
    #[error("failed to get tx: {0}")]
    Lookup(#[source] TxManagerError),
}
