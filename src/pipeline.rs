//! Pipeline
//!
//! The claim verification and submission pipeline. A claim passes four gates
//! in strictly increasing order of cost: a registered route must exist for
//! its rollup, the settlement contract must accept the proof in simulation,
//! the signer must be the sequencer the contract trusts, and the rollup's own
//! full node must agree with the claimed state commitments. Only then is the
//! verification transaction handed to the monitored pool, atomically with the
//! submission scope. Any gate failure aborts the call with a tagged error and
//! no submission is performed.

use std::sync::Arc;

use ethers_core::types::{Address, Bytes, H256, U256};

use crate::{
    claim::{Claim, SignedClaim},
    errors::{PipelineError, StatusError},
    node::FullNodeConnector,
    routes::RouteRegistry,
    settlement::SettlementClient,
    store::Database,
    txmgr::{MonitoredStatus, TxManager, TxRequest},
};

/// The owner namespace all of this service's monitored transactions are
/// registered under, partitioning them from other users of the pool.
pub const MONITORED_TX_OWNER: &str = "interop";

/// Encodes a claim hash as a monitored transaction identifier.
pub fn encode_id(hash: H256) -> String {
    format!("{hash:#x}")
}

/// Pipeline
///
/// Orchestrates claim verification and the atomic handoff into the monitored
/// pool. One instance serves all requests; per-request state never outlives a
/// call.
pub struct Pipeline {
    /// The settlement contract address on L1.
    contract: Address,
    /// The address that will publish verification transactions.
    publisher: Address,
    /// Extra gas added on top of the estimate when publishing.
    gas_offset: u64,
    /// Rollup id to full node endpoint table.
    registry: RouteRegistry,
    /// The L1 settlement contract client.
    settlement: Arc<dyn SettlementClient>,
    /// Connector for per-rollup full nodes.
    nodes: Arc<dyn FullNodeConnector>,
    /// The persistent store scopes are begun from.
    db: Arc<dyn Database>,
    /// The monitored transaction pool.
    pool: Arc<dyn TxManager>,
}

impl Pipeline {
    /// Constructs a new [Pipeline].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contract: Address,
        publisher: Address,
        gas_offset: u64,
        registry: RouteRegistry,
        settlement: Arc<dyn SettlementClient>,
        nodes: Arc<dyn FullNodeConnector>,
        db: Arc<dyn Database>,
        pool: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            contract,
            publisher,
            gas_offset,
            registry,
            settlement,
            nodes,
            db,
            pool,
        }
    }

    /// Runs every verification gate against a signed claim.
    ///
    /// Returns the verification calldata for submission once all gates pass.
    pub async fn check(&self, signed: &SignedClaim) -> Result<Bytes, PipelineError> {
        let claim = &signed.claim;
        let endpoint = self
            .registry
            .resolve(claim.rollup_id)
            .ok_or(PipelineError::RouteNotFound(claim.rollup_id))?
            .to_string();
        let payload = self.verify_proof(claim).await?;
        self.authenticate(signed).await?;
        self.reconcile_batch(&endpoint, claim).await?;
        Ok(payload)
    }

    /// Verifies a claim and enqueues its verification transaction.
    pub async fn send_claim(&self, signed: &SignedClaim) -> Result<H256, PipelineError> {
        let payload = self.check(signed).await?;
        self.submit(signed, payload)
    }

    /// Builds the verification payload and simulates it on the settlement
    /// contract. The simulation is a dry run; no chain state changes.
    async fn verify_proof(&self, claim: &Claim) -> Result<Bytes, PipelineError> {
        let payload = self
            .settlement
            .build_verify_payload(
                claim.last_verified_batch,
                claim.new_verified_batch,
                claim.zkp.clone(),
                claim.rollup_id,
            )
            .map_err(PipelineError::ProofBuild)?;
        self.settlement
            .call(self.contract, payload.clone())
            .await
            .map_err(PipelineError::ProofRejected)?;
        tracing::debug!(
            target: "concord::pipeline",
            rollup = claim.rollup_id,
            "settlement contract accepted simulated proof"
        );
        Ok(payload)
    }

    /// Recovers the claim signer and compares it against the sequencer the
    /// settlement contract trusts for the rollup. Byte-exact comparison.
    async fn authenticate(&self, signed: &SignedClaim) -> Result<(), PipelineError> {
        let recovered = signed.signer().map_err(PipelineError::InvalidSignature)?;
        let expected = self
            .settlement
            .sequencer_address(signed.claim.rollup_id)
            .await
            .map_err(PipelineError::SignerLookup)?;
        if recovered != expected {
            return Err(PipelineError::UnauthorizedSigner {
                recovered,
                expected,
            });
        }
        Ok(())
    }

    /// Cross-checks the claimed roots against the rollup's own full node.
    ///
    /// The node is a second oracle, independent of the contract simulation:
    /// a proof the contract accepts can still describe a history the rollup's
    /// own node never produced.
    async fn reconcile_batch(&self, endpoint: &str, claim: &Claim) -> Result<(), PipelineError> {
        let node = self
            .nodes
            .connect(endpoint.to_string())
            .map_err(PipelineError::BatchFetch)?;
        let batch = node
            .batch_by_number(claim.new_verified_batch)
            .await
            .map_err(PipelineError::BatchFetch)?;
        if batch.state_root != claim.zkp.new_state_root
            || batch.local_exit_root != claim.zkp.new_local_exit_root
        {
            return Err(PipelineError::BatchMismatch {
                claim_state_root: claim.zkp.new_state_root,
                batch_state_root: batch.state_root,
                claim_exit_root: claim.zkp.new_local_exit_root,
                batch_exit_root: batch.local_exit_root,
            });
        }
        Ok(())
    }

    /// Hands a fully verified claim to the monitored pool.
    ///
    /// The pool record is staged through a fresh scope so the enqueue and any
    /// bookkeeping land atomically. A commit failure is surfaced as
    /// [PipelineError::ScopeCommit]: the record may already be durable in the
    /// pool even though this call reports failure, and operators must
    /// reconcile.
    pub fn submit(&self, signed: &SignedClaim, payload: Bytes) -> Result<H256, PipelineError> {
        let hash = signed.claim.hash();
        let id = encode_id(hash);
        let mut scope = self.db.begin().map_err(PipelineError::ScopeBegin)?;
        let request = TxRequest {
            from: self.publisher,
            to: self.contract,
            value: U256::zero(),
            data: payload,
            gas_offset: self.gas_offset,
        };
        if let Err(e) = self
            .pool
            .add(MONITORED_TX_OWNER, &id, request, scope.as_mut())
        {
            if let Err(re) = scope.rollback() {
                tracing::warn!(
                    target: "concord::pipeline",
                    error = %re,
                    "failed to roll back submission scope"
                );
            }
            return Err(PipelineError::Enqueue(e));
        }
        scope.commit().map_err(PipelineError::ScopeCommit)?;
        tracing::info!(target: "concord::pipeline", id = %id, "claim accepted and enqueued");
        Ok(hash)
    }

    /// Resolves the lifecycle state of a previously submitted claim.
    ///
    /// Read-only: the scope is rolled back on every path.
    pub fn tx_status(&self, hash: H256) -> Result<MonitoredStatus, StatusError> {
        let mut scope = self.db.begin().map_err(StatusError::Begin)?;
        let result = self
            .pool
            .result(MONITORED_TX_OWNER, &encode_id(hash), scope.as_ref());
        if let Err(e) = scope.rollback() {
            tracing::warn!(
                target: "concord::pipeline",
                error = %e,
                "failed to release status scope"
            );
        }
        Ok(result.map_err(StatusError::Lookup)?.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitored_ids_are_full_lowercase_hex() {
        let id = encode_id(H256::from_low_u64_be(0xabcd));
        assert_eq!(id.len(), 2 + 64);
        assert!(id.starts_with("0x"));
        assert!(id.ends_with("abcd"));
    }
}
