//! RPC
//!
//! The endpoints consumed by the JSON-RPC transport. Each endpoint returns
//! the `(result, error)` pair the transport writes on the wire: on success
//! the result slot carries the hex-encoded claim hash (or status token), on
//! any failure it carries the [`NO_TX_HASH`] sentinel alongside the error
//! that produced it. Existing clients key on the sentinel, so it is
//! reproduced exactly on every failure path.

use std::sync::Arc;

use ethers_core::types::H256;

use crate::{
    claim::SignedClaim,
    errors::{PipelineError, StatusError},
    pipeline::{encode_id, Pipeline},
};

/// Sentinel standing in for a transaction identifier on any failure path.
pub const NO_TX_HASH: &str = "0x0";

/// Interop Endpoints
///
/// The client-facing surface of the verification pipeline.
#[derive(Clone)]
pub struct InteropEndpoints {
    pipeline: Arc<Pipeline>,
}

impl InteropEndpoints {
    /// Constructs the endpoints over a [Pipeline].
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// Verifies and enqueues a signed claim.
    ///
    /// Returns the hex-encoded claim hash, or the sentinel plus the gate
    /// error that rejected the claim.
    pub async fn send_tx(&self, signed: SignedClaim) -> (String, Option<PipelineError>) {
        match self.pipeline.send_claim(&signed).await {
            Ok(hash) => (encode_id(hash), None),
            Err(e) => {
                tracing::warn!(
                    target: "concord::rpc",
                    rollup = signed.claim.rollup_id,
                    error = %e,
                    "rejected claim"
                );
                (NO_TX_HASH.to_string(), Some(e))
            }
        }
    }

    /// Resolves the lifecycle status of a previously submitted claim.
    ///
    /// Returns the lowercase status token, or the sentinel plus the lookup
    /// error. Callers should treat an error as "unknown", not "absent".
    pub fn get_tx_status(&self, hash: H256) -> (String, Option<StatusError>) {
        match self.pipeline.tx_status(hash) {
            Ok(status) => (status.to_string(), None),
            Err(e) => {
                tracing::warn!(target: "concord::rpc", error = %e, "failed to resolve tx status");
                (NO_TX_HASH.to_string(), Some(e))
            }
        }
    }
}
