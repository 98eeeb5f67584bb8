//! Server
//!
//! JSON-RPC transport over the interop endpoints. JSON-RPC responses carry a
//! single slot, so the endpoints' `(result, error)` pair collapses into an
//! error object on failure, with the sentinel result preserved in the error
//! data for compatibility.

use std::net::SocketAddr;

use ethers_core::types::H256;
use eyre::Result;
use jsonrpsee::{
    core::{async_trait, RpcResult},
    proc_macros::rpc,
    server::{Server, ServerHandle},
    types::ErrorObjectOwned,
};

use crate::{claim::SignedClaim, rpc::InteropEndpoints};

/// Error code returned when a claim is rejected by the pipeline.
pub const CLAIM_REJECTED_CODE: i32 = -32000;

/// Error code returned when a status lookup fails.
pub const STATUS_LOOKUP_CODE: i32 = -32001;

/// The `interop_` JSON-RPC namespace.
#[rpc(server, namespace = "interop")]
pub trait InteropApi {
    /// Verifies and enqueues a signed claim, returning its hash.
    #[method(name = "sendTx")]
    async fn send_tx(&self, signed: SignedClaim) -> RpcResult<String>;

    /// Resolves the status of a previously submitted claim.
    #[method(name = "getTxStatus")]
    async fn get_tx_status(&self, hash: H256) -> RpcResult<String>;
}

/// [InteropApiServer] over the pipeline endpoints.
pub struct InteropRpc {
    endpoints: InteropEndpoints,
}

impl InteropRpc {
    /// Constructs the RPC surface over the endpoints.
    pub fn new(endpoints: InteropEndpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl InteropApiServer for InteropRpc {
    async fn send_tx(&self, signed: SignedClaim) -> RpcResult<String> {
        let (result, error) = self.endpoints.send_tx(signed).await;
        match error {
            None => Ok(result),
            Some(e) => Err(ErrorObjectOwned::owned(
                CLAIM_REJECTED_CODE,
                e.to_string(),
                Some(result),
            )),
        }
    }

    async fn get_tx_status(&self, hash: H256) -> RpcResult<String> {
        let (result, error) = self.endpoints.get_tx_status(hash);
        match error {
            None => Ok(result),
            Some(e) => Err(ErrorObjectOwned::owned(
                STATUS_LOOKUP_CODE,
                e.to_string(),
                Some(result),
            )),
        }
    }
}

/// Starts the JSON-RPC server on `addr`.
pub async fn start(addr: SocketAddr, endpoints: InteropEndpoints) -> Result<ServerHandle> {
    let server = Server::builder().build(addr).await?;
    let handle = server.start(InteropRpc::new(endpoints).into_rpc());
    tracing::info!(target: "concord::server", %addr, "RPC server listening");
    Ok(handle)
}
