//! Monitor
//!
//! The monitored pool publisher. Scans the pool for records created by the
//! pipeline, publishes each to L1 exactly once, and promotes published
//! records to a terminal state from their receipts. The publisher is the
//! sole writer of record transitions; the pipeline only creates and reads
//! records.

use std::time::Duration;

use ethers_core::types::{
    transaction::eip2718::TypedTransaction, TransactionRequest, H256, U64,
};
use ethers_middleware::SignerMiddleware;
use ethers_providers::{Http, Middleware, Provider};
use ethers_signers::{LocalWallet, Signer};
use eyre::Result;

use crate::txmgr::{MonitoredStatus, MonitoredTx, SledTxManager};

/// Transaction Monitor
///
/// Drives monitored transactions through `created -> sent -> confirmed`
/// (or `failed`). One publish attempt per poll tick; there is no gas
/// escalation, resubmission waits for the next tick.
#[derive(Debug, Clone)]
pub struct TxMonitor {
    /// The owner namespace this publisher drains.
    owner: String,
    /// The monitored pool.
    pool: SledTxManager,
    /// The L1 provider.
    provider: Provider<Http>,
    /// The publishing wallet, already bound to the L1 chain id.
    wallet: LocalWallet,
    /// Pool polling interval.
    poll_interval: Duration,
    /// Confirmation depth before a receipt is considered final.
    confirmations: u64,
}

impl TxMonitor {
    /// Constructs a new [TxMonitor].
    pub fn new(
        owner: String,
        pool: SledTxManager,
        provider: Provider<Http>,
        wallet: LocalWallet,
        poll_interval: Duration,
        confirmations: u64,
    ) -> Self {
        Self {
            owner,
            pool,
            provider,
            wallet,
            poll_interval,
            confirmations,
        }
    }

    /// Spawns the [TxMonitor] into a new task.
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move {
            tracing::info!(target: "concord::monitor", "Spawning monitored pool publisher...");
            self.execute().await
        })
    }

    /// Executes the publisher loop.
    pub async fn execute(self) -> Result<()> {
        let client = SignerMiddleware::new(self.provider.clone(), self.wallet.clone());
        loop {
            tokio::time::sleep(self.poll_interval).await;
            let pending = match self.pool.pending(&self.owner) {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::warn!(target: "concord::monitor", error = %e, "failed to scan monitored pool");
                    continue;
                }
            };
            for record in pending {
                let id = record.id.clone();
                if let Err(e) = self.advance(&client, record).await {
                    tracing::warn!(
                        target: "concord::monitor",
                        id = %id,
                        error = %e,
                        "failed to advance monitored tx"
                    );
                }
            }
        }
    }

    /// Advances one monitored record by a single lifecycle step.
    async fn advance(
        &self,
        client: &SignerMiddleware<Provider<Http>, LocalWallet>,
        mut record: MonitoredTx,
    ) -> Result<()> {
        match record.status {
            MonitoredStatus::Created => {
                let tx = self.craft_transaction(client, &record).await?;
                let pending = client.send_transaction(tx, None).await?;
                let tx_hash: H256 = *pending;
                record.sent_tx_hash = Some(tx_hash);
                record.status = MonitoredStatus::Sent;
                self.pool.update(&record)?;
                tracing::info!(
                    target: "concord::monitor",
                    id = %record.id,
                    tx = ?tx_hash,
                    "published monitored tx"
                );
            }
            MonitoredStatus::Sent => {
                let tx_hash = match record.sent_tx_hash {
                    Some(tx_hash) => tx_hash,
                    // sent without a hash cannot happen through this
                    // publisher; requeue rather than strand the record
                    None => {
                        record.status = MonitoredStatus::Created;
                        self.pool.update(&record)?;
                        return Ok(());
                    }
                };
                if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                    let tip = self.provider.get_block_number().await?;
                    let mined = receipt.block_number.unwrap_or(tip);
                    if tip.saturating_sub(mined) < U64::from(self.confirmations) {
                        return Ok(());
                    }
                    record.status = if receipt.status == Some(U64::from(1)) {
                        MonitoredStatus::Confirmed
                    } else {
                        MonitoredStatus::Failed
                    };
                    self.pool.update(&record)?;
                    tracing::info!(
                        target: "concord::monitor",
                        id = %record.id,
                        status = %record.status,
                        "monitored tx reached terminal state"
                    );
                }
            }
            MonitoredStatus::Confirmed | MonitoredStatus::Failed => {}
        }
        Ok(())
    }

    /// Crafts the L1 transaction for a monitored record.
    ///
    /// Queries L1 for the current fee market conditions and the publisher
    /// nonce. Does not publish the resulting transaction.
    async fn craft_transaction(
        &self,
        client: &SignerMiddleware<Provider<Http>, LocalWallet>,
        record: &MonitoredTx,
    ) -> Result<TransactionRequest> {
        let nonce = self
            .provider
            .get_transaction_count(self.wallet.address(), None)
            .await?;
        let gas_price = self.provider.get_gas_price().await?;
        let tx = TransactionRequest::new()
            .to(record.request.to)
            .value(record.request.value)
            .data(record.request.data.clone())
            .gas_price(gas_price)
            .nonce(nonce);
        let typed: TypedTransaction = tx.clone().into();
        let gas = client.estimate_gas(&typed, None).await? + record.request.gas_offset;
        Ok(tx.gas(gas))
    }
}
