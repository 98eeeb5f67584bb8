//! Settlement
//!
//! Client for the L1 settlement contract. Builds the `verifyBatches` call
//! payload for a claim, simulates it without committing, and reads the
//! sequencer identity the contract currently trusts for a rollup.

use async_trait::async_trait;
use ethers_core::{
    abi::{Function, HumanReadableParser, Token},
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256},
};
use ethers_providers::{Http, Middleware, Provider};
use once_cell::sync::Lazy;

use crate::{claim::Proof, errors::ClientError};

#[cfg(test)]
use mockall::automock;

/// Number of 32-byte words in a well-formed aggregated proof blob.
pub const PROOF_WORDS: usize = 24;

/// `verifyBatchesTrustedAggregator` on the settlement contract.
static VERIFY_BATCHES: Lazy<Function> = Lazy::new(|| {
    HumanReadableParser::parse_function(
        "function verifyBatchesTrustedAggregator(uint32,uint64,uint64,uint64,bytes32,bytes32,address,bytes32[24])",
    )
    .expect("verifyBatchesTrustedAggregator signature parses")
});

/// `trustedSequencer` view on the settlement contract.
static TRUSTED_SEQUENCER: Lazy<Function> = Lazy::new(|| {
    HumanReadableParser::parse_function("function trustedSequencer(uint32) view returns (address)")
        .expect("trustedSequencer signature parses")
});

/// Settlement Contract Client
///
/// The seam between the pipeline and the L1 chain. Payload construction is
/// pure; `call` and `sequencer_address` hit the chain.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SettlementClient: Send + Sync {
    /// Encodes the verification call payload for a claim.
    fn build_verify_payload(
        &self,
        last_verified_batch: u64,
        new_verified_batch: u64,
        zkp: Proof,
        rollup_id: u32,
    ) -> Result<Bytes, ClientError>;

    /// Simulates a call against the contract at `to` without committing.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError>;

    /// Reads the sequencer address the contract trusts for `rollup_id`.
    async fn sequencer_address(&self, rollup_id: u32) -> Result<Address, ClientError>;
}

/// Rollup Manager
///
/// [SettlementClient] over an HTTP L1 provider.
#[derive(Debug, Clone)]
pub struct RollupManager {
    /// The L1 provider.
    provider: Provider<Http>,
    /// The settlement contract address.
    contract: Address,
    /// The beneficiary credited by verification calls built by this client.
    beneficiary: Address,
}

impl RollupManager {
    /// Constructs a new [RollupManager].
    pub fn new(provider: Provider<Http>, contract: Address, beneficiary: Address) -> Self {
        Self {
            provider,
            contract,
            beneficiary,
        }
    }

    /// Splits a proof blob into its fixed 32-byte words.
    fn proof_words(proof: &Bytes) -> Result<Vec<Token>, ClientError> {
        if proof.len() != PROOF_WORDS * 32 {
            return Err(ClientError::Abi(format!(
                "proof must be {} 32-byte words, got {} bytes",
                PROOF_WORDS,
                proof.len()
            )));
        }
        Ok(proof
            .chunks(32)
            .map(|word| Token::FixedBytes(word.to_vec()))
            .collect())
    }
}

#[async_trait]
impl SettlementClient for RollupManager {
    fn build_verify_payload(
        &self,
        last_verified_batch: u64,
        new_verified_batch: u64,
        zkp: Proof,
        rollup_id: u32,
    ) -> Result<Bytes, ClientError> {
        let tokens = vec![
            Token::Uint(U256::from(rollup_id)),
            // No pending state: claims verify against consolidated state only.
            Token::Uint(U256::zero()),
            Token::Uint(U256::from(last_verified_batch)),
            Token::Uint(U256::from(new_verified_batch)),
            Token::FixedBytes(zkp.new_local_exit_root.as_bytes().to_vec()),
            Token::FixedBytes(zkp.new_state_root.as_bytes().to_vec()),
            Token::Address(self.beneficiary),
            Token::FixedArray(Self::proof_words(&zkp.proof)?),
        ];
        let data = VERIFY_BATCHES
            .encode_input(&tokens)
            .map_err(|e| ClientError::Abi(e.to_string()))?;
        Ok(Bytes::from(data))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))
    }

    async fn sequencer_address(&self, rollup_id: u32) -> Result<Address, ClientError> {
        let data = TRUSTED_SEQUENCER
            .encode_input(&[Token::Uint(U256::from(rollup_id))])
            .map_err(|e| ClientError::Abi(e.to_string()))?;
        let raw = self.call(self.contract, Bytes::from(data)).await?;
        let mut tokens = TRUSTED_SEQUENCER
            .decode_output(&raw)
            .map_err(|e| ClientError::Abi(format!("{e}: 0x{}", hex::encode(&raw))))?;
        match tokens.pop().and_then(Token::into_address) {
            Some(addr) => Ok(addr),
            None => Err(ClientError::Abi(
                "trustedSequencer returned no address".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::{types::H256, utils::keccak256};

    fn manager() -> RollupManager {
        let provider = Provider::<Http>::try_from("http://localhost:8545").unwrap();
        RollupManager::new(provider, Address::repeat_byte(0xde), Address::repeat_byte(0xbe))
    }

    #[test]
    fn verify_payload_starts_with_function_selector() {
        let zkp = Proof {
            new_state_root: H256::repeat_byte(0x11),
            new_local_exit_root: H256::repeat_byte(0x22),
            proof: Bytes::from(vec![0u8; PROOF_WORDS * 32]),
        };
        let payload = manager().build_verify_payload(1, 2, zkp, 1).unwrap();
        let selector = &keccak256(
            "verifyBatchesTrustedAggregator(uint32,uint64,uint64,uint64,bytes32,bytes32,address,bytes32[24])",
        )[..4];
        assert_eq!(&payload[..4], selector);
        // selector + 7 scalar words + 24 inline proof words
        assert_eq!(payload.len(), 4 + 32 * (7 + PROOF_WORDS));
    }

    #[test]
    fn short_proof_blob_is_a_build_error() {
        let zkp = Proof {
            proof: Bytes::from(vec![0u8; 31]),
            ..Default::default()
        };
        let err = manager().build_verify_payload(1, 2, zkp, 1).unwrap_err();
        assert!(matches!(err, ClientError::Abi(_)));
    }
}
