//! Claims
//!
//! A claim asserts that a contiguous range of rollup batches has been proven,
//! carrying the resulting state commitments and the aggregated validity proof.
//! Claims are signed over their content hash; the recoverable signer is the
//! identity the settlement contract must recognize as the rollup's trusted
//! sequencer.

use ethers_core::{
    types::{Address, Bytes, RecoveryMessage, Signature, SignatureError, H256},
    utils::keccak256,
};
use ethers_signers::LocalWallet;
use serde::{Deserialize, Serialize};

/// The validity proof payload of a [Claim].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// The rollup state root after the claimed batch range.
    pub new_state_root: H256,
    /// The rollup local exit root after the claimed batch range.
    pub new_local_exit_root: H256,
    /// The aggregated proof blob, 24 words of 32 bytes when well formed.
    pub proof: Bytes,
}

/// An unsigned finality claim for a range of rollup batches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// The last batch number already verified on L1.
    pub last_verified_batch: u64,
    /// The highest batch number this claim proves.
    pub new_verified_batch: u64,
    /// The proof payload.
    pub zkp: Proof,
    /// The identifier of the rollup the claim belongs to.
    #[serde(rename = "rollupID")]
    pub rollup_id: u32,
}

impl Claim {
    /// Computes the content hash of the claim.
    ///
    /// The hash is keccak-256 over the packed canonical encoding: big-endian
    /// rollup id, big-endian batch numbers, both roots, then the proof blob.
    /// Fixed-width fields precede the variable-length tail, so the encoding
    /// is unambiguous.
    pub fn hash(&self) -> H256 {
        let mut packed =
            Vec::with_capacity(4 + 8 + 8 + 32 + 32 + self.zkp.proof.len());
        packed.extend_from_slice(&self.rollup_id.to_be_bytes());
        packed.extend_from_slice(&self.last_verified_batch.to_be_bytes());
        packed.extend_from_slice(&self.new_verified_batch.to_be_bytes());
        packed.extend_from_slice(self.zkp.new_state_root.as_bytes());
        packed.extend_from_slice(self.zkp.new_local_exit_root.as_bytes());
        packed.extend_from_slice(&self.zkp.proof);
        H256::from(keccak256(packed))
    }

    /// Signs the claim's content hash with the given wallet.
    ///
    /// The hash is signed raw, without an EIP-191 prefix, matching what the
    /// settlement flow expects to recover on the other side.
    pub fn sign(self, wallet: &LocalWallet) -> SignedClaim {
        let signature = wallet.sign_hash(self.hash());
        SignedClaim {
            claim: self,
            signature,
        }
    }
}

/// A [Claim] plus the signature authorizing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedClaim {
    /// The signed claim.
    pub claim: Claim,
    /// The secp256k1 signature over the claim's content hash.
    #[serde(with = "signature_hex")]
    pub signature: Signature,
}

/// Wire encoding of a signature: 65 bytes (`r || s || v`) as 0x-prefixed hex.
mod signature_hex {
    use ethers_core::types::{Signature, U256};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sig: &Signature, serializer: S) -> Result<S::Ok, S::Error> {
        let mut bytes = [0u8; 65];
        sig.r.to_big_endian(&mut bytes[..32]);
        sig.s.to_big_endian(&mut bytes[32..64]);
        bytes[64] = sig.v as u8;
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Signature, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let stripped = raw.strip_prefix("0x").unwrap_or(&raw);
        let bytes = hex::decode(stripped).map_err(de::Error::custom)?;
        if bytes.len() != 65 {
            return Err(de::Error::custom(format!(
                "signature must be 65 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Signature {
            r: U256::from_big_endian(&bytes[..32]),
            s: U256::from_big_endian(&bytes[32..64]),
            v: bytes[64] as u64,
        })
    }
}

impl SignedClaim {
    /// Recovers the address that signed the claim.
    pub fn signer(&self) -> Result<Address, SignatureError> {
        self.signature
            .recover(RecoveryMessage::Hash(self.claim.hash()))
    }
}
