use concord::claim::{Claim, Proof, SignedClaim};
use ethers_core::types::{Bytes, Signature, H256, U256};
use ethers_signers::{LocalWallet, Signer};

fn test_claim() -> Claim {
    Claim {
        last_verified_batch: 1,
        new_verified_batch: 2,
        zkp: Proof {
            new_state_root: H256::from_low_u64_be(11),
            new_local_exit_root: H256::from_low_u64_be(11),
            proof: Bytes::from(vec![0xaa; 96]),
        },
        rollup_id: 1,
    }
}

#[test]
fn content_hash_is_deterministic() {
    assert_eq!(test_claim().hash(), test_claim().hash());
}

#[test]
fn content_hash_covers_every_field() {
    let base = test_claim().hash();

    let mut claim = test_claim();
    claim.rollup_id = 2;
    assert_ne!(claim.hash(), base);

    let mut claim = test_claim();
    claim.last_verified_batch = 0;
    assert_ne!(claim.hash(), base);

    let mut claim = test_claim();
    claim.new_verified_batch = 3;
    assert_ne!(claim.hash(), base);

    let mut claim = test_claim();
    claim.zkp.new_state_root = H256::from_low_u64_be(12);
    assert_ne!(claim.hash(), base);

    let mut claim = test_claim();
    claim.zkp.new_local_exit_root = H256::from_low_u64_be(12);
    assert_ne!(claim.hash(), base);

    let mut claim = test_claim();
    claim.zkp.proof = Bytes::from(vec![0xab; 96]);
    assert_ne!(claim.hash(), base);
}

#[test]
fn sign_then_recover_roundtrip() {
    let wallet = LocalWallet::new(&mut rand::thread_rng());
    let signed = test_claim().sign(&wallet);
    assert_eq!(signed.signer().unwrap(), wallet.address());
}

#[test]
fn tampered_claim_does_not_recover_the_signer() {
    let wallet = LocalWallet::new(&mut rand::thread_rng());
    let mut signed = test_claim().sign(&wallet);
    signed.claim.new_verified_batch += 1;
    // recovery either fails outright or lands on an unrelated address
    match signed.signer() {
        Ok(recovered) => assert_ne!(recovered, wallet.address()),
        Err(_) => {}
    }
}

#[test]
fn zeroed_signature_does_not_recover() {
    let signed = SignedClaim {
        claim: test_claim(),
        signature: Signature {
            r: U256::zero(),
            s: U256::zero(),
            v: 0,
        },
    };
    assert!(signed.signer().is_err());
}

#[test]
fn claims_serialize_with_wire_field_names() {
    let json = serde_json::to_value(test_claim()).unwrap();
    assert!(json.get("lastVerifiedBatch").is_some());
    assert!(json.get("newVerifiedBatch").is_some());
    assert!(json.get("rollupID").is_some());
    assert!(json["zkp"].get("newStateRoot").is_some());
    assert!(json["zkp"].get("newLocalExitRoot").is_some());

    let back: Claim = serde_json::from_value(json).unwrap();
    assert_eq!(back, test_claim());
}

#[test]
fn signed_claims_roundtrip_through_json() {
    let wallet = LocalWallet::new(&mut rand::thread_rng());
    let signed = test_claim().sign(&wallet);

    let json = serde_json::to_value(&signed).unwrap();
    let encoded = json["signature"].as_str().unwrap();
    assert!(encoded.starts_with("0x"));
    assert_eq!(encoded.len(), 2 + 65 * 2);

    let back: SignedClaim = serde_json::from_value(json).unwrap();
    assert_eq!(back.claim, signed.claim);
    assert_eq!(back.signer().unwrap(), wallet.address());
}
