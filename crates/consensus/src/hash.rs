//! The proposal hash function (§4.3): a deterministic function of
//! `(height, timestamp, txs)`.

use parity_scale_codec::Encode;
use sha2::{Digest, Sha256};
use xln_types::EntityTx;

#[derive(Encode)]
struct HashedFrame<'a> {
    height: u64,
    timestamp: u64,
    txs: &'a [EntityTx],
}

/// Hashes `(height, timestamp, txs)` over their canonical SCALE encoding.
/// Two proposers computing a frame from the same inputs produce the same
/// hash, which is what lets validators sign without re-deriving state.
pub fn proposal_hash(height: u64, timestamp: u64, txs: &[EntityTx]) -> [u8; 32] {
    let encoded = HashedFrame {
        height,
        timestamp,
        txs,
    }
    .encode();
    let digest = Sha256::digest(&encoded);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_types::SignerId;

    #[test]
    fn same_inputs_hash_identically() {
        let txs = vec![EntityTx::Chat {
            from: SignerId::new("v1"),
            message: "hi".to_string(),
        }];
        assert_eq!(proposal_hash(1, 1000, &txs), proposal_hash(1, 1000, &txs));
    }

    #[test]
    fn different_height_hashes_differently() {
        let txs = vec![EntityTx::Chat {
            from: SignerId::new("v1"),
            message: "hi".to_string(),
        }];
        assert_ne!(proposal_hash(1, 1000, &txs), proposal_hash(2, 1000, &txs));
    }
}
