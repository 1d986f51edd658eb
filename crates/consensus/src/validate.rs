//! Input validation (§4.3 step 1, §7 `ValidationError`).

use xln_types::error::ValidationError;
use xln_types::limits::{MAX_PRECOMMITS_PER_INPUT, MAX_TXS_PER_INPUT, MEMPOOL_CAP};
use xln_types::{EntityConfig, EntityInput};

/// Structural validation of an `EntityInput` before it touches consensus
/// state. Negative heights are impossible by construction (`height: u64`);
/// everything else §7 lists is checked here. `mempool_len` is the
/// receiving replica's current mempool size, so an input that would push
/// it over the cap (I2) is rejected here rather than silently truncated
/// after absorption.
pub fn validate_input(
    config: &EntityConfig,
    input: &EntityInput,
    mempool_len: usize,
) -> Result<(), ValidationError> {
    if let Some(txs) = &input.entity_txs {
        if txs.len() > MAX_TXS_PER_INPUT {
            return Err(ValidationError::TooManyTxs {
                got: txs.len(),
                bound: MAX_TXS_PER_INPUT,
            });
        }
        let prospective_len = mempool_len + txs.len();
        if prospective_len > MEMPOOL_CAP {
            return Err(ValidationError::MempoolCapExceeded {
                cap: MEMPOOL_CAP,
                len: prospective_len,
            });
        }
    }
    if let Some(precommits) = &input.precommits {
        if precommits.len() > MAX_PRECOMMITS_PER_INPUT {
            return Err(ValidationError::TooManyPrecommits {
                got: precommits.len(),
                bound: MAX_PRECOMMITS_PER_INPUT,
            });
        }
        for signer in precommits.keys() {
            if !config.shares.contains_key(signer) {
                return Err(ValidationError::UnknownTxType(format!(
                    "precommit from unknown signer {signer}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use xln_types::{ConsensusMode, JurisdictionId, SignerId};

    fn config() -> EntityConfig {
        let mut shares = BTreeMap::new();
        shares.insert(SignerId::new("v1"), 1);
        EntityConfig {
            mode: ConsensusMode::ProposerBased,
            validators: vec![SignerId::new("v1")],
            threshold: 1,
            shares,
            jurisdiction: JurisdictionId::new("test"),
        }
    }

    #[test]
    fn rejects_oversized_tx_batch() {
        let cfg = config();
        let txs = vec![
            xln_types::EntityTx::Chat {
                from: SignerId::new("v1"),
                message: "x".to_string(),
            };
            MAX_TXS_PER_INPUT + 1
        ];
        let input = EntityInput {
            entity_id: xln_types::EntityId::ZERO,
            signer_id: SignerId::new("v1"),
            entity_txs: Some(txs),
            proposed_frame: None,
            precommits: None,
            metadata: None,
        };
        assert!(matches!(
            validate_input(&cfg, &input, 0),
            Err(ValidationError::TooManyTxs { .. })
        ));
    }

    #[test]
    fn rejects_input_that_would_exceed_mempool_cap() {
        let cfg = config();
        let input = EntityInput {
            entity_id: xln_types::EntityId::ZERO,
            signer_id: SignerId::new("v1"),
            entity_txs: Some(vec![xln_types::EntityTx::Chat {
                from: SignerId::new("v1"),
                message: "x".to_string(),
            }]),
            proposed_frame: None,
            precommits: None,
            metadata: None,
        };
        assert!(matches!(
            validate_input(&cfg, &input, MEMPOOL_CAP),
            Err(ValidationError::MempoolCapExceeded { .. })
        ));
    }

    #[test]
    fn rejects_precommit_from_unknown_signer() {
        let cfg = config();
        let mut precommits = BTreeMap::new();
        precommits.insert(SignerId::new("ghost"), xln_types::Signature(vec![1]));
        let input = EntityInput {
            entity_id: xln_types::EntityId::ZERO,
            signer_id: SignerId::new("v1"),
            entity_txs: None,
            proposed_frame: None,
            precommits: Some(precommits),
            metadata: None,
        };
        assert!(validate_input(&cfg, &input, 0).is_err());
    }
}
