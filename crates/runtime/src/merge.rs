//! Input merging (§4.5 step 3): group by `(entity_id, signer_id)`,
//! concatenate `entity_txs`, union `precommits`, keep the latest
//! `proposed_frame`.

use std::collections::BTreeMap;
use xln_types::{EntityId, EntityInput, SignerId};

/// Merges a batch of `EntityInput`s addressed to the same `(entity_id,
/// signer_id)` replica into one. Idempotent: `merge(merge(xs)) ==
/// merge(xs)`, since re-merging a list already collapsed to one input per
/// key leaves every union/concat/latest-pick a no-op.
pub fn merge_inputs(inputs: Vec<EntityInput>) -> Vec<EntityInput> {
    let mut grouped: BTreeMap<(EntityId, SignerId), EntityInput> = BTreeMap::new();

    for input in inputs {
        let key = (input.entity_id, input.signer_id.clone());
        grouped
            .entry(key)
            .and_modify(|existing| merge_into(existing, &input))
            .or_insert(input);
    }

    grouped.into_values().collect()
}

fn merge_into(existing: &mut EntityInput, incoming: &EntityInput) {
    if let Some(txs) = &incoming.entity_txs {
        existing
            .entity_txs
            .get_or_insert_with(Vec::new)
            .extend(txs.iter().cloned());
    }
    if let Some(precommits) = &incoming.precommits {
        let slot = existing.precommits.get_or_insert_with(BTreeMap::new);
        for (signer, sig) in precommits {
            slot.entry(signer.clone()).or_insert_with(|| sig.clone());
        }
    }
    if let Some(frame) = &incoming.proposed_frame {
        existing.proposed_frame = Some(frame.clone());
    }
    if incoming.metadata.is_some() {
        existing.metadata = incoming.metadata.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_types::EntityTx;

    fn entity(byte: u8) -> EntityId {
        EntityId::from_bytes([byte; 32])
    }

    #[test]
    fn concatenates_entity_txs_for_same_replica() {
        let s1 = SignerId::new("s1");
        let e1 = entity(1);
        let a = EntityInput::mempool_push(
            e1,
            s1.clone(),
            vec![EntityTx::Chat {
                from: s1.clone(),
                message: "hi".into(),
            }],
        );
        let b = EntityInput::mempool_push(
            e1,
            s1.clone(),
            vec![EntityTx::Chat {
                from: s1.clone(),
                message: "there".into(),
            }],
        );
        let merged = merge_inputs(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].entity_txs.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let s1 = SignerId::new("s1");
        let e1 = entity(1);
        let inputs = vec![EntityInput::mempool_push(
            e1,
            s1.clone(),
            vec![EntityTx::Chat {
                from: s1,
                message: "hi".into(),
            }],
        )];
        let once = merge_inputs(inputs);
        let twice = merge_inputs(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn repeated_precommit_delivery_is_a_no_op() {
        let s1 = SignerId::new("s1");
        let e1 = entity(1);
        let mut precommits = BTreeMap::new();
        precommits.insert(s1.clone(), xln_types::Signature(vec![1, 2, 3]));
        let input = EntityInput {
            entity_id: e1,
            signer_id: s1,
            entity_txs: None,
            proposed_frame: None,
            precommits: Some(precommits.clone()),
            metadata: None,
        };
        let merged_once = merge_inputs(vec![input.clone()]);
        let merged_twice = merge_inputs(vec![input.clone(), input]);
        assert_eq!(
            merged_once[0].precommits.as_ref().unwrap().len(),
            merged_twice[0].precommits.as_ref().unwrap().len()
        );
    }

    #[test]
    fn keeps_latest_proposed_frame() {
        let s1 = SignerId::new("s1");
        let e1 = entity(1);
        let config = xln_types::EntityConfig {
            mode: xln_types::ConsensusMode::ProposerBased,
            validators: vec![s1.clone()],
            threshold: 1,
            shares: std::collections::BTreeMap::from([(s1.clone(), 1)]),
            jurisdiction: xln_types::JurisdictionId::new("test"),
        };
        let state1 = xln_types::EntityState::genesis(config.clone());
        let mut state2 = state1.clone();
        state2.height = 1;
        let frame1 = xln_types::ProposedFrame {
            height: 1,
            txs: vec![],
            hash: [1u8; 32],
            new_state: state1,
            signatures: BTreeMap::new(),
        };
        let frame2 = xln_types::ProposedFrame {
            height: 1,
            txs: vec![],
            hash: [2u8; 32],
            new_state: state2,
            signatures: BTreeMap::new(),
        };
        let a = EntityInput {
            entity_id: e1,
            signer_id: s1.clone(),
            entity_txs: None,
            proposed_frame: Some(frame1),
            precommits: None,
            metadata: None,
        };
        let b = EntityInput {
            entity_id: e1,
            signer_id: s1,
            entity_txs: None,
            proposed_frame: Some(frame2.clone()),
            precommits: None,
            metadata: None,
        };
        let merged = merge_inputs(vec![a, b]);
        assert_eq!(merged[0].proposed_frame.as_ref().unwrap().hash, frame2.hash);
    }
}
