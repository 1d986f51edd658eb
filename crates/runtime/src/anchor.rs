//! Anchor-event ingestion (§4.5): turn one indexed `AnchorEvent` into a
//! `j_event` entity transaction and enqueue it for every *proposer*
//! replica of every entity the event touches.

use xln_types::{AnchorEvent, EntityId, EntityInput, EntityTx, SignerId};

/// Builds the `EntityInput`s that deliver `event` to the proposer
/// replica(s) of every entity it touches (`primary_entity`/
/// `secondary_entity`; `SettlementProcessed`/`ReserveTransferred` touch
/// two). `proposer_of` resolves an entity's current proposer signer, or
/// `None` if the entity has no known replica yet (the event is dropped
/// for that side, logged by the caller).
pub fn build_j_event_inputs(
    block_number: u64,
    transaction_hash: [u8; 32],
    event_index: u32,
    event: AnchorEvent,
    proposer_of: impl Fn(EntityId) -> Option<SignerId>,
) -> Vec<EntityInput> {
    let mut targets = Vec::new();
    if let Some(entity_id) = event.primary_entity() {
        targets.push(entity_id);
    }
    if let Some(entity_id) = event.secondary_entity() {
        targets.push(entity_id);
    }

    targets
        .into_iter()
        .filter_map(|entity_id| {
            let signer_id = proposer_of(entity_id)?;
            let tx = EntityTx::JEvent {
                block_number,
                transaction_hash,
                event_index,
                event: event.clone(),
            };
            Some(EntityInput::mempool_push(entity_id, signer_id, vec![tx]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entity(byte: u8) -> EntityId {
        EntityId::from_bytes([byte; 32])
    }

    #[test]
    fn reserve_updated_targets_only_the_named_entity() {
        let event = AnchorEvent::ReserveUpdated {
            entity: entity(1),
            token_id: xln_types::TokenId(1),
            new_balance: 10,
        };
        let proposers: BTreeMap<EntityId, SignerId> =
            BTreeMap::from([(entity(1), SignerId::new("s1"))]);
        let inputs = build_j_event_inputs(1, [0u8; 32], 0, event, |id| proposers.get(&id).cloned());
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].entity_id, entity(1));
    }

    #[test]
    fn settlement_processed_targets_both_entities() {
        let event = AnchorEvent::SettlementProcessed {
            left_entity: entity(1),
            right_entity: entity(2),
            token_id: xln_types::TokenId(1),
            left_reserve: 10,
            right_reserve: 20,
            collateral: 100,
            ondelta: 0,
        };
        let proposers: BTreeMap<EntityId, SignerId> = BTreeMap::from([
            (entity(1), SignerId::new("s1")),
            (entity(2), SignerId::new("s2")),
        ]);
        let inputs = build_j_event_inputs(1, [0u8; 32], 0, event, |id| proposers.get(&id).cloned());
        assert_eq!(inputs.len(), 2);
    }

    #[test]
    fn unknown_entity_is_dropped_not_panicked() {
        let event = AnchorEvent::ReserveUpdated {
            entity: entity(9),
            token_id: xln_types::TokenId(1),
            new_balance: 10,
        };
        let inputs = build_j_event_inputs(1, [0u8; 32], 0, event, |_| None);
        assert!(inputs.is_empty());
    }
}
