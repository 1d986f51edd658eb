//! The canonical, deterministic binary codec for all consensus-critical
//! and persisted state (SPEC_FULL.md §3, "Ambient addition — canonical
//! codec").
//!
//! Every type reachable from `EntityState`, `ProposedFrame`, or a
//! `Snapshot` derives `parity_scale_codec::{Encode, Decode}` (SCALE), which
//! is deterministic by construction and carries no insertion-order
//! ambiguity once sorted/ordered collections are used consistently
//! (`BTreeMap`/`BTreeSet`/`OrderedMap`). Centralizing the (de)serialization
//! entry points here means every component — entity, consensus, channel,
//! runtime, storage — encodes the same bytes for the same value.

use crate::error::StateError;
use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical byte representation.
///
/// Use this for anything written to consensus-critical state, hashed for
/// a frame's `hash` field, or persisted to the snapshot store.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Vec<u8> {
    v.encode()
}

/// Decodes a value from its canonical byte representation, failing fast
/// (rather than silently accepting a short prefix match) on malformed data.
pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, StateError> {
    T::decode_all(&mut &*b).map_err(|e| StateError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[derive(Encode, Decode, Debug, PartialEq, Eq)]
    struct Fixture {
        id: u32,
        name: String,
        tags: Vec<u8>,
    }

    #[test]
    fn roundtrips_struct_and_set() {
        let original = Fixture {
            id: 42,
            name: "fixture".to_string(),
            tags: vec![1, 2, 3],
        };
        let encoded = to_bytes_canonical(&original);
        assert!(!encoded.is_empty());
        assert_eq!(from_bytes_canonical::<Fixture>(&encoded).unwrap(), original);

        let mut set = BTreeSet::new();
        set.insert([1u8; 32]);
        set.insert([2u8; 32]);
        let encoded_set = to_bytes_canonical(&set);
        assert_eq!(
            from_bytes_canonical::<BTreeSet<[u8; 32]>>(&encoded_set).unwrap(),
            set
        );
    }

    #[test]
    fn rejects_truncated_input() {
        let original = Fixture {
            id: 99,
            name: "another".to_string(),
            tags: vec![10, 20, 30],
        };
        let mut encoded = to_bytes_canonical(&original);
        encoded.pop();
        encoded.pop();
        assert!(from_bytes_canonical::<Fixture>(&encoded).is_err());
    }
}
