//! The persisted unit of kernel state (§4.5): `{height, timestamp,
//! replicas, serverInput, serverOutputs, description}`, canonically
//! encoded and written through a `SnapshotStore`.

use crate::ServerTx;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xln_types::codec::{from_bytes_canonical, to_bytes_canonical};
use xln_types::error::StateError;
use xln_types::{EntityId, Replica, SignerId};

/// Because `Replica` does not derive `Encode`/`Decode` itself (it carries
/// `bool`/transient consensus scratch fields alongside `EntityState`),
/// snapshots store the wire-encodable parts explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ReplicaSnapshot {
    pub state: xln_types::EntityState,
    pub mempool: Vec<xln_types::EntityTx>,
    pub proposal: Option<xln_types::ProposedFrame>,
    pub locked_frame: Option<xln_types::ProposedFrame>,
    pub is_proposer: bool,
}

impl From<&Replica> for ReplicaSnapshot {
    fn from(r: &Replica) -> Self {
        ReplicaSnapshot {
            state: r.state.clone(),
            mempool: r.mempool.clone(),
            proposal: r.proposal.clone(),
            locked_frame: r.locked_frame.clone(),
            is_proposer: r.is_proposer,
        }
    }
}

impl From<ReplicaSnapshot> for Replica {
    fn from(s: ReplicaSnapshot) -> Self {
        Replica {
            state: s.state,
            mempool: s.mempool,
            proposal: s.proposal,
            locked_frame: s.locked_frame,
            is_proposer: s.is_proposer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Snapshot {
    pub height: u64,
    pub timestamp: u64,
    pub replicas: BTreeMap<(EntityId, SignerId), ReplicaSnapshot>,
    pub server_input: Vec<ServerTx>,
    pub server_outputs: Vec<String>,
    pub description: String,
}

impl Snapshot {
    pub fn encode_canonical(&self) -> Vec<u8> {
        to_bytes_canonical(self)
    }

    pub fn decode_canonical(bytes: &[u8]) -> Result<Self, StateError> {
        from_bytes_canonical(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_types::{ConsensusMode, EntityConfig, EntityState};

    fn sample_snapshot() -> Snapshot {
        let config = EntityConfig {
            mode: ConsensusMode::ProposerBased,
            validators: vec![SignerId::new("s1")],
            threshold: 1,
            shares: BTreeMap::from([(SignerId::new("s1"), 1)]),
            jurisdiction: xln_types::JurisdictionId::new("test"),
        };
        let state = EntityState::genesis(config);
        let replica = ReplicaSnapshot {
            state,
            mempool: vec![],
            proposal: None,
            locked_frame: None,
            is_proposer: true,
        };
        let mut replicas = BTreeMap::new();
        replicas.insert((EntityId::from_bytes([1u8; 32]), SignerId::new("s1")), replica);
        Snapshot {
            height: 1,
            timestamp: 1000,
            replicas,
            server_input: vec![],
            server_outputs: vec![],
            description: "test".to_string(),
        }
    }

    #[test]
    fn round_trips_through_canonical_codec() {
        let snapshot = sample_snapshot();
        let encoded = snapshot.encode_canonical();
        let decoded = Snapshot::decode_canonical(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn rejects_truncated_snapshot_bytes() {
        let snapshot = sample_snapshot();
        let mut encoded = snapshot.encode_canonical();
        encoded.truncate(encoded.len() / 2);
        assert!(Snapshot::decode_canonical(&encoded).is_err());
    }
}
