//! Governance proposals carried in `EntityState.proposals`.

use crate::ids::{ProposalId, SignerId};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Passed,
    Rejected,
}

/// A governance proposal. §4.2's `vote` operation mutates `votes` and may
/// advance `status` on majority; majority is the same share-weighted
/// threshold rule consensus uses for quorum (I4), applied to `Yes` votes
/// against `config.threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: SignerId,
    pub title: String,
    pub action: Vec<u8>,
    pub votes: BTreeMap<SignerId, VoteChoice>,
    pub status: ProposalStatus,
}

impl Proposal {
    pub fn new(id: ProposalId, proposer: SignerId, title: String, action: Vec<u8>) -> Self {
        Proposal {
            id,
            proposer,
            title,
            action,
            votes: BTreeMap::new(),
            status: ProposalStatus::Pending,
        }
    }
}
