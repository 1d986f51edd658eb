//! The error taxonomy (§7) shared across the entity replication layer.
//!
//! Every variant implements `ErrorCode`, returning a stable,
//! machine-readable identifier — the same pattern the reference kernel's
//! `ioi-types::error` module uses to tag each `thiserror` variant for
//! downstream log filtering and metrics labeling.

use crate::ids::SignerId;
use thiserror::Error;

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

/// Malformed input: missing ids, wrong shapes, out-of-bounds counts,
/// unknown transaction type, negative heights (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("unknown transaction type: {0}")]
    UnknownTxType(String),
    #[error("mempool would exceed cap of {cap}, has {len}")]
    MempoolCapExceeded { cap: usize, len: usize },
    #[error("input carries {got} transactions, exceeding the per-input bound of {bound}")]
    TooManyTxs { got: usize, bound: usize },
    #[error("input carries {got} precommits, exceeding the per-input bound of {bound}")]
    TooManyPrecommits { got: usize, bound: usize },
    #[error("negative height")]
    NegativeHeight,
    #[error("input addressed an unknown replica")]
    UnknownReplica,
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "VALIDATION_MISSING_FIELD",
            Self::UnknownTxType(_) => "VALIDATION_UNKNOWN_TX_TYPE",
            Self::MempoolCapExceeded { .. } => "VALIDATION_MEMPOOL_CAP_EXCEEDED",
            Self::TooManyTxs { .. } => "VALIDATION_TOO_MANY_TXS",
            Self::TooManyPrecommits { .. } => "VALIDATION_TOO_MANY_PRECOMMITS",
            Self::NegativeHeight => "VALIDATION_NEGATIVE_HEIGHT",
            Self::UnknownReplica => "VALIDATION_UNKNOWN_REPLICA",
        }
    }
}

/// Same signer, same frame hash, conflicting signature; or a precommit
/// referencing an unknown proposal (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ByzantineFault {
    #[error("signer {signer} double-signed at height {height}: existing signature differs")]
    Equivocation { signer: SignerId, height: u64 },
    #[error("precommit references an unknown proposal at height {height}")]
    UnknownProposal { height: u64 },
}

impl ErrorCode for ByzantineFault {
    fn code(&self) -> &'static str {
        match self {
            Self::Equivocation { .. } => "BYZANTINE_EQUIVOCATION",
            Self::UnknownProposal { .. } => "BYZANTINE_UNKNOWN_PROPOSAL",
        }
    }
}

/// A proposal's timestamp fell outside the acceptance drift window (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemporalFault {
    #[error("proposal timestamp {proposed} is outside the {drift_ms}ms drift window of local time {local}")]
    DriftExceeded {
        proposed: u64,
        local: u64,
        drift_ms: u64,
    },
}

impl ErrorCode for TemporalFault {
    fn code(&self) -> &'static str {
        match self {
            Self::DriftExceeded { .. } => "TEMPORAL_DRIFT_EXCEEDED",
        }
    }
}

/// Voting-power sum exceeded a platform-safe threshold (§7); signals
/// misconfiguration, since power is computed with arbitrary-precision
/// arithmetic and should never overflow in a correctly configured entity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverflowFault {
    #[error("voting power sum {power} exceeds the platform-safe threshold {limit}")]
    PowerSumOverflow { power: u128, limit: u128 },
}

impl ErrorCode for OverflowFault {
    fn code(&self) -> &'static str {
        match self {
            Self::PowerSumOverflow { .. } => "OVERFLOW_POWER_SUM",
        }
    }
}

/// Anchor-chain unreachable, snapshot write error; recovered by retry on
/// the next tick (§7).
#[derive(Debug, Error)]
pub enum TransientIoFault {
    #[error("anchor chain unreachable: {0}")]
    AnchorUnreachable(String),
    #[error("snapshot write failed: {0}")]
    SnapshotWrite(String),
}

impl ErrorCode for TransientIoFault {
    fn code(&self) -> &'static str {
        match self {
            Self::AnchorUnreachable(_) => "TRANSIENT_ANCHOR_UNREACHABLE",
            Self::SnapshotWrite(_) => "TRANSIENT_SNAPSHOT_WRITE",
        }
    }
}

/// `processUntilEmpty` hit its iteration bound with outputs remaining
/// (§7); fatal for the tick, surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusLivelockFault {
    #[error("processUntilEmpty exceeded {bound} iterations with outputs remaining")]
    IterationBoundExceeded { bound: usize },
}

impl ErrorCode for ConsensusLivelockFault {
    fn code(&self) -> &'static str {
        match self {
            Self::IterationBoundExceeded { .. } => "CONSENSUS_LIVELOCK",
        }
    }
}

/// Errors surfaced by the snapshot persistence layer (ambient addition,
/// SPEC_FULL.md §4.5).
#[derive(Debug, Error)]
pub enum StateError {
    #[error("key not found in snapshot store")]
    KeyNotFound,
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "STATE_KEY_NOT_FOUND",
            Self::Decode(_) => "STATE_DECODE_ERROR",
            Self::Encode(_) => "STATE_ENCODE_ERROR",
            Self::Backend(_) => "STATE_BACKEND_ERROR",
        }
    }
}
