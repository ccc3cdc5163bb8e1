use crate::block::PayloadError;
use alloy_primitives::{B256, U256};
use std::fmt;
use thiserror::Error;

/// Field of a [`crate::types::BidTrace`] checked against the canonical block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ParentHash,
    BlockHash,
    GasLimit,
    GasUsed,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ParentHash => "ParentHash",
            Self::BlockHash => "BlockHash",
            Self::GasLimit => "GasLimit",
            Self::GasUsed => "GasUsed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Hash(B256),
    Gas(u64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(hash) => write!(f, "{hash:?}"),
            Self::Gas(gas) => write!(f, "{gas}"),
        }
    }
}

impl From<B256> for FieldValue {
    fn from(hash: B256) -> Self {
        Self::Hash(hash)
    }
}

impl From<u64> for FieldValue {
    fn from(gas: u64) -> Self {
        Self::Gas(gas)
    }
}

/// Verdict returned by an [`crate::ExecutionEngine`] that rejects a block.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("could not find parent block {0:?}")]
    MissingParent(B256),
    #[error("incorrect gas limit set, expected: {expected}, got: {actual}")]
    GasLimit { expected: u64, actual: u64 },
    #[error("could not verify proposer payment of {expected} wei")]
    ProposerPayment { expected: U256 },
    #[error("invalid state transition: {0}")]
    StateTransition(String),
    #[error("internal engine error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("nil execution payload")]
    MissingPayload,
    #[error("malformed execution payload: {0}")]
    MalformedPayload(#[from] PayloadError),
    #[error("incorrect {field} {declared}, expected {actual}")]
    FieldMismatch { field: Field, declared: FieldValue, actual: FieldValue },
    #[error("invalid payload: {0}")]
    ExecutionInvalid(#[from] ExecutionError),
}

impl ValidationError {
    pub(crate) fn mismatch(
        field: Field,
        declared: impl Into<FieldValue>,
        actual: impl Into<FieldValue>,
    ) -> Self {
        Self::FieldMismatch { field, declared: declared.into(), actual: actual.into() }
    }

    /// The field whose declared value disagreed with the block, if that is why validation failed.
    pub fn mismatched_field(&self) -> Option<Field> {
        match self {
            Self::FieldMismatch { field, .. } => Some(*field),
            _ => None,
        }
    }
}
