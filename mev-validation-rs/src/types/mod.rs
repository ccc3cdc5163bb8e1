pub mod bellatrix;
pub mod capella;
pub mod deneb;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::fmt;

#[serde_as]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidTrace {
    #[serde_as(as = "DisplayFromStr")]
    pub slot: u64,
    pub parent_hash: B256,
    pub block_hash: B256,
    pub builder_pubkey: Bytes,
    pub proposer_pubkey: Bytes,
    pub proposer_fee_recipient: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_used: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub value: U256,
}

/// A builder submission together with the gas limit the proposer registered for the slot.
///
/// The `signature` is carried for wire compatibility only; it is not verified here.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderBlockValidationRequest {
    pub message: BidTrace,
    #[serde(default)]
    pub execution_payload: Option<ExecutionPayload>,
    #[serde(default)]
    pub signature: Bytes,
    #[serde_as(as = "DisplayFromStr")]
    pub registered_gas_limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<B256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fork {
    Bellatrix,
    Capella,
    Deneb,
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bellatrix => "bellatrix",
            Self::Capella => "capella",
            Self::Deneb => "deneb",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExecutionPayload {
    Bellatrix(bellatrix::ExecutionPayload),
    Capella(capella::ExecutionPayload),
    Deneb(deneb::ExecutionPayload),
}

impl<'de> serde::Deserialize<'de> for ExecutionPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if let Ok(inner) = <_ as serde::Deserialize>::deserialize(&value) {
            return Ok(Self::Deneb(inner))
        }
        if let Ok(inner) = <_ as serde::Deserialize>::deserialize(&value) {
            return Ok(Self::Capella(inner))
        }
        if let Ok(inner) = <_ as serde::Deserialize>::deserialize(&value) {
            return Ok(Self::Bellatrix(inner))
        }
        Err(serde::de::Error::custom("no variant could be deserialized from input"))
    }
}

impl ExecutionPayload {
    pub fn version(&self) -> Fork {
        match self {
            Self::Bellatrix(..) => Fork::Bellatrix,
            Self::Capella(..) => Fork::Capella,
            Self::Deneb(..) => Fork::Deneb,
        }
    }

    /// Fields common to every payload version.
    pub fn payload_inner(&self) -> &bellatrix::ExecutionPayload {
        match self {
            Self::Bellatrix(payload) => payload,
            Self::Capella(payload) => &payload.payload_inner,
            Self::Deneb(payload) => &payload.payload_inner.payload_inner,
        }
    }

    pub fn withdrawals(&self) -> Option<&[capella::Withdrawal]> {
        match self {
            Self::Bellatrix(..) => None,
            Self::Capella(payload) => Some(&payload.withdrawals),
            Self::Deneb(payload) => Some(&payload.payload_inner.withdrawals),
        }
    }

    pub fn parent_hash(&self) -> &B256 {
        &self.payload_inner().parent_hash
    }

    pub fn block_hash(&self) -> &B256 {
        &self.payload_inner().block_hash
    }

    pub fn block_number(&self) -> u64 {
        self.payload_inner().block_number
    }

    pub fn gas_limit(&self) -> u64 {
        self.payload_inner().gas_limit
    }

    pub fn gas_used(&self) -> u64 {
        self.payload_inner().gas_used
    }
}
