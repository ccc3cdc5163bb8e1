use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub use super::bellatrix::ExecutionPayload as BellatrixExecutionPayload;

/// Withdrawal object with numbers deserialized as decimals
#[serde_as]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Monotonically increasing identifier issued by consensus layer.
    #[serde_as(as = "DisplayFromStr")]
    pub index: u64,
    /// Index of validator associated with withdrawal.
    #[serde_as(as = "DisplayFromStr")]
    pub validator_index: u64,
    /// Target address for withdrawn ether.
    pub address: Address,
    /// Value of the withdrawal in gwei.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u64,
}

impl From<&Withdrawal> for alloy_eips::eip4895::Withdrawal {
    fn from(val: &Withdrawal) -> Self {
        Self {
            index: val.index,
            validator_index: val.validator_index,
            address: val.address,
            amount: val.amount,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    #[serde(flatten)]
    pub payload_inner: BellatrixExecutionPayload,
    pub withdrawals: Vec<Withdrawal>,
}
