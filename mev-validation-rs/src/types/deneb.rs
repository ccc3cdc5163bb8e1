use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub use super::capella::{ExecutionPayload as CapellaExecutionPayload, Withdrawal};

#[serde_as]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    #[serde(flatten)]
    pub payload_inner: CapellaExecutionPayload,
    #[serde_as(as = "DisplayFromStr")]
    pub blob_gas_used: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub excess_blob_gas: u64,
}
