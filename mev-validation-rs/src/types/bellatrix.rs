use alloy_primitives::{Address, Bloom, Bytes, B256, U256};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// Structure to deserialize execution payloads sent according to the builder api spec
/// Numeric fields deserialized as decimals (unlike the engine api `ExecutionPayload`)
#[serde_as]
#[derive(Derivative)]
#[derivative(Debug)]
#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    pub parent_hash: B256,
    pub fee_recipient: Address,
    pub state_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub prev_randao: B256,
    #[serde_as(as = "DisplayFromStr")]
    pub block_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_used: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub timestamp: u64,
    pub extra_data: Bytes,
    #[serde_as(as = "DisplayFromStr")]
    pub base_fee_per_gas: U256,
    pub block_hash: B256,
    #[derivative(Debug = "ignore")]
    pub transactions: Vec<Bytes>,
}
