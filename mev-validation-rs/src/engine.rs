use crate::{block::CanonicalBlock, error::ExecutionError};
use alloy_primitives::{Address, U256};
use auto_impl::auto_impl;
use serde::{Deserialize, Serialize};

/// Execution-layer fork whose rules the engine applies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hardfork {
    Paris,
    Shanghai,
    #[default]
    Cancun,
    Prague,
}

/// Execution parameters active when a block is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    pub chain_id: u64,
    pub hardfork: Hardfork,
    /// Skip the base fee check when executing transactions.
    #[serde(default)]
    pub no_base_fee: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self { chain_id: 1, hardfork: Hardfork::default(), no_base_fee: false }
    }
}

/// The node component that replays a block against its parent state.
///
/// Implementations own chain state. Any state touched while replaying a block must be discarded
/// when the call returns.
#[auto_impl(&, Box, Arc)]
pub trait ExecutionEngine: Send + Sync {
    /// Returns the parameters the engine currently executes blocks with.
    fn vm_config(&self) -> VmConfig;

    /// Executes `block` on top of its parent and checks that
    /// - the resulting state and gas accounting match the header,
    /// - the gas limit is the one `registered_gas_limit` allows for after the parent's limit,
    /// - `fee_recipient` gained at least `expected_profit` wei.
    fn validate_payload(
        &self,
        block: &CanonicalBlock,
        fee_recipient: Address,
        expected_profit: U256,
        registered_gas_limit: u64,
        vm_config: &VmConfig,
    ) -> Result<(), ExecutionError>;
}
