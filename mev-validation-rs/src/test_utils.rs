//! Fixtures and a mock [`ExecutionEngine`] for exercising the validation pipeline.
use crate::{
    block::{canonicalize, CanonicalBlock},
    block_validation::{verify_gas_limit, verify_proposer_payment, PaymentOutcome},
    engine::{ExecutionEngine, VmConfig},
    error::ExecutionError,
    types::{bellatrix, capella, deneb, BidTrace, BuilderBlockValidationRequest, ExecutionPayload},
};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes, PrimitiveSignature, TxKind, B256, U256};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

pub const TEST_CHAIN_ID: u64 = 1;
pub const TEST_GAS_LIMIT: u64 = 30_000_000;
pub const TEST_BASE_FEE: u64 = 7;

pub fn test_parent_hash() -> B256 {
    B256::repeat_byte(0x11)
}

pub fn test_fee_recipient() -> Address {
    Address::repeat_byte(0xfe)
}

pub fn test_parent_beacon_block_root() -> B256 {
    B256::repeat_byte(0xbe)
}

/// Encodes a zero-tip EIP-1559 transfer with a placeholder signature.
pub fn test_transaction(nonce: u64, to: Address, value: U256) -> Bytes {
    let tx = TxEip1559 {
        chain_id: TEST_CHAIN_ID,
        nonce,
        gas_limit: 21_000,
        max_fee_per_gas: TEST_BASE_FEE as u128,
        max_priority_fee_per_gas: 0,
        to: TxKind::Call(to),
        value,
        ..Default::default()
    };
    let signature = PrimitiveSignature::new(U256::from(1), U256::from(1), false);
    let envelope = TxEnvelope::from(tx.into_signed(signature));
    envelope.encoded_2718().into()
}

/// Sets `block_hash` to the hash of the block `payload` describes.
pub fn seal(
    mut payload: ExecutionPayload,
    parent_beacon_block_root: Option<B256>,
) -> ExecutionPayload {
    let block_hash =
        canonicalize(&payload, parent_beacon_block_root).expect("well formed payload").hash();
    let inner = match &mut payload {
        ExecutionPayload::Bellatrix(inner) => inner,
        ExecutionPayload::Capella(payload) => &mut payload.payload_inner,
        ExecutionPayload::Deneb(payload) => &mut payload.payload_inner.payload_inner,
    };
    inner.block_hash = block_hash;
    payload
}

/// An empty bellatrix payload on top of [`test_parent_hash`] with a correct block hash.
pub fn test_payload() -> ExecutionPayload {
    let payload = ExecutionPayload::Bellatrix(bellatrix::ExecutionPayload {
        parent_hash: test_parent_hash(),
        fee_recipient: Address::repeat_byte(0x22),
        state_root: B256::repeat_byte(0x33),
        receipts_root: B256::repeat_byte(0x44),
        prev_randao: B256::repeat_byte(0x55),
        block_number: 1,
        gas_limit: TEST_GAS_LIMIT,
        timestamp: 1_700_000_000,
        base_fee_per_gas: U256::from(TEST_BASE_FEE),
        ..Default::default()
    });
    seal(payload, None)
}

/// A deneb payload with one blob's worth of blob gas, sealed under
/// [`test_parent_beacon_block_root`].
pub fn test_deneb_payload() -> ExecutionPayload {
    let payload = ExecutionPayload::Deneb(deneb::ExecutionPayload {
        payload_inner: capella::ExecutionPayload {
            payload_inner: test_payload().payload_inner().clone(),
            withdrawals: vec![],
        },
        blob_gas_used: 131_072,
        excess_blob_gas: 0,
    });
    seal(payload, Some(test_parent_beacon_block_root()))
}

/// A payload whose last transaction pays `value` to [`test_fee_recipient`].
pub fn test_payload_paying(value: U256) -> ExecutionPayload {
    let mut payload = test_payload();
    if let ExecutionPayload::Bellatrix(inner) = &mut payload {
        inner.transactions.push(test_transaction(0, test_fee_recipient(), value));
        inner.gas_used = 21_000;
    }
    seal(payload, None)
}

/// A request whose declared fields are taken from `payload`, carrying
/// [`test_parent_beacon_block_root`] for deneb payloads.
pub fn test_request(payload: ExecutionPayload, value: U256) -> BuilderBlockValidationRequest {
    let parent_beacon_block_root =
        matches!(payload, ExecutionPayload::Deneb(_)).then(test_parent_beacon_block_root);
    let message = BidTrace {
        slot: 42,
        parent_hash: *payload.parent_hash(),
        block_hash: *payload.block_hash(),
        proposer_fee_recipient: test_fee_recipient(),
        gas_limit: payload.gas_limit(),
        gas_used: payload.gas_used(),
        value,
        ..Default::default()
    };
    BuilderBlockValidationRequest {
        message,
        execution_payload: Some(payload),
        signature: Bytes::new(),
        registered_gas_limit: TEST_GAS_LIMIT,
        parent_beacon_block_root,
    }
}

/// Engine that knows a fixed set of parents and execution results.
#[derive(Debug, Default)]
pub struct MockEngine {
    vm_config: VmConfig,
    parent_gas_limits: HashMap<B256, u64>,
    outcomes: HashMap<B256, PaymentOutcome>,
    calls: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default().with_parent(test_parent_hash(), TEST_GAS_LIMIT)
    }

    pub fn with_parent(mut self, parent_hash: B256, gas_limit: u64) -> Self {
        self.parent_gas_limits.insert(parent_hash, gas_limit);
        self
    }

    pub fn with_outcome(mut self, block_hash: B256, outcome: PaymentOutcome) -> Self {
        self.outcomes.insert(block_hash, outcome);
        self
    }

    /// Number of times the engine was asked to validate a block.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExecutionEngine for MockEngine {
    fn vm_config(&self) -> VmConfig {
        self.vm_config.clone()
    }

    fn validate_payload(
        &self,
        block: &CanonicalBlock,
        fee_recipient: Address,
        expected_profit: U256,
        registered_gas_limit: u64,
        vm_config: &VmConfig,
    ) -> Result<(), ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let parent_hash = block.parent_hash();
        let parent_gas_limit = *self
            .parent_gas_limits
            .get(&parent_hash)
            .ok_or(ExecutionError::MissingParent(parent_hash))?;
        verify_gas_limit(registered_gas_limit, parent_gas_limit, block.gas_limit())?;

        let outcome = self.outcomes.get(&block.hash()).ok_or_else(|| {
            ExecutionError::StateTransition(format!("no execution result for {:?}", block.hash()))
        })?;
        verify_proposer_payment(block, fee_recipient, expected_profit, outcome, vm_config)
    }
}
