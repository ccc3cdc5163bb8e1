//! Rules an [`crate::ExecutionEngine`] applies once a block has been executed.
use crate::{block::CanonicalBlock, engine::VmConfig, error::ExecutionError};
use alloy_consensus::Transaction;
use alloy_primitives::{Address, U256};
use std::cmp::Ordering;

pub const GAS_BOUND_DIVISOR: u64 = 1024;

const GWEI_TO_WEI: u64 = 1_000_000_000;

/// Returns the gas limit closest to `preferred_gas_limit` that a child of a block with
/// `parent_gas_limit` may use.
///
/// A child may differ from its parent by strictly less than `parent_gas_limit / 1024`, so parents
/// below 1024 gas pin their children to the same limit.
pub fn compute_preferred_gas_limit(preferred_gas_limit: u64, parent_gas_limit: u64) -> u64 {
    let max_delta = (parent_gas_limit / GAS_BOUND_DIVISOR).saturating_sub(1);
    match preferred_gas_limit.cmp(&parent_gas_limit) {
        Ordering::Equal => preferred_gas_limit,
        Ordering::Greater => preferred_gas_limit.min(parent_gas_limit.saturating_add(max_delta)),
        Ordering::Less => preferred_gas_limit.max(parent_gas_limit - max_delta),
    }
}

/// Checks that `gas_limit` moves from `parent_gas_limit` as far towards the proposer's
/// `registered_gas_limit` as one block allows.
pub fn verify_gas_limit(
    registered_gas_limit: u64,
    parent_gas_limit: u64,
    gas_limit: u64,
) -> Result<(), ExecutionError> {
    let expected = compute_preferred_gas_limit(registered_gas_limit, parent_gas_limit);
    if gas_limit != expected {
        return Err(ExecutionError::GasLimit { expected, actual: gas_limit })
    }
    Ok(())
}

/// Balances of the proposer's fee recipient around the execution of a block, with the status of
/// the block's last transaction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub balance_before: U256,
    pub balance_after: U256,
    pub last_transaction_succeeded: bool,
}

/// Ensures that `fee_recipient` received `expected` wei from `block`.
///
/// The balance change is checked first, with withdrawals to the fee recipient excluded.
/// Otherwise the last transaction must be a plain transfer of exactly `expected` wei to the fee
/// recipient that pays no priority fee.
pub fn verify_proposer_payment(
    block: &CanonicalBlock,
    fee_recipient: Address,
    expected: U256,
    outcome: &PaymentOutcome,
    vm_config: &VmConfig,
) -> Result<(), ExecutionError> {
    let mut balance_before = outcome.balance_before;
    if let Some(withdrawals) = block.withdrawals() {
        for withdrawal in withdrawals.iter().filter(|w| w.address == fee_recipient) {
            let amount = U256::from(withdrawal.amount).saturating_mul(U256::from(GWEI_TO_WEI));
            balance_before = balance_before.saturating_add(amount);
        }
    }

    if outcome.balance_after >= balance_before.saturating_add(expected) {
        return Ok(())
    }

    let err = || ExecutionError::ProposerPayment { expected };

    let tx = block.transactions().last().ok_or_else(err)?;

    if !outcome.last_transaction_succeeded {
        return Err(err())
    }

    if tx.chain_id() != Some(vm_config.chain_id) {
        return Err(err())
    }

    if tx.to() != Some(fee_recipient) {
        return Err(err())
    }

    if tx.value() != expected {
        return Err(err())
    }

    if !tx.input().is_empty() {
        return Err(err())
    }

    if let Some(base_fee) = block.base_fee_per_gas() {
        if tx.effective_tip_per_gas(base_fee).unwrap_or_default() != 0 {
            return Err(err())
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        block::canonicalize,
        test_utils::{seal, test_payload, test_transaction, TEST_CHAIN_ID},
        types::{capella, ExecutionPayload},
    };

    fn verify_limits(gas_limit: u64, parent_gas_limit: u64) -> bool {
        match gas_limit.cmp(&parent_gas_limit) {
            Ordering::Equal => true,
            Ordering::Greater => {
                let bound = parent_gas_limit + parent_gas_limit / GAS_BOUND_DIVISOR;
                gas_limit < bound
            }
            Ordering::Less => {
                let bound = parent_gas_limit - parent_gas_limit / GAS_BOUND_DIVISOR;
                gas_limit > bound
            }
        }
    }

    #[test]
    fn test_compute_preferred_gas_limit() {
        for t in &[
            // preferred, parent, computed
            (30_000_000, 30_000_000, 30_000_000),
            (30_029_000, 30_000_000, 30_029_000),
            (30_029_300, 30_000_000, 30_029_295),
            (29_970_710, 30_000_000, 29_970_710),
            (29_970_700, 30_000_000, 29_970_705),
            (36_000_000, 30_000_000, 30_029_295),
        ] {
            assert_eq!(compute_preferred_gas_limit(t.0, t.1), t.2);
            assert!(verify_limits(t.2, t.1))
        }
    }

    #[test]
    fn test_compute_preferred_gas_limit_small_parent() {
        for t in &[
            // preferred, parent, computed
            (30_000_000, 0, 0),
            (2_000, 1_000, 1_000),
            (10, 1_000, 1_000),
            (0, 1_000, 1_000),
            (5_000, 1_024, 1_024),
            (5_000, 2_048, 2_049),
            (1, 3_072, 3_070),
            (u64::MAX, u64::MAX - 1, u64::MAX),
        ] {
            assert_eq!(compute_preferred_gas_limit(t.0, t.1), t.2, "{t:?}");
        }
        assert!(verify_gas_limit(30_000_000, 0, 0).is_ok());
    }

    #[test]
    fn test_verify_gas_limit() {
        assert!(verify_gas_limit(30_000_000, 30_000_000, 30_000_000).is_ok());
        assert!(verify_gas_limit(36_000_000, 30_000_000, 30_029_295).is_ok());
        match verify_gas_limit(36_000_000, 30_000_000, 30_000_000) {
            Err(ExecutionError::GasLimit { expected, actual }) => {
                assert_eq!(expected, 30_029_295);
                assert_eq!(actual, 30_000_000);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    fn block_paying(recipient: Address, value: U256) -> CanonicalBlock {
        let mut payload = test_payload();
        if let ExecutionPayload::Bellatrix(inner) = &mut payload {
            inner.transactions.push(test_transaction(0, Address::repeat_byte(0x01), U256::from(1)));
            inner.transactions.push(test_transaction(1, recipient, value));
        }
        canonicalize(&seal(payload, None), None).unwrap()
    }

    fn vm_config() -> VmConfig {
        VmConfig { chain_id: TEST_CHAIN_ID, ..Default::default() }
    }

    #[test]
    fn test_payment_from_balance_change() {
        let fee_recipient = Address::repeat_byte(0xfe);
        let block = canonicalize(&test_payload(), None).unwrap();
        let outcome = PaymentOutcome {
            balance_before: U256::from(10),
            balance_after: U256::from(110),
            last_transaction_succeeded: false,
        };
        let config = vm_config();
        let expected = U256::from(100);
        let result = verify_proposer_payment(&block, fee_recipient, expected, &outcome, &config);
        assert!(result.is_ok());
        let expected = U256::from(101);
        let result = verify_proposer_payment(&block, fee_recipient, expected, &outcome, &config);
        assert!(matches!(result, Err(ExecutionError::ProposerPayment { .. })));
    }

    #[test]
    fn test_withdrawals_do_not_count_as_payment() {
        let fee_recipient = Address::repeat_byte(0xfe);
        let payload = ExecutionPayload::Capella(capella::ExecutionPayload {
            payload_inner: test_payload().payload_inner().clone(),
            withdrawals: vec![capella::Withdrawal {
                index: 0,
                validator_index: 0,
                address: fee_recipient,
                amount: 1,
            }],
        });
        let payload = seal(payload, None);
        let block = canonicalize(&payload, None).unwrap();
        let outcome = PaymentOutcome {
            balance_before: U256::ZERO,
            balance_after: U256::from(GWEI_TO_WEI),
            last_transaction_succeeded: true,
        };
        let result =
            verify_proposer_payment(&block, fee_recipient, U256::from(1), &outcome, &vm_config());
        assert!(matches!(result, Err(ExecutionError::ProposerPayment { .. })));
    }

    #[test]
    fn test_payment_from_last_transaction() {
        let fee_recipient = Address::repeat_byte(0xfe);
        let value = U256::from(1_000);
        let block = block_paying(fee_recipient, value);
        let mut outcome = PaymentOutcome { last_transaction_succeeded: true, ..Default::default() };
        let config = vm_config();

        assert!(verify_proposer_payment(&block, fee_recipient, value, &outcome, &config).is_ok());

        // the transfer must carry the exact amount
        let more = value + U256::from(1);
        assert!(verify_proposer_payment(&block, fee_recipient, more, &outcome, &config).is_err());

        // and go to the fee recipient
        let other = Address::repeat_byte(0x01);
        assert!(verify_proposer_payment(&block, other, value, &outcome, &config).is_err());

        // on the configured chain
        let other_chain = VmConfig { chain_id: TEST_CHAIN_ID + 1, ..Default::default() };
        let result = verify_proposer_payment(&block, fee_recipient, value, &outcome, &other_chain);
        assert!(result.is_err());

        outcome.last_transaction_succeeded = false;
        assert!(verify_proposer_payment(&block, fee_recipient, value, &outcome, &config).is_err());
    }

    #[test]
    fn test_empty_block_cannot_pay_by_transaction() {
        let block = canonicalize(&test_payload(), None).unwrap();
        let outcome = PaymentOutcome { last_transaction_succeeded: true, ..Default::default() };
        let result =
            verify_proposer_payment(&block, Address::ZERO, U256::from(1), &outcome, &vm_config());
        assert!(matches!(result, Err(ExecutionError::ProposerPayment { .. })));
    }
}
