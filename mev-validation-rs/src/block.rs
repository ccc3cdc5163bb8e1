use crate::types::ExecutionPayload;
use alloy_consensus::{proofs, Header, TxEnvelope, EMPTY_OMMER_ROOT_HASH};
use alloy_eips::{
    eip2718::{Decodable2718, Eip2718Error},
    eip4895::Withdrawal,
};
use alloy_primitives::{Address, B256, B64, U256};
use thiserror::Error;

/// Upper bound on the `extra_data` header field.
pub const MAXIMUM_EXTRA_DATA_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid extradata length: {0}")]
    ExtraData(usize),
    #[error("base fee {0} does not fit in 64 bits")]
    BaseFee(U256),
    #[error("empty transaction at index {0}")]
    EmptyTransaction(usize),
    #[error("invalid transaction at index {index}: {source}")]
    Transaction {
        index: usize,
        #[source]
        source: Eip2718Error,
    },
    #[error("transaction at index {0} has trailing bytes")]
    TrailingBytes(usize),
    #[error("missing parent beacon block root for deneb payload")]
    MissingParentBeaconBlockRoot,
}

/// An execution block reconstructed from a builder's [`ExecutionPayload`].
///
/// The hash is computed from the reconstructed header and never taken from the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalBlock {
    header: Header,
    hash: B256,
    transactions: Vec<TxEnvelope>,
    withdrawals: Option<Vec<Withdrawal>>,
}

impl CanonicalBlock {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn parent_hash(&self) -> B256 {
        self.header.parent_hash
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn gas_limit(&self) -> u64 {
        self.header.gas_limit
    }

    pub fn gas_used(&self) -> u64 {
        self.header.gas_used
    }

    pub fn beneficiary(&self) -> Address {
        self.header.beneficiary
    }

    pub fn base_fee_per_gas(&self) -> Option<u64> {
        self.header.base_fee_per_gas
    }

    pub fn transactions(&self) -> &[TxEnvelope] {
        &self.transactions
    }

    pub fn withdrawals(&self) -> Option<&[Withdrawal]> {
        self.withdrawals.as_deref()
    }
}

/// Converts `payload` into a [`CanonicalBlock`].
///
/// The `block_hash` carried by the payload is ignored; callers compare it against
/// [`CanonicalBlock::hash`]. `parent_beacon_block_root` is only consulted for deneb payloads.
pub fn canonicalize(
    payload: &ExecutionPayload,
    parent_beacon_block_root: Option<B256>,
) -> Result<CanonicalBlock, PayloadError> {
    let inner = payload.payload_inner();

    if inner.extra_data.len() > MAXIMUM_EXTRA_DATA_SIZE {
        return Err(PayloadError::ExtraData(inner.extra_data.len()))
    }

    let base_fee_per_gas = u64::try_from(inner.base_fee_per_gas)
        .map_err(|_| PayloadError::BaseFee(inner.base_fee_per_gas))?;

    let transactions = inner
        .transactions
        .iter()
        .enumerate()
        .map(|(index, raw)| decode_transaction(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let withdrawals = payload
        .withdrawals()
        .map(|withdrawals| withdrawals.iter().map(Withdrawal::from).collect::<Vec<_>>());

    let mut header = Header {
        parent_hash: inner.parent_hash,
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        beneficiary: inner.fee_recipient,
        state_root: inner.state_root,
        transactions_root: proofs::calculate_transaction_root(&transactions),
        receipts_root: inner.receipts_root,
        logs_bloom: inner.logs_bloom,
        difficulty: U256::ZERO,
        number: inner.block_number,
        gas_limit: inner.gas_limit,
        gas_used: inner.gas_used,
        timestamp: inner.timestamp,
        extra_data: inner.extra_data.clone(),
        mix_hash: inner.prev_randao,
        nonce: B64::ZERO,
        base_fee_per_gas: Some(base_fee_per_gas),
        withdrawals_root: withdrawals.as_deref().map(proofs::calculate_withdrawals_root),
        ..Default::default()
    };

    if let ExecutionPayload::Deneb(payload) = payload {
        let parent_beacon_block_root =
            parent_beacon_block_root.ok_or(PayloadError::MissingParentBeaconBlockRoot)?;
        header.blob_gas_used = Some(payload.blob_gas_used);
        header.excess_blob_gas = Some(payload.excess_blob_gas);
        header.parent_beacon_block_root = Some(parent_beacon_block_root);
    }

    let hash = header.hash_slow();
    Ok(CanonicalBlock { header, hash, transactions, withdrawals })
}

fn decode_transaction(index: usize, raw: &[u8]) -> Result<TxEnvelope, PayloadError> {
    if raw.is_empty() {
        return Err(PayloadError::EmptyTransaction(index))
    }
    let mut buf = raw;
    let transaction = TxEnvelope::decode_2718(&mut buf)
        .map_err(|source| PayloadError::Transaction { index, source })?;
    if !buf.is_empty() {
        return Err(PayloadError::TrailingBytes(index))
    }
    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{
            seal, test_deneb_payload, test_parent_beacon_block_root, test_payload,
            test_transaction,
        },
        types::capella,
    };
    use alloy_consensus::Transaction;
    use alloy_primitives::Bytes;

    fn with_transaction(raw: Bytes) -> ExecutionPayload {
        let mut payload = test_payload();
        if let ExecutionPayload::Bellatrix(inner) = &mut payload {
            inner.transactions.push(raw);
        }
        payload
    }

    #[test]
    fn test_canonicalize_is_deterministic() {
        let recipient = Address::repeat_byte(0xaa);
        let payload = seal(with_transaction(test_transaction(0, recipient, U256::from(5))), None);

        let block = canonicalize(&payload, None).unwrap();
        let again = canonicalize(&payload, None).unwrap();
        assert_eq!(block, again);
        assert_eq!(block.hash(), *payload.block_hash());
        assert_eq!(block.transactions().len(), 1);
        assert_eq!(block.transactions()[0].to(), Some(recipient));
        assert_eq!(block.header().ommers_hash, EMPTY_OMMER_ROOT_HASH);
        assert!(block.withdrawals().is_none());
    }

    #[test]
    fn test_header_mirrors_payload() {
        let payload = test_payload();
        let inner = payload.payload_inner();
        let block = canonicalize(&payload, None).unwrap();
        assert_eq!(block.parent_hash(), inner.parent_hash);
        assert_eq!(block.beneficiary(), inner.fee_recipient);
        assert_eq!(block.number(), inner.block_number);
        assert_eq!(block.gas_limit(), inner.gas_limit);
        assert_eq!(block.gas_used(), inner.gas_used);
        assert_eq!(block.header().mix_hash, inner.prev_randao);
        assert_eq!(block.header().difficulty, U256::ZERO);
        assert_eq!(block.base_fee_per_gas(), Some(7));
        assert_eq!(block.header().withdrawals_root, None);
    }

    #[test]
    fn test_hash_ignores_payload_block_hash() {
        let mut payload = test_payload();
        let computed = *payload.block_hash();
        if let ExecutionPayload::Bellatrix(inner) = &mut payload {
            inner.block_hash = B256::repeat_byte(0x01);
        }
        let block = canonicalize(&payload, None).unwrap();
        assert_eq!(block.hash(), computed);
    }

    #[test]
    fn test_rejects_empty_transaction() {
        let payload = with_transaction(Bytes::new());
        assert!(matches!(canonicalize(&payload, None), Err(PayloadError::EmptyTransaction(0))));
    }

    #[test]
    fn test_rejects_undecodable_transactions() {
        for raw in [&[0x02, 0xff][..], &[0x7f][..]] {
            let payload = with_transaction(Bytes::copy_from_slice(raw));
            let result = canonicalize(&payload, None);
            assert!(matches!(result, Err(PayloadError::Transaction { index: 0, .. })), "{raw:?}");
        }
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut raw = test_transaction(0, Address::ZERO, U256::ZERO).to_vec();
        raw.push(0x00);
        let payload = with_transaction(raw.into());
        assert!(matches!(canonicalize(&payload, None), Err(PayloadError::TrailingBytes(0))));
    }

    #[test]
    fn test_rejects_long_extra_data() {
        let mut payload = test_payload();
        if let ExecutionPayload::Bellatrix(inner) = &mut payload {
            inner.extra_data = vec![0u8; MAXIMUM_EXTRA_DATA_SIZE + 1].into();
        }
        assert!(matches!(canonicalize(&payload, None), Err(PayloadError::ExtraData(33))));
    }

    #[test]
    fn test_rejects_oversized_base_fee() {
        let mut payload = test_payload();
        if let ExecutionPayload::Bellatrix(inner) = &mut payload {
            inner.base_fee_per_gas = U256::from(u64::MAX) + U256::from(1);
        }
        assert!(matches!(canonicalize(&payload, None), Err(PayloadError::BaseFee(_))));
    }

    #[test]
    fn test_capella_commits_to_withdrawals() {
        let withdrawal = capella::Withdrawal {
            index: 1,
            validator_index: 2,
            address: Address::repeat_byte(0x0b),
            amount: 32,
        };
        let payload = ExecutionPayload::Capella(capella::ExecutionPayload {
            payload_inner: test_payload().payload_inner().clone(),
            withdrawals: vec![withdrawal],
        });
        let payload = seal(payload, None);

        let block = canonicalize(&payload, None).unwrap();
        let withdrawals = block.withdrawals().unwrap();
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].amount, 32);
        assert_eq!(
            block.header().withdrawals_root,
            Some(proofs::calculate_withdrawals_root(withdrawals))
        );
    }

    #[test]
    fn test_deneb_commits_to_parent_beacon_block_root() {
        let root = test_parent_beacon_block_root();
        let payload = test_deneb_payload();
        assert!(matches!(
            canonicalize(&payload, None),
            Err(PayloadError::MissingParentBeaconBlockRoot)
        ));

        let block = canonicalize(&payload, Some(root)).unwrap();
        assert_eq!(block.hash(), *payload.block_hash());
        assert_eq!(block.header().parent_beacon_block_root, Some(root));
        assert_eq!(block.header().blob_gas_used, Some(131_072));
        assert_eq!(block.header().excess_blob_gas, Some(0));
        assert!(block.header().withdrawals_root.is_some());

        let other = canonicalize(&payload, Some(B256::repeat_byte(0x0d))).unwrap();
        assert_ne!(other.hash(), block.hash());
    }
}
