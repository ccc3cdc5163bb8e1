use crate::{
    block::{canonicalize, CanonicalBlock},
    engine::ExecutionEngine,
    error::{Field, ValidationError},
    types::{BidTrace, BuilderBlockValidationRequest},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Checks builder submissions against the blocks they carry and hands the blocks to an
/// [`ExecutionEngine`] for execution.
///
/// Holds no state besides the engine so clones can validate submissions concurrently.
#[derive(Debug)]
pub struct BlockValidator<E> {
    engine: Arc<E>,
}

impl<E> Clone for BlockValidator<E> {
    fn clone(&self) -> Self {
        Self { engine: self.engine.clone() }
    }
}

impl<E: ExecutionEngine> BlockValidator<E> {
    pub fn new(engine: E) -> Self {
        Self::from(Arc::new(engine))
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn validate_builder_submission(
        &self,
        request: &BuilderBlockValidationRequest,
    ) -> Result<(), ValidationError> {
        let message = &request.message;
        debug!(
            slot = message.slot,
            block_hash = %message.block_hash,
            "handling builder submission"
        );

        match self.validate(request) {
            Ok(block) => {
                info!(
                    hash = %block.hash(),
                    number = block.number(),
                    parent_hash = %block.parent_hash(),
                    "validated block"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    %err,
                    slot = message.slot,
                    hash = %message.block_hash,
                    parent_hash = %message.parent_hash,
                    "invalid builder submission"
                );
                Err(err)
            }
        }
    }

    fn validate(
        &self,
        request: &BuilderBlockValidationRequest,
    ) -> Result<CanonicalBlock, ValidationError> {
        let payload = request.execution_payload.as_ref().ok_or(ValidationError::MissingPayload)?;
        let block = canonicalize(payload, request.parent_beacon_block_root)?;

        let message = &request.message;
        validate_message_against_block(message, &block)?;

        let vm_config = self.engine.vm_config();
        self.engine.validate_payload(
            &block,
            message.proposer_fee_recipient,
            message.value,
            request.registered_gas_limit,
            &vm_config,
        )?;

        Ok(block)
    }
}

impl<E> From<Arc<E>> for BlockValidator<E> {
    fn from(engine: Arc<E>) -> Self {
        Self { engine }
    }
}

/// Ensures the fields the builder declared in the [`BidTrace`] match `block`, reporting the first
/// field that differs.
pub fn validate_message_against_block(
    message: &BidTrace,
    block: &CanonicalBlock,
) -> Result<(), ValidationError> {
    if message.parent_hash != block.parent_hash() {
        return Err(ValidationError::mismatch(
            Field::ParentHash,
            message.parent_hash,
            block.parent_hash(),
        ))
    }

    if message.block_hash != block.hash() {
        return Err(ValidationError::mismatch(Field::BlockHash, message.block_hash, block.hash()))
    }

    if message.gas_limit != block.gas_limit() {
        return Err(ValidationError::mismatch(Field::GasLimit, message.gas_limit, block.gas_limit()))
    }

    if message.gas_used != block.gas_used() {
        return Err(ValidationError::mismatch(Field::GasUsed, message.gas_used, block.gas_used()))
    }

    Ok(())
}
