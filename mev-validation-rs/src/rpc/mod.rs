mod result;

pub use result::{internal_rpc_err, invalid_params_rpc_err, rpc_err};

use crate::{
    engine::ExecutionEngine,
    error::{ExecutionError, ValidationError},
    types::BuilderBlockValidationRequest,
    validator::BlockValidator,
};
use async_trait::async_trait;
use jsonrpsee::{core::RpcResult, proc_macros::rpc, types::ErrorObject};

#[rpc(server, client, namespace = "flashbots")]
pub trait BuilderValidationApi {
    /// Validates a builder submission, returning `null` if the block may be offered to the
    /// proposer.
    #[method(name = "validateBuilderSubmissionV1")]
    async fn validate_builder_submission_v1(
        &self,
        request: BuilderBlockValidationRequest,
    ) -> RpcResult<()>;
}

/// The type that implements the `flashbots` rpc namespace trait
pub struct ValidationApi<E> {
    validator: BlockValidator<E>,
}

impl<E> ValidationApi<E> {
    pub fn new(validator: BlockValidator<E>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl<E> BuilderValidationApiServer for ValidationApi<E>
where
    E: ExecutionEngine + 'static,
{
    async fn validate_builder_submission_v1(
        &self,
        request: BuilderBlockValidationRequest,
    ) -> RpcResult<()> {
        let validator = self.validator.clone();
        // the engine call is synchronous, keep it off the async workers
        let result =
            tokio::task::spawn_blocking(move || validator.validate_builder_submission(&request))
                .await
                .map_err(|err| internal_rpc_err(format!("validation task failed: {err}")))?;
        result.map_err(Into::into)
    }
}

impl From<ValidationError> for ErrorObject<'static> {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::ExecutionInvalid(ExecutionError::Internal(_)) => {
                internal_rpc_err(error.to_string())
            }
            ValidationError::MissingPayload |
            ValidationError::MalformedPayload(_) |
            ValidationError::FieldMismatch { .. } |
            ValidationError::ExecutionInvalid(_) => invalid_params_rpc_err(error.to_string()),
        }
    }
}
