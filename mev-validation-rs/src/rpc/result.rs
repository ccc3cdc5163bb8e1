use jsonrpsee::types::{
    error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE},
    ErrorObject,
};

/// Constructs an internal JSON-RPC error.
pub fn internal_rpc_err(msg: impl Into<String>) -> ErrorObject<'static> {
    rpc_err(INTERNAL_ERROR_CODE, msg)
}

/// Constructs an invalid params JSON-RPC error.
pub fn invalid_params_rpc_err(msg: impl Into<String>) -> ErrorObject<'static> {
    rpc_err(INVALID_PARAMS_CODE, msg)
}

/// Constructs a JSON-RPC error, consisting of `code` and `message`.
pub fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}
