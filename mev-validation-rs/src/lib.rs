pub mod block;
pub mod block_validation;
pub mod config;
mod engine;
mod error;
#[cfg(feature = "api")]
pub mod rpc;
#[cfg(feature = "api")]
mod service;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
mod validator;

pub use block::{canonicalize, CanonicalBlock, PayloadError};
pub use engine::{ExecutionEngine, Hardfork, VmConfig};
pub use error::{ExecutionError, Field, FieldValue, ValidationError};
#[cfg(feature = "api")]
pub use service::{Config, Service, ServiceHandle, ValidationArgs, DEFAULT_PORT};
pub use validator::{validate_message_against_block, BlockValidator};
