use crate::{
    config::from_toml_file,
    engine::ExecutionEngine,
    rpc::{BuilderValidationApiServer, ValidationApi},
    validator::BlockValidator,
};
use eyre::WrapErr;
use jsonrpsee::server::{Server, ServerHandle};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    future::Future,
    net::{Ipv4Addr, SocketAddr},
    path::Path,
    pin::Pin,
    sync::Arc,
    task::Poll,
};
use tokio::task::{JoinError, JoinHandle};
use tracing::info;

pub const DEFAULT_PORT: u16 = 28545;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { host: Ipv4Addr::UNSPECIFIED, port: DEFAULT_PORT }
    }
}

impl Config {
    pub fn from_toml_file<P: AsRef<Path> + Debug>(path: P) -> eyre::Result<Self> {
        info!("loading config from `{path:?}`...");
        from_toml_file(path.as_ref()).wrap_err("could not parse TOML")
    }
}

/// Command line flags for the validation endpoint, meant to be flattened into a node's cli.
#[derive(Debug, Clone, Copy, clap::Args)]
pub struct ValidationArgs {
    /// Address the `flashbots` namespace listens on
    #[clap(
        long = "validation.addr",
        env = "VALIDATION_ADDR",
        default_value_t = Ipv4Addr::UNSPECIFIED
    )]
    pub host: Ipv4Addr,
    #[clap(long = "validation.port", env = "VALIDATION_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl From<ValidationArgs> for Config {
    fn from(args: ValidationArgs) -> Self {
        Self { host: args.host, port: args.port }
    }
}

/// Serves `flashbots_validateBuilderSubmissionV1` over JSON-RPC for a given [`ExecutionEngine`].
pub struct Service<E> {
    host: Ipv4Addr,
    port: u16,
    validator: BlockValidator<E>,
}

impl<E: ExecutionEngine + 'static> Service<E> {
    pub fn new(config: Config, engine: Arc<E>) -> Self {
        Self { host: config.host, port: config.port, validator: engine.into() }
    }

    /// Binds the JSON-RPC server and spawns it onto the current runtime
    pub async fn spawn(self) -> eyre::Result<ServiceHandle> {
        let server = Server::builder()
            .build((self.host, self.port))
            .await
            .wrap_err_with(|| format!("could not bind to {}:{}", self.host, self.port))?;
        let local_addr = server.local_addr()?;

        let api = ValidationApi::new(self.validator);
        let server_handle = server.start(api.into_rpc());
        info!(%local_addr, "block validation endpoint listening");

        let stopped = server_handle.clone();
        let server = tokio::spawn(async move { stopped.stopped().await });

        Ok(ServiceHandle { local_addr, server_handle, server })
    }
}

/// Handle to a spawned [`Service`], resolves once the server stops.
///
/// This struct is created by the [`Service::spawn`] function
pub struct ServiceHandle {
    local_addr: SocketAddr,
    server_handle: ServerHandle,
    server: JoinHandle<()>,
}

impl ServiceHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stop(&self) -> eyre::Result<()> {
        self.server_handle.stop()?;
        Ok(())
    }
}

impl Future for ServiceHandle {
    type Output = Result<(), JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.server).poll(cx)
    }
}
