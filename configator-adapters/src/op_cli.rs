//! 1Password CLI (`op`) client.
//!
//! Shells out to a locally installed `op` binary. Authentication belongs to
//! `op` itself: a service account token in `OP_SERVICE_ACCOUNT_TOKEN`, or the
//! desktop app integration.

use std::{env, fmt, process::Stdio, time::Duration};

use async_trait::async_trait;
use configator_primitives::VaultRecord;
use serde::de::DeserializeOwned;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::traits::{
    ClientMetadata, ItemHandle, VaultClient, VaultError, VaultHandle, VaultResult,
};
use crate::wire::{WireItem, WireItemSummary, WireVault};

/// Environment variable overriding the path of the `op` binary.
pub const OP_CLI_PATH_ENV: &str = "CONFIGATOR_OP_CLI_PATH";

/// Environment variable read by `op` for service account authentication.
pub const SERVICE_ACCOUNT_TOKEN_ENV: &str = "OP_SERVICE_ACCOUNT_TOKEN";

const DEFAULT_BINARY: &str = "op";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the `op` CLI client.
#[derive(Clone)]
pub struct OpCliConfig {
    binary: String,
    service_account_token: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for OpCliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpCliConfig")
            .field("binary", &self.binary)
            .field(
                "service_account_token",
                &self.service_account_token.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for OpCliConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_owned(),
            service_account_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OpCliConfig {
    /// Creates a configuration that runs `op` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the binary path from `CONFIGATOR_OP_CLI_PATH`. The service account
    /// token is inherited by the child process from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = Self::new();
        if let Ok(path) = env::var(OP_CLI_PATH_ENV) {
            cfg.binary = path;
        }
        cfg
    }

    /// Overrides the binary to execute.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Passes an explicit service account token to every `op` invocation.
    #[must_use]
    pub fn with_service_account_token(mut self, token: impl Into<String>) -> Self {
        self.service_account_token = Some(token.into());
        self
    }

    /// Sets the per-invocation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the binary that will be executed.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }
}

/// Vault client that shells out to the `op` CLI.
#[derive(Debug)]
pub struct OpCliClient {
    config: OpCliConfig,
    metadata: ClientMetadata,
}

impl OpCliClient {
    /// Creates a client for the supplied configuration.
    #[must_use]
    pub fn new(config: OpCliConfig) -> Self {
        let metadata = ClientMetadata::new("onepassword-cli").with_endpoint(config.binary());
        Self { config, metadata }
    }

    async fn run(&self, args: &[&str]) -> VaultResult<String> {
        debug!(binary = %self.config.binary, command = ?args.first(), "running op");
        let mut command = Command::new(&self.config.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(token) = &self.config.service_account_token {
            command.env(SERVICE_ACCOUNT_TOKEN_ENV, token);
        }

        let output = timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| VaultError::transport("op CLI timed out"))?
            .map_err(|err| VaultError::transport(format!("failed to execute op CLI: {err}")))?;

        if output.status.success() {
            return String::from_utf8(output.stdout)
                .map_err(|err| VaultError::response(format!("op CLI returned non-UTF-8 output: {err}")));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("unknown error")
            .to_owned();
        if message.contains("not found") || message.contains("isn't a") {
            Err(VaultError::not_found(message))
        } else if message.contains("authoriz") || message.contains("sign in") {
            Err(VaultError::Unauthorized)
        } else {
            Err(VaultError::response(format!("op CLI failed: {message}")))
        }
    }

    async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> VaultResult<T> {
        let json = self.run(args).await?;
        serde_json::from_str(&json)
            .map_err(|err| VaultError::response(format!("failed to parse op CLI output: {err}")))
    }
}

#[async_trait]
impl VaultClient for OpCliClient {
    fn metadata(&self) -> &ClientMetadata {
        &self.metadata
    }

    async fn resolve_vault(&self, name: &str) -> VaultResult<Option<VaultHandle>> {
        let vaults: Vec<WireVault> = self.run_json(&["vault", "list", "--format", "json"]).await?;
        Ok(vaults
            .into_iter()
            .map(VaultHandle::from)
            .find(|vault| vault.title() == name))
    }

    async fn resolve_item(
        &self,
        vault: &VaultHandle,
        name: &str,
    ) -> VaultResult<Option<ItemHandle>> {
        let items: Vec<WireItemSummary> = self
            .run_json(&["item", "list", "--vault", vault.id(), "--format", "json"])
            .await?;
        Ok(items
            .into_iter()
            .map(ItemHandle::from)
            .find(|item| item.title() == name))
    }

    async fn fetch_record(
        &self,
        vault: &VaultHandle,
        item: &ItemHandle,
    ) -> VaultResult<VaultRecord> {
        let item: WireItem = self
            .run_json(&["item", "get", item.id(), "--vault", vault.id(), "--format", "json"])
            .await?;
        Ok(item.into_record())
    }

    async fn dereference(&self, link: &str) -> VaultResult<String> {
        self.run(&["read", "--no-newline", link]).await
    }
}
