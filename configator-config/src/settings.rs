use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use configator_adapters::connect::{
    CONNECT_HOST_ENV, CONNECT_TOKEN_ENV, ConnectClient, ConnectConfig,
};
use configator_adapters::op_cli::{
    OP_CLI_PATH_ENV, OpCliClient, OpCliConfig, SERVICE_ACCOUNT_TOKEN_ENV,
};
use configator_adapters::traits::VaultClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable overriding the per-request timeout, in seconds.
pub const TIMEOUT_SECS_ENV: &str = "CONFIGATOR_TIMEOUT_SECS";

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_OP_BINARY: &str = "op";

/// Vault backend and its credentials.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum Backend {
    /// 1Password Connect Server.
    Connect {
        /// Server URL.
        host: String,
        /// Bearer token.
        token: String,
    },
    /// The `op` command line tool.
    OpCli {
        /// Binary to execute.
        #[serde(default = "default_op_binary")]
        binary: String,
        /// Service account token handed to `op`, if any.
        #[serde(default)]
        service_account_token: Option<String>,
    },
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { host, .. } => f
                .debug_struct("Connect")
                .field("host", host)
                .field("token", &"<redacted>")
                .finish(),
            Self::OpCli {
                binary,
                service_account_token,
            } => f
                .debug_struct("OpCli")
                .field("binary", binary)
                .field(
                    "service_account_token",
                    &service_account_token.as_ref().map(|_| "<redacted>"),
                )
                .finish(),
        }
    }
}

impl Backend {
    /// Short provider name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::OpCli { .. } => "op-cli",
        }
    }
}

fn default_op_binary() -> String {
    DEFAULT_OP_BINARY.to_owned()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Settings used to construct a vault client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientSettings {
    #[serde(flatten)]
    backend: Backend,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl ClientSettings {
    /// Creates settings for `backend` with the default timeout.
    #[must_use]
    pub const fn new(backend: Backend) -> Self {
        Self {
            backend,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ClientSettings::from_lookup`].
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// `OP_CONNECT_HOST` selects the Connect backend and then requires
    /// `OP_CONNECT_TOKEN`. Otherwise the `op` CLI is used. Empty values count
    /// as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] when the Connect token is
    /// absent and [`ConfigError::InvalidVariable`] for a malformed timeout.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match read(CONNECT_HOST_ENV) {
            Some(host) => Backend::Connect {
                host,
                token: read(CONNECT_TOKEN_ENV).ok_or(ConfigError::MissingVariable {
                    name: CONNECT_TOKEN_ENV,
                })?,
            },
            None => Backend::OpCli {
                binary: read(OP_CLI_PATH_ENV).unwrap_or_else(default_op_binary),
                service_account_token: read(SERVICE_ACCOUNT_TOKEN_ENV),
            },
        };

        let timeout_secs = match read(TIMEOUT_SECS_ENV) {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            backend,
            timeout_secs,
        })
    }

    /// Overrides the timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Returns the selected backend.
    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds the vault client described by these settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidVariable`] for a zero timeout and
    /// [`ConfigError::Client`] when the client rejects its configuration.
    pub fn build_client(&self) -> ConfigResult<Arc<dyn VaultClient>> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid(TIMEOUT_SECS_ENV, "must be greater than zero"));
        }
        debug!(backend = self.backend.name(), timeout_secs = self.timeout_secs, "building vault client");

        let client: Arc<dyn VaultClient> = match &self.backend {
            Backend::Connect { host, token } => {
                let config = ConnectConfig::new(host)?
                    .with_token(token.clone())
                    .with_timeout(self.timeout());
                Arc::new(ConnectClient::new(config)?)
            }
            Backend::OpCli {
                binary,
                service_account_token,
            } => {
                let mut config = OpCliConfig::new()
                    .with_binary(binary.clone())
                    .with_timeout(self.timeout());
                if let Some(token) = service_account_token {
                    config = config.with_service_account_token(token.clone());
                }
                Arc::new(OpCliClient::new(config))
            }
        };
        Ok(client)
    }
}

fn parse_timeout(raw: &str) -> ConfigResult<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|err| ConfigError::invalid(TIMEOUT_SECS_ENV, format!("{err}")))?;
    if secs == 0 {
        return Err(ConfigError::invalid(TIMEOUT_SECS_ENV, "must be greater than zero"));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_selects_cli() {
        let settings = ClientSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            settings.backend(),
            &Backend::OpCli {
                binary: "op".into(),
                service_account_token: None,
            }
        );
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn cli_overrides_are_read() {
        let settings = ClientSettings::from_lookup(lookup(&[
            (OP_CLI_PATH_ENV, "/usr/local/bin/op"),
            (SERVICE_ACCOUNT_TOKEN_ENV, "ops_abc"),
            (TIMEOUT_SECS_ENV, " 5 "),
        ]))
        .unwrap();
        assert_eq!(
            settings.backend(),
            &Backend::OpCli {
                binary: "/usr/local/bin/op".into(),
                service_account_token: Some("ops_abc".into()),
            }
        );
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn connect_host_selects_connect() {
        let settings = ClientSettings::from_lookup(lookup(&[
            (CONNECT_HOST_ENV, "https://connect.internal:8443"),
            (CONNECT_TOKEN_ENV, "secret"),
        ]))
        .unwrap();
        assert_eq!(settings.backend().name(), "connect");
    }

    #[test]
    fn connect_without_token_fails() {
        let err = ClientSettings::from_lookup(lookup(&[
            (CONNECT_HOST_ENV, "https://connect.internal"),
            (CONNECT_TOKEN_ENV, "  "),
        ]))
        .expect_err("token is required");
        assert!(matches!(err, ConfigError::MissingVariable { name } if name == CONNECT_TOKEN_ENV));
    }

    #[test]
    fn bad_timeouts_fail() {
        for raw in ["soon", "0", "-3"] {
            let err = ClientSettings::from_lookup(lookup(&[(TIMEOUT_SECS_ENV, raw)]))
                .expect_err("invalid timeout");
            assert!(matches!(err, ConfigError::InvalidVariable { name, .. } if name == TIMEOUT_SECS_ENV));
        }
    }

    #[test]
    fn debug_hides_tokens() {
        let settings = ClientSettings::new(Backend::Connect {
            host: "https://connect.internal".into(),
            token: "super-secret".into(),
        });
        let rendered = format!("{settings:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn deserializes_tagged_settings() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"backend":"op_cli","timeout_secs":10}"#).unwrap();
        assert_eq!(settings.backend().name(), "op-cli");
        assert_eq!(settings.timeout(), Duration::from_secs(10));

        let settings: ClientSettings = serde_json::from_str(
            r#"{"backend":"connect","host":"https://connect.internal","token":"t"}"#,
        )
        .unwrap();
        assert_eq!(settings.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[tokio::test]
    async fn builds_clients_for_each_backend() {
        let cli = ClientSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cli.build_client().unwrap().metadata().provider(), "onepassword-cli");

        let connect = ClientSettings::new(Backend::Connect {
            host: "https://connect.internal".into(),
            token: "t".into(),
        });
        assert_eq!(connect.build_client().unwrap().metadata().provider(), "onepassword-connect");
    }

    #[test]
    fn zero_timeout_is_rejected_at_build() {
        let settings = ClientSettings::new(Backend::OpCli {
            binary: "op".into(),
            service_account_token: None,
        })
        .with_timeout_secs(0);
        assert!(matches!(
            settings.build_client(),
            Err(ConfigError::InvalidVariable { .. })
        ));
    }
}
