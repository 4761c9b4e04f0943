//! Vault client selection for configator.
//!
//! [`ClientSettings`] picks a backend from the environment (or any
//! serde-compatible source) and builds the matching
//! [`VaultClient`](configator_adapters::traits::VaultClient).

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{Backend, ClientSettings, DEFAULT_TIMEOUT_SECS, TIMEOUT_SECS_ENV};
