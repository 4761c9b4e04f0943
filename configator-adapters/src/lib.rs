//! Vault clients used by the hydrator.
//!
//! Each module exposes an implementation for a specific backend while sharing
//! the trait-based interface defined in [`traits`].

#![warn(missing_docs, clippy::pedantic)]

pub mod connect;
pub mod memory;
pub mod op_cli;
pub mod reference;
pub mod traits;

mod wire;
