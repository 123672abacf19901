//! Vault to Kubernetes Sync Library
//!
//! One-shot sync of a HashiCorp Vault secret into a Kubernetes `Secret` or
//! `ConfigMap`. The binary in `main.rs` is a thin wrapper around
//! [`sync::SyncOrchestrator`].

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod kubernetes;
pub mod observability;
pub mod sync;
pub mod vault;

pub use config::{ConfigSource, RuntimeConfig, SyncConfig};
pub use error::SyncError;
pub use sync::{SyncOrchestrator, SyncReport};
