//! # vault-k8s-sync
//!
//! One-shot job that copies a secret from HashiCorp Vault into a Kubernetes
//! `Secret` (or `ConfigMap`) and exits.
//!
//! ## Overview
//!
//! 1. **Validate** - assemble the configuration from the environment and CLI flags
//! 2. **Authenticate** - token, AppRole or GitHub login against Vault
//! 3. **Fetch** - read `<engine>/data/<path>` and flatten it
//! 4. **Resolve** - decode the base64 kubeconfig and bind to the target namespace
//! 5. **Reconcile** - create the object, replace it, or leave it untouched
//!
//! Exit code is `0` on success and `1` on any failure. Failures are logged as
//! structured lines on stderr.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use vault_k8s_sync::cli::Cli;
use vault_k8s_sync::observability;
use vault_k8s_sync::{ConfigSource, RuntimeConfig, SyncOrchestrator};

#[tokio::main]
async fn main() -> ExitCode {
    // Configure rustls crypto provider FIRST, before any other operations
    // Required for rustls 0.23+ when no default provider is set via features
    // We use ring as the crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    let runtime = RuntimeConfig::from_env();

    if let Err(e) = observability::init_tracing(runtime.log_format) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }
    observability::log_build_info();

    let mut source = ConfigSource::from_env();
    cli.apply_to(&mut source);

    match SyncOrchestrator::from_runtime(&runtime).run(&source).await {
        Ok(report) => {
            info!(
                kind = report.kind.as_str(),
                name = %report.name,
                namespace = %report.namespace,
                action = report.action.as_str(),
                entries = report.entries,
                "Vault secret synced"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(stage = e.stage(), error = %e, "Sync failed");
            ExitCode::FAILURE
        }
    }
}
