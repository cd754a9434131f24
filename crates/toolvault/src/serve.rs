// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `toolvault serve`: wire storage, crypto and identity into the gateway.

use std::sync::Arc;

use toolvault_config::ToolvaultConfig;
use toolvault_core::{PluginAdapter, StorageAdapter, ToolvaultError};
use toolvault_gateway::{start_server, GatewayState};
use toolvault_sharing::StaticIdentityProvider;
use toolvault_storage::SqliteStorage;
use toolvault_vault::{Cipher, SecretGate};
use tracing::{info, warn};

use crate::shutdown;

/// Run the API server until SIGINT/SIGTERM.
pub async fn run_serve(config: ToolvaultConfig) -> Result<(), ToolvaultError> {
    info!(environment = ?config.server.environment, "starting toolvault serve");
    log_heap_stats("startup");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage = Arc::new(storage);

    let cipher = Arc::new(Cipher::new(&config.vault));
    let gate = Arc::new(SecretGate::new(&config.sharing));

    let identity = StaticIdentityProvider::new(&config.identity);
    if identity.is_empty() {
        warn!("no identities configured; authenticated routes will reject every request");
    } else {
        info!(users = identity.len(), "static identity provider ready");
    }

    let state = GatewayState::new(
        Arc::new(identity),
        storage.clone(),
        cipher,
        gate,
        config.sharing.clone(),
    );

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&config.server, state, async move {
        cancel.cancelled().await;
    })
    .await;

    storage.shutdown().await?;
    served?;

    log_heap_stats("shutdown");
    info!("toolvault serve shutdown complete");
    Ok(())
}

/// Allocated and resident heap bytes as reported by jemalloc.
#[cfg(not(target_env = "msvc"))]
pub(crate) fn heap_stats() -> Option<(usize, usize)> {
    // Stats are cached until the epoch advances.
    tikv_jemalloc_ctl::epoch::advance().ok()?;
    let allocated = tikv_jemalloc_ctl::stats::allocated::read().ok()?;
    let resident = tikv_jemalloc_ctl::stats::resident::read().ok()?;
    Some((allocated, resident))
}

#[cfg(target_env = "msvc")]
pub(crate) fn heap_stats() -> Option<(usize, usize)> {
    None
}

fn log_heap_stats(stage: &str) {
    if let Some((allocated, resident)) = heap_stats() {
        info!(
            stage,
            allocated_kb = allocated / 1024,
            resident_kb = resident / 1024,
            "heap usage"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_env = "msvc"))]
    #[test]
    fn heap_stats_report_live_allocations() {
        let buffer = std::hint::black_box(vec![1u8; 1 << 20]);
        let (allocated, resident) = heap_stats().unwrap();
        assert!(allocated >= buffer.len());
        assert!(resident > 0);
    }
}
