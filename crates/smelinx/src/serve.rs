// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smelinx serve` and `smelinx dispatch-once`.
//!
//! `serve` opens SQLite storage, then runs the HTTP gateway and the
//! notification dispatcher side by side until a shutdown signal arrives.
//! `dispatch-once` runs a single dispatch cycle against the same storage.

use std::sync::Arc;

use chrono::Utc;
use smelinx_config::model::{SmelinxConfig, StorageConfig};
use smelinx_core::{DeliveryGateway, HealthStatus, SmelinxError, StorageAdapter};
use smelinx_dispatch::{CycleReport, DispatchSettings, Dispatcher};
use smelinx_gateway::{AppState, ServerConfig, StaticTokenValidator, start_server};
use smelinx_registry::Registry;
use smelinx_storage::SqliteStorage;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::shutdown;

/// Runs the `smelinx serve` command.
pub async fn run_serve(config: SmelinxConfig) -> Result<(), SmelinxError> {
    let storage = open_storage(&config.storage).await?;
    let registry = Registry::new(storage.clone(), storage.clone());

    let cancel = shutdown::install_signal_handler();
    let mut tasks: JoinSet<Result<(), SmelinxError>> = JoinSet::new();

    let delivery = if config.dispatch.enabled {
        let gateway = open_delivery(&config).await?;
        let dispatcher = build_dispatcher(&config, storage.clone(), gateway.clone());
        let dispatch_cancel = cancel.clone();
        tasks.spawn(async move {
            dispatcher.run(dispatch_cancel).await;
            Ok(())
        });
        Some(gateway)
    } else {
        info!("dispatcher disabled");
        None
    };

    if config.gateway.enabled {
        let validator = StaticTokenValidator::new(&config.gateway.tokens);
        if validator.is_empty() {
            warn!("no gateway tokens configured; every API request will be rejected");
        }
        let state = AppState::new(registry, Arc::new(validator));
        let server_config = ServerConfig::from(&config.gateway);
        let server_cancel = cancel.clone();
        tasks.spawn(async move { start_server(&server_config, state, server_cancel).await });
    } else {
        info!("HTTP gateway disabled");
    }

    if tasks.is_empty() {
        warn!("both the gateway and the dispatcher are disabled; nothing to run");
    } else {
        info!(service = %config.service.name, "smelinx running");
    }

    let mut outcome = Ok(());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, "service task failed, shutting down");
                cancel.cancel();
                if outcome.is_ok() {
                    outcome = Err(e);
                }
            }
            Err(e) => {
                error!(error = %e, "service task panicked, shutting down");
                cancel.cancel();
                if outcome.is_ok() {
                    outcome = Err(SmelinxError::Internal(format!("service task panicked: {e}")));
                }
            }
        }
    }
    cancel.cancel();

    if let Some(gateway) = delivery
        && let Err(e) = gateway.shutdown().await
    {
        warn!(error = %e, "delivery gateway shutdown failed");
    }
    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    info!("smelinx stopped");
    outcome
}

/// Runs the `smelinx dispatch-once` command: one cycle, then exit.
pub async fn run_dispatch_once(config: SmelinxConfig) -> Result<CycleReport, SmelinxError> {
    let storage = open_storage(&config.storage).await?;
    let gateway = open_delivery(&config).await?;
    let dispatcher = build_dispatcher(&config, storage.clone(), gateway.clone());

    let report = dispatcher.run_cycle(Utc::now()).await;

    gateway.shutdown().await?;
    storage.close().await?;
    Ok(report)
}

async fn open_storage(config: &StorageConfig) -> Result<Arc<SqliteStorage>, SmelinxError> {
    let storage = SqliteStorage::new(config.clone());
    storage.initialize().await?;
    info!(path = %config.database_path, "storage ready");
    Ok(Arc::new(storage))
}

/// Builds the configured delivery gateway and logs its health.
///
/// An unreachable SMTP server is not fatal: failed sends are retried.
async fn open_delivery(config: &SmelinxConfig) -> Result<Arc<dyn DeliveryGateway>, SmelinxError> {
    let gateway = smelinx_email::gateway_from_config(&config.email)?;
    match gateway.health_check().await {
        Ok(HealthStatus::Healthy) => info!(gateway = gateway.name(), "delivery gateway ready"),
        Ok(HealthStatus::Degraded(reason)) | Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(gateway = gateway.name(), %reason, "delivery gateway not healthy")
        }
        Err(e) => warn!(gateway = gateway.name(), error = %e, "delivery gateway health check failed"),
    }
    Ok(gateway)
}

fn build_dispatcher(
    config: &SmelinxConfig,
    storage: Arc<SqliteStorage>,
    gateway: Arc<dyn DeliveryGateway>,
) -> Dispatcher {
    let settings = DispatchSettings::from_config(&config.dispatch, &config.email);
    Dispatcher::new(storage.clone(), storage, gateway, settings)
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `service.log_level` applies to the
/// smelinx crates and everything else logs at `warn`. Output goes to stderr
/// so `dispatch-once` can print its report on stdout.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("smelinx={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
