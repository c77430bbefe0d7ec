//! One-call startup for the whole telemetry pipeline.
//!
//! [`TelemetryClient`] wires the connection task to the sync coordinator
//! under a single cancellation token, so one [`TelemetryClient::shutdown`]
//! stops the stream, the coordinator, and every in-flight refresh.

use std::sync::Arc;

use emergence_types::StreamFrame;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::TelemetryConfig;
use crate::connection::{Backoff, ConnectionPhase};
use crate::error::{ClientError, DecodeError};
use crate::stream::{ConnectionHandle, ConnectionManager};
use crate::sync::{SyncCoordinator, SyncHandle};
use crate::transport::{Transport, WsTransport, stream_url};

/// A running telemetry pipeline.
pub struct TelemetryClient {
    /// Query client, also usable for ad-hoc and operator calls.
    api: ApiClient,
    /// Stream connection.
    connection: ConnectionHandle,
    /// Synced snapshots and analytics.
    sync: SyncHandle,
    /// Shared teardown.
    cancel: CancellationToken,
    /// Connection and coordinator tasks.
    tasks: Vec<JoinHandle<()>>,
}

impl TelemetryClient {
    /// Start the pipeline against the observer named in `config`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(config: &TelemetryConfig) -> Result<Self, ClientError> {
        let api = ApiClient::from_config(&config.observer)?;
        let url = stream_url(&config.observer.base_url, &config.observer.stream_path)?;
        Ok(Self::start(WsTransport, url, api, config, None))
    }

    /// Start the pipeline with an explicit transport and query client.
    ///
    /// `on_decode_error` is invoked for every stream frame that fails to
    /// decode, in addition to the handle's dropped-frame counter.
    pub fn start<T: Transport>(
        transport: T,
        url: String,
        api: ApiClient,
        config: &TelemetryConfig,
        on_decode_error: Option<Box<dyn Fn(&DecodeError) + Send + Sync>>,
    ) -> Self {
        let cancel = CancellationToken::new();

        let mut manager = ConnectionManager::new(transport, url, Backoff::from(config.reconnect))
            .with_cancellation(cancel.clone());
        if let Some(hook) = on_decode_error {
            manager = manager.with_decode_hook(hook);
        }
        let (connection, connection_task) = manager.spawn();

        let coordinator = SyncCoordinator::new(Arc::new(api.clone()), config.sync, &config.alerts)
            .with_cancellation(cancel.clone());
        let (sync, sync_task) = coordinator.spawn(connection.subscribe());

        info!(base_url = api.base_url(), "telemetry client started");
        Self {
            api,
            connection,
            sync,
            cancel,
            tasks: vec![connection_task, sync_task],
        }
    }

    /// The query client.
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The stream connection.
    pub const fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    /// Synced snapshots and analytics.
    pub const fn sync(&self) -> &SyncHandle {
        &self.sync
    }

    /// Current connection phase.
    pub fn phase(&self) -> ConnectionPhase {
        self.connection.phase()
    }

    /// The most recent frame.
    pub async fn latest(&self) -> Option<StreamFrame> {
        self.connection.latest().await
    }

    /// Drop the stream subscription and reconnect immediately.
    pub fn reconnect(&self) {
        self.connection.reconnect();
    }

    /// Stop everything and wait for the tasks to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "telemetry task ended abnormally");
            }
        }
        info!("telemetry client stopped");
    }
}
