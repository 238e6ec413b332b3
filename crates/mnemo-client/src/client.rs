//! The retrieval client and its initialization pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::process::Child;
use tokio::sync::{Mutex, broadcast, oneshot, watch};
use tracing::{info, warn};

use mnemo_types::{HealthStatus, ToolDescriptor};

use crate::config::ClientConfig;
use crate::error::{Result, RetrievalError};
use crate::http::ServiceClient;
use crate::launcher;
use crate::lifecycle::{Lifecycle, LifecycleState, ServiceEvent};

/// Capacity of the event channel; events are advisory, lagging receivers
/// lose the oldest.
const EVENT_CAPACITY: usize = 16;

/// Client for the mnemo retrieval service.
///
/// Owns the service subprocess lifecycle and exposes the typed retrieval
/// API. Construct one instance at the application's composition root and
/// inject it wherever retrieval is needed; the instance guarantees at most
/// one spawned service even under concurrent `initialize()` calls.
///
/// All retrieval operations degrade to empty results when the client is
/// not `Ready`, so UI callers never need a try/catch around them.
#[derive(Clone)]
pub struct RetrievalClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    pub(crate) state: Mutex<Lifecycle>,
    /// Set on Ready, cleared on Failed/crash; retrieval ops take a cheap
    /// clone without touching the state mutex.
    pub(crate) service: RwLock<Option<ServiceClient>>,
    /// Descriptor cache, refreshed by `index_tools`.
    pub(crate) tools: RwLock<HashMap<String, ToolDescriptor>>,
    pub(crate) events: broadcast::Sender<ServiceEvent>,
    /// Signal to the monitor task to kill the child on shutdown.
    kill: parking_lot::Mutex<Option<oneshot::Sender<()>>>,
}

impl RetrievalClient {
    /// Create an uninitialized client.
    pub fn new(config: ClientConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ClientInner {
                config,
                state: Mutex::new(Lifecycle::Uninitialized),
                service: RwLock::new(None),
                tools: RwLock::new(HashMap::new()),
                events,
                kill: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> LifecycleState {
        self.inner.state.lock().await.snapshot()
    }

    /// Whether retrieval operations will hit the service.
    pub fn is_ready(&self) -> bool {
        self.inner.service.read().is_some()
    }

    /// Subscribe to lifecycle events (ready, failed, crashed).
    pub fn events(&self) -> broadcast::Receiver<ServiceEvent> {
        self.inner.events.subscribe()
    }

    /// Initialize the retrieval service.
    ///
    /// Runs the pipeline: locate binary → provision assets → spawn →
    /// stdout handshake → health-poll until the model is loaded. Calls
    /// made while an attempt is in flight await that same attempt — there
    /// is never more than one spawned service per client. A prior failure
    /// is cleared and retried.
    pub async fn initialize(&self) -> Result<()> {
        loop {
            let mut follower_rx = {
                let mut state = self.inner.state.lock().await;
                match &*state {
                    Lifecycle::Ready => return Ok(()),
                    Lifecycle::Initializing(rx) => rx.clone(),
                    Lifecycle::Uninitialized | Lifecycle::Failed(_) => {
                        let (tx, rx) = watch::channel(None);
                        *state = Lifecycle::Initializing(rx);
                        drop(state);
                        return self.lead_initialization(tx).await;
                    }
                }
            };

            // Follower: await the leader's outcome.
            loop {
                let outcome = follower_rx.borrow_and_update().clone();
                if let Some(outcome) = outcome {
                    return outcome.map_err(RetrievalError::Initialization);
                }
                if follower_rx.changed().await.is_err() {
                    // Leader vanished without reporting; retry from scratch.
                    break;
                }
            }
        }
    }

    /// Shut down the spawned service, returning to `Uninitialized`.
    pub async fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock().await;
            *state = Lifecycle::Uninitialized;
        }
        *self.inner.service.write() = None;
        if let Some(kill) = self.inner.kill.lock().take() {
            let _ = kill.send(());
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initialization pipeline
    // ─────────────────────────────────────────────────────────────────────────

    async fn lead_initialization(
        &self,
        tx: watch::Sender<Option<std::result::Result<(), String>>>,
    ) -> Result<()> {
        let outcome = self.run_pipeline().await;

        let mut state = self.inner.state.lock().await;
        match outcome {
            Ok(child) => {
                *state = Lifecycle::Ready;
                drop(state);
                if let Some(child) = child {
                    self.spawn_monitor(child);
                }
                let _ = tx.send(Some(Ok(())));
                let _ = self.inner.events.send(ServiceEvent::Ready);
                info!("retrieval service ready");
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                *state = Lifecycle::Failed(message.clone());
                drop(state);
                let _ = tx.send(Some(Err(message.clone())));
                let _ = self.inner.events.send(ServiceEvent::Failed { message });
                Err(e)
            }
        }
    }

    /// The sequential pipeline. Returns the child process when this client
    /// spawned one (attach mode returns `None`).
    async fn run_pipeline(&self) -> Result<Option<Child>> {
        let config = &self.inner.config;

        let (service, child) = match &config.base_url {
            Some(base_url) => {
                info!(url = %base_url, "attaching to running retrieval service");
                (
                    ServiceClient::new(base_url.clone(), config.request_timeout)?,
                    None,
                )
            }
            None => {
                let binary = launcher::locate_binary(config)?;
                launcher::ensure_assets(config).await?;
                let spawned = launcher::spawn_service(config, &binary).await?;
                (
                    ServiceClient::new(spawned.base_url, config.request_timeout)?,
                    Some(spawned.child),
                )
            }
        };

        if let Err(e) = Self::await_model_ready(&service, config).await {
            if let Some(mut child) = child {
                let _ = child.kill().await;
                let _ = child.wait().await;
            }
            return Err(e);
        }

        *self.inner.service.write() = Some(service);
        Ok(child)
    }

    /// Poll `/health` until the model is loaded, the service reports
    /// degraded, or the startup timeout elapses.
    async fn await_model_ready(service: &ServiceClient, config: &ClientConfig) -> Result<()> {
        let deadline = tokio::time::Instant::now() + config.startup_timeout;
        loop {
            match service.health().await {
                Ok(health) if health.model_loaded => return Ok(()),
                Ok(health) if health.status == HealthStatus::Degraded => {
                    return Err(RetrievalError::Initialization(
                        "embedding model failed to load; service is degraded".to_string(),
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "health poll failed; service may still be binding");
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(RetrievalError::StartupTimeout(config.startup_timeout));
            }
            tokio::time::sleep(config.health_interval).await;
        }
    }

    /// Watch the child; an unexpected exit flips the client to `Failed`
    /// and broadcasts a crash event — the service is never silently
    /// pretended healthy.
    fn spawn_monitor(&self, mut child: Child) {
        let (kill_tx, kill_rx) = oneshot::channel();
        *self.inner.kill.lock() = Some(kill_tx);

        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let code = status.ok().and_then(|s| s.code());
                    let Some(inner) = weak.upgrade() else { return };

                    let mut state = inner.state.lock().await;
                    if matches!(&*state, Lifecycle::Ready) {
                        warn!(?code, "retrieval service exited unexpectedly");
                        *state = Lifecycle::Failed(
                            RetrievalError::Crashed { code }.to_string(),
                        );
                        drop(state);
                        *inner.service.write() = None;
                        let _ = inner.events.send(ServiceEvent::Crashed { code });
                    }
                }
                _ = kill_rx => {
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                }
            }
        });
    }

    /// The live service client, if ready.
    pub(crate) fn service(&self) -> Option<ServiceClient> {
        self.inner.service.read().clone()
    }

    /// Fetch the service's status report (model name, namespaces,
    /// document counts). `None` when not ready or the request fails.
    pub async fn service_status(&self) -> Option<mnemo_types::StatusResponse> {
        let service = self.service()?;
        match service.status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "status request failed");
                None
            }
        }
    }
}
