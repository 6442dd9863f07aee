//! Connection lifecycle
//!
//! [`EngineLink`] is the explicit connection object each view receives at
//! construction: it bundles the [`EngineProxy`], the notice bus, and the
//! connected/disconnected watch. Links are reference-counted clones; the
//! transport tasks are torn down only when the last holder releases its
//! clone. There is deliberately no process-wide "current connection".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use tapdeck_common::events::{EngineNotice, EventBus};

use crate::config::Config;
use crate::error::Result;
use crate::remote::proxy::EngineProxy;
use crate::remote::transport::{
    build_client, build_stream_client, health_check, run_notice_stream, HttpTransport,
};

/// Capacity of the engine request channel
const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the notice bus
const NOTICE_BUS_CAPACITY: usize = 64;

/// Reference-counted handle to a live engine connection
#[derive(Clone)]
pub struct EngineLink {
    inner: Arc<LinkInner>,
}

struct LinkInner {
    proxy: EngineProxy,
    bus: EventBus,
    connected: watch::Receiver<bool>,
    transport_task: JoinHandle<()>,
    notice_task: JoinHandle<()>,
}

impl Drop for LinkInner {
    fn drop(&mut self) {
        // Last holder released the link: cancel both boundary tasks.
        self.transport_task.abort();
        self.notice_task.abort();
        debug!("Engine link released, transport tasks cancelled");
    }
}

impl EngineLink {
    /// Attach to the engine process described by `config`
    ///
    /// Probes the engine's health endpoint, then spawns the request
    /// transport and the notice listener. Fails when the engine is not
    /// reachable; an established link never fails again, it only reports
    /// disconnection through [`EngineLink::watch_connected`].
    pub async fn connect(config: &Config) -> Result<EngineLink> {
        let client = build_client(Duration::from_millis(config.call_timeout_ms))?;
        let stream_client = build_stream_client()?;

        health_check(&client, &config.engine_url).await?;
        info!(engine_url = %config.engine_url, "Attached to playback engine");

        let (connected_tx, connected_rx) = watch::channel(true);
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let bus = EventBus::new(NOTICE_BUS_CAPACITY);

        let transport = HttpTransport::new(
            client,
            config.engine_url.clone(),
            connected_rx.clone(),
        );
        let transport_task = tokio::spawn(transport.run(request_rx));

        let notice_task = tokio::spawn(run_notice_stream(
            stream_client,
            config.engine_url.clone(),
            bus.clone(),
            connected_tx,
        ));

        let proxy = EngineProxy::new(request_tx, Duration::from_millis(config.call_timeout_ms));

        Ok(EngineLink {
            inner: Arc::new(LinkInner {
                proxy,
                bus,
                connected: connected_rx,
                transport_task,
                notice_task,
            }),
        })
    }

    /// Command/query handle for this connection
    pub fn proxy(&self) -> EngineProxy {
        self.inner.proxy.clone()
    }

    /// Subscribe to engine notices
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineNotice> {
        self.inner.bus.subscribe()
    }

    /// Notice bus handle (for re-emission and tests)
    pub fn bus(&self) -> EventBus {
        self.inner.bus.clone()
    }

    /// Current connection state
    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    /// Watch connected/disconnected transitions
    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.inner.connected.clone()
    }
}
