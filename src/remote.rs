use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Duration;

use crate::error::{BoxError, SinkError};
use crate::format::JsonRecord;
use crate::stats::DeliveryStats;

/// Asynchronous transport that delivers one JSON record to a remote
/// endpoint.
///
/// The dispatcher calls `send` from a background task, bounded by a
/// timeout, exactly once per record. Implementations should not retry.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Deliver `record` to `url`.
    ///
    /// **Returns**
    /// - `Ok(())` if the endpoint accepted the record.
    /// - `Err(..)` on transport errors or a non-success status.
    async fn send(&self, url: &str, record: &JsonRecord) -> Result<(), SinkError>;
}

/// HTTP implementation of [`RemoteTransport`]: one `POST` with an
/// `application/json` body per record.
#[cfg(feature = "remote")]
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "remote")]
impl HttpTransport {
    /// Build a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote")]
#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn send(&self, url: &str, record: &JsonRecord) -> Result<(), SinkError> {
        let resp = self
            .client
            .post(url)
            .json(record)
            .send()
            .await
            .map_err(|e| SinkError::Transport(Box::new(e)))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::Status(resp.status().as_u16()))
        }
    }
}

/// A transport that accepts and drops every record.
///
/// Useful for measuring the overhead of the pipeline without network I/O.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl RemoteTransport for NoopTransport {
    async fn send(&self, _url: &str, _record: &JsonRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Transport used when none is supplied explicitly.
pub(crate) fn default_transport(timeout: Duration) -> Result<Arc<dyn RemoteTransport>, BoxError> {
    #[cfg(feature = "remote")]
    {
        Ok(Arc::new(HttpTransport::new(timeout)?))
    }

    #[cfg(not(feature = "remote"))]
    {
        let _ = timeout;
        Err("remote feature is not enabled".into())
    }
}

/// Tuning of the remote delivery path.
///
/// **Fields**
/// - `channel_buffer`: records waiting for delivery before new ones are
///   dropped.
/// - `timeout`: upper bound for a single delivery attempt.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub channel_buffer: usize,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            timeout: Duration::from_secs(5),
        }
    }
}

struct Job {
    url: String,
    record: JsonRecord,
}

/// Fire-and-forget delivery of records through a bounded channel and a
/// background task.
///
/// Enqueueing never blocks; each record gets a single attempt and its
/// outcome only shows up in [`DeliveryStats`].
pub struct RemoteDispatcher {
    sender: mpsc::Sender<Job>,
    stats: Arc<DeliveryStats>,
}

impl RemoteDispatcher {
    /// Spawn the background task and return a handle feeding it.
    ///
    /// The task always runs on a dedicated thread with its own
    /// current-thread runtime, so it outlives whatever runtime the first
    /// remote event was logged from. It ends once the dispatcher is
    /// dropped.
    pub fn start(
        transport: Arc<dyn RemoteTransport>,
        config: RemoteConfig,
        stats: Arc<DeliveryStats>,
    ) -> std::io::Result<Self> {
        // Enforce minimal thresholds to avoid degenerate configs.
        let buffer = config.channel_buffer.max(16);
        let timeout = config.timeout.max(Duration::from_millis(10));

        let (tx, rx) = mpsc::channel::<Job>(buffer);
        let worker = run(rx, transport, timeout, Arc::clone(&stats));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        std::thread::Builder::new()
            .name("debug-log-remote".to_string())
            .spawn(move || runtime.block_on(worker))?;

        Ok(Self { sender: tx, stats })
    }

    /// Queue `record` for delivery to `url` without waiting.
    pub fn dispatch(&self, url: &str, record: JsonRecord) {
        let job = Job {
            url: url.to_string(),
            record,
        };
        match self.sender.try_send(job) {
            Ok(()) => DeliveryStats::incr(&self.stats.remote_enqueued),
            Err(TrySendError::Full(_)) => {
                DeliveryStats::incr(&self.stats.remote_dropped);
                tracing::warn!("remote log channel full, dropping record");
            }
            Err(TrySendError::Closed(_)) => {
                DeliveryStats::incr(&self.stats.remote_dropped);
                tracing::warn!("remote log dispatcher stopped, dropping record");
            }
        }
    }
}

async fn run(
    mut rx: mpsc::Receiver<Job>,
    transport: Arc<dyn RemoteTransport>,
    timeout: Duration,
    stats: Arc<DeliveryStats>,
) {
    while let Some(job) = rx.recv().await {
        let transport = Arc::clone(&transport);
        let stats = Arc::clone(&stats);
        // One task per record so a hanging endpoint does not hold up the
        // records queued behind it.
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, transport.send(&job.url, &job.record)).await {
                Ok(result) => result,
                Err(_) => Err(SinkError::Timeout(timeout)),
            };
            match outcome {
                Ok(()) => DeliveryStats::incr(&stats.remote_delivered),
                Err(e) => {
                    DeliveryStats::incr(&stats.remote_failed);
                    tracing::warn!(url = %job.url, error = %e, "remote log delivery failed");
                }
            }
        });
    }
}
