//! Progress reporting
//!
//! Workers push human-readable lines into a bounded channel; a forwarder task
//! drains it and hands each line to a [`ProgressSink`]. Delivery is best
//! effort: a slow or vanished consumer never stalls or fails a batch.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Channel bound between workers and the forwarder
const PROGRESS_QUEUE_SIZE: usize = 256;

/// Destination for progress lines. Publishing must not block and must not fail.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, message: &str);
}

/// Fans every line out to all current subscribers.
///
/// Each subscriber owns an independent receiver. A lagging subscriber loses
/// its oldest lines; a dropped one is simply gone. Neither affects the others.
#[derive(Clone)]
pub struct BroadcastProgress {
    tx: broadcast::Sender<String>,
}

impl BroadcastProgress {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        BroadcastProgress { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ProgressSink for BroadcastProgress {
    fn publish(&self, message: &str) {
        // Err only means nobody is listening right now.
        let _ = self.tx.send(message.to_string());
    }
}

/// Writes every line to the log.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn publish(&self, message: &str) {
        tracing::info!(target: "photobatch::progress", "{}", message);
    }
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn publish(&self, _message: &str) {}
}

/// Worker-side handle of a [`ProgressChannel`].
#[derive(Clone)]
pub struct ProgressReporter {
    tx: mpsc::Sender<String>,
}

impl ProgressReporter {
    pub async fn report(&self, message: impl Into<String>) {
        if self.tx.send(message.into()).await.is_err() {
            tracing::debug!("Progress forwarder stopped, dropping message");
        }
    }
}

/// Worker → sink pipe with its forwarder task.
pub struct ProgressChannel {
    reporter: ProgressReporter,
    forwarder: JoinHandle<()>,
}

impl ProgressChannel {
    /// Spawn the forwarder task. Must be called inside a tokio runtime.
    pub fn spawn(sink: Arc<dyn ProgressSink>) -> Self {
        let (tx, mut rx) = mpsc::channel::<String>(PROGRESS_QUEUE_SIZE);

        let forwarder = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                sink.publish(&message);
            }
        });

        ProgressChannel {
            reporter: ProgressReporter { tx },
            forwarder,
        }
    }

    pub fn reporter(&self) -> ProgressReporter {
        self.reporter.clone()
    }

    /// Close the channel and wait until every queued line was published.
    ///
    /// Reporter clones still alive elsewhere keep the forwarder running, so
    /// drop them first.
    pub async fn finish(self) {
        drop(self.reporter);
        if let Err(e) = self.forwarder.await {
            tracing::warn!(error = %e, "Progress forwarder task failed");
        }
    }
}
