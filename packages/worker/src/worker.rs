use std::future::Future;
use std::sync::Arc;

use common::mq::FileUploaded;
use futures::StreamExt;
use mq::{MessageStream, MqError, NotificationBus, NotificationBusExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::processor::FileProcessor;

/// Why [`Worker::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown signal fired.
    Shutdown,
    /// The subscription stream ended, e.g. the bus connection dropped.
    SubscriptionClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Notifications that carried a valid file id.
    pub received: u64,
    /// Notifications whose payload could not be decoded.
    pub rejected: u64,
    pub reason: StopReason,
}

/// Bridges `file-uploaded` notifications to the [`FileProcessor`].
pub struct Worker {
    processor: Arc<FileProcessor>,
    concurrency: usize,
}

impl Worker {
    /// `concurrency` bounds how many files are processed at once (minimum 1).
    pub fn new(processor: Arc<FileProcessor>, concurrency: usize) -> Self {
        Self {
            processor,
            concurrency: concurrency.max(1),
        }
    }

    /// Establish the `file-uploaded` subscription.
    ///
    /// A worker that is not subscribed strands every upload, so callers must
    /// treat an error here as fatal.
    pub async fn subscribe(
        bus: &dyn NotificationBus,
    ) -> Result<MessageStream<FileUploaded>, MqError> {
        bus.subscribe_messages::<FileUploaded>().await
    }

    /// Process notifications until `shutdown` resolves or the stream ends.
    ///
    /// Each notification triggers exactly one processing run; duplicates are
    /// not filtered. Files already in flight are allowed to finish before
    /// this returns.
    pub async fn run<F>(&self, mut messages: MessageStream<FileUploaded>, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut in_flight = JoinSet::new();
        let mut received = 0u64;
        let mut rejected = 0u64;

        tokio::pin!(shutdown);

        let reason = loop {
            let next = tokio::select! {
                _ = &mut shutdown => break StopReason::Shutdown,
                next = messages.next() => next,
            };

            let Some(message) = next else {
                break StopReason::SubscriptionClosed;
            };

            while let Some(joined) = in_flight.try_join_next() {
                log_join_error(joined);
            }

            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    rejected += 1;
                    warn!(error = %e, "Skipping undecodable notification");
                    continue;
                }
            };

            received += 1;
            debug!(file_id = %message.file_id, "Received notification");

            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break StopReason::Shutdown;
            };
            let processor = Arc::clone(&self.processor);
            in_flight.spawn(async move {
                let _permit = permit;
                processor.process(message.file_id).await;
            });
        };

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "Waiting for in-flight files");
        }
        while let Some(joined) = in_flight.join_next().await {
            log_join_error(joined);
        }

        RunSummary {
            received,
            rejected,
            reason,
        }
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Processing task aborted");
    }
}
