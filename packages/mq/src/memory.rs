use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use crate::bus::{NotificationBus, PayloadStream};
use crate::error::MqError;

const DEFAULT_CAPACITY: usize = 1024;

/// In-process bus built on broadcast channels, for tests and single-process
/// setups.
///
/// Mirrors the pub/sub semantics of the Redis transport: messages published
/// without subscribers are dropped. The most recent `capacity` published
/// messages are also kept so callers can inspect what went out.
pub struct MemoryBus {
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    published: Mutex<VecDeque<(String, String)>>,
    capacity: usize,
    unavailable: AtomicBool,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` bounds how far a subscriber may lag before messages are
    /// skipped, and how many published messages are remembered.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            published: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate a transport outage: publish and subscribe fail while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    /// Recently published payloads on `channel`, in publish order.
    pub async fn published(&self, channel: &str) -> Vec<String> {
        self.published
            .lock()
            .await
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .await
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop a channel, ending every open subscription stream on it.
    pub async fn close_channel(&self, channel: &str) {
        self.channels.lock().await.remove(channel);
    }

    fn is_unavailable(&self) -> bool {
        self.unavailable.load(Ordering::Acquire)
    }
}

#[async_trait]
impl NotificationBus for MemoryBus {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), MqError> {
        if self.is_unavailable() {
            return Err(MqError::Publish {
                channel: channel.to_string(),
                reason: "bus unavailable".into(),
            });
        }

        let receivers = match self.channels.lock().await.get(channel) {
            // A send error only means nobody is listening.
            Some(tx) => tx.send(payload.to_string()).unwrap_or(0),
            None => 0,
        };
        debug!(channel, receivers, "Published message");

        let mut published = self.published.lock().await;
        if published.len() == self.capacity {
            published.pop_front();
        }
        published.push_back((channel.to_string(), payload.to_string()));
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<PayloadStream, MqError> {
        if self.is_unavailable() {
            return Err(MqError::Subscribe {
                channel: channel.to_string(),
                reason: "bus unavailable".into(),
            });
        }

        let rx = self
            .channels
            .lock()
            .await
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        let channel = channel.to_string();
        let stream = futures::stream::unfold(rx, move |mut rx| {
            let channel = channel.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(payload) => return Some((payload, rx)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(
                                channel = %channel,
                                skipped,
                                "Subscriber lagged, messages dropped"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}
