use async_trait::async_trait;
use common::mq::{Message, MessageError};
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::error::MqError;

/// Raw payloads received on one channel.
pub type PayloadStream = BoxStream<'static, String>;

/// Decoded messages received on one channel. Undecodable payloads are
/// yielded as errors so the consumer can log and skip them.
pub type MessageStream<M> = BoxStream<'static, Result<M, MessageError>>;

/// Publish/subscribe transport.
///
/// Delivery is at-most-once per subscriber: a message published while nobody
/// is subscribed is dropped, and missed messages are never replayed.
#[async_trait]
pub trait NotificationBus: Send + Sync {
    /// Fire-and-forget publish. Never waits for a subscriber.
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), MqError>;

    /// Establish a subscription. The subscription is active once this returns.
    ///
    /// The stream ends when the underlying connection is lost.
    async fn subscribe(&self, channel: &str) -> Result<PayloadStream, MqError>;
}

/// Extension trait for typed messages.
/// Automatically implemented for any T that implements NotificationBus.
#[async_trait]
pub trait NotificationBusExt: NotificationBus {
    async fn publish_message<M>(&self, message: &M) -> Result<(), MqError>
    where
        M: Message,
    {
        self.publish(M::topic().as_str(), &message.encode()).await
    }

    async fn subscribe_messages<M>(&self) -> Result<MessageStream<M>, MqError>
    where
        M: Message + 'static,
    {
        let payloads = self.subscribe(M::topic().as_str()).await?;
        Ok(payloads.map(|payload| M::decode(&payload)).boxed())
    }
}

// Blanket implementation
impl<T: ?Sized + NotificationBus> NotificationBusExt for T {}
