use std::time::Duration;

use async_trait::async_trait;
use common::config::MqAppConfig;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::{debug, info, warn};

use crate::bus::{NotificationBus, PayloadStream};
use crate::error::MqError;

/// Redis pub/sub transport.
///
/// Publishing goes through one shared multiplexed connection; every
/// subscription opens its own dedicated pub/sub connection.
pub struct RedisBus {
    client: redis::Client,
    publisher: MultiplexedConnection,
    publish_timeout: Duration,
}

impl RedisBus {
    pub async fn connect(config: &MqAppConfig) -> Result<Self, MqError> {
        let client = redis::Client::open(config.url.as_str())?;
        let publisher = client.get_multiplexed_async_connection().await?;

        info!(url = %config.url, "Notification bus connected");

        Ok(Self {
            client,
            publisher,
            publish_timeout: Duration::from_millis(config.publish_timeout_ms),
        })
    }
}

#[async_trait]
impl NotificationBus for RedisBus {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), MqError> {
        let mut conn = self.publisher.clone();
        let publish = conn.publish(channel, payload);

        let receivers: i64 = tokio::time::timeout(self.publish_timeout, publish)
            .await
            .map_err(|_| MqError::Timeout {
                channel: channel.to_string(),
                timeout: self.publish_timeout,
            })?
            .map_err(|e| MqError::Publish {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;

        debug!(channel, receivers, "Published message");
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<PayloadStream, MqError> {
        let subscribe_err = |e: redis::RedisError| MqError::Subscribe {
            channel: channel.to_string(),
            reason: e.to_string(),
        };

        let mut pubsub = self.client.get_async_pubsub().await.map_err(subscribe_err)?;
        pubsub.subscribe(channel).await.map_err(subscribe_err)?;

        info!(channel, "Subscribed to channel");

        let channel = channel.to_string();
        let stream = pubsub.into_on_message().filter_map(move |msg| {
            let payload = msg.get_payload::<String>();
            let channel = channel.clone();
            async move {
                match payload {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        warn!(channel = %channel, error = %e, "Dropping non-text payload");
                        None
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}
