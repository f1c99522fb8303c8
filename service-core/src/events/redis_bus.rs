use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use secrecy::ExposeSecret;
use tracing::instrument;

use super::{EventError, EventPublisher, EventStream, EventSubscriber, OrderEvent};
use crate::config::RedisConfig;

/// Redis pub/sub transport. Publishing shares one managed connection;
/// each subscription opens its own pub/sub connection.
#[derive(Clone)]
pub struct RedisEventBus {
    client: redis::Client,
    publisher: ConnectionManager,
}

impl RedisEventBus {
    pub async fn connect(config: &RedisConfig) -> Result<Self, EventError> {
        let client = redis::Client::open(config.url.expose_secret().as_str())?;
        let publisher = ConnectionManager::new(client.clone()).await?;
        tracing::info!("Connected to Redis event bus");
        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl EventPublisher for RedisEventBus {
    #[instrument(skip(self, event), fields(order_id = %event.order_id))]
    async fn publish(&self, topic: &str, event: &OrderEvent) -> Result<(), EventError> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.publisher.clone();

        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(payload)
            .query_async(&mut conn)
            .await?;

        tracing::debug!(receivers, "Event published");
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for RedisEventBus {
    async fn subscribe(&self, topics: &[&str]) -> Result<EventStream, EventError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        for topic in topics {
            pubsub.subscribe(*topic).await?;
        }
        tracing::info!(topics = ?topics, "Subscribed to event topics");

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let topic = msg.get_channel_name().to_string();
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "Dropping unreadable event payload");
                    return None;
                }
            };

            match serde_json::from_str::<OrderEvent>(&payload) {
                Ok(event) => Some((topic, event)),
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "Dropping malformed event");
                    None
                }
            }
        });

        Ok(stream.boxed())
    }
}
