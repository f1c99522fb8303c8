use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio_stream::wrappers::BroadcastStream;

use super::{EventError, EventPublisher, EventStream, EventSubscriber, OrderEvent};

const CHANNEL_CAPACITY: usize = 1024;

/// Process-local bus over a tokio broadcast channel. Also records every
/// published event so tests can assert on them.
#[derive(Clone)]
pub struct InMemoryEventBus {
    sender: broadcast::Sender<(String, OrderEvent)>,
    published: Arc<Mutex<Vec<(String, OrderEvent)>>>,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn published(&self) -> Vec<(String, OrderEvent)> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, topic: &str, event: &OrderEvent) -> Result<(), EventError> {
        self.published
            .lock()
            .await
            .push((topic.to_string(), event.clone()));

        // No subscribers is not an error.
        let _ = self.sender.send((topic.to_string(), event.clone()));
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for InMemoryEventBus {
    async fn subscribe(&self, topics: &[&str]) -> Result<EventStream, EventError> {
        let topics: Arc<Vec<String>> = Arc::new(topics.iter().map(|t| t.to_string()).collect());
        let stream = BroadcastStream::new(self.sender.subscribe()).filter_map(move |received| {
            let topics = Arc::clone(&topics);
            async move {
                match received {
                    Ok((topic, event)) if topics.contains(&topic) => Some((topic, event)),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "In-memory subscriber lagged; events dropped");
                        None
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}
