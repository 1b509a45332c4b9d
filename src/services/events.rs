//! Domain event publishing to NATS. Optional: without `NATS_URL` events are only logged.

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self {
        Self { nats }
    }

    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::default() };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(url, "Connected to NATS");
                Self::new(Some(client))
            }
            Err(e) => {
                tracing::warn!(error = %e, url, "NATS unavailable, events will only be logged");
                Self::default()
            }
        }
    }

    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.publish(&event).await;
        }
    }

    pub async fn publish(&self, event: &DomainEvent) {
        let subject = event.subject();
        tracing::debug!(subject = %subject, ?event, "Domain event");
        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, subject = %subject, "Failed to encode event");
                return;
            }
        };
        if let Err(e) = nats.publish(subject.clone(), payload.into()).await {
            tracing::warn!(error = %e, subject = %subject, "Failed to publish event");
        }
    }
}
