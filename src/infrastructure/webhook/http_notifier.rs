use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::application::ports::{EventNotifier, JobEvent};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    /// Event kinds to deliver; empty means all.
    pub events: Vec<String>,
    pub secret: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// Delivers lifecycle events to the configured endpoint. At-least-once
/// with bounded retries: a delivery fails on transport error, non-2xx,
/// or timeout; after the final attempt the event is dropped and logged.
/// Retries run inline on the worker thread firing the event.
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn subscribed(&self, event: &JobEvent) -> bool {
        self.config.events.is_empty() || self.config.events.iter().any(|e| e == &event.event)
    }

    async fn attempt(&self, event: &JobEvent) -> Result<(), String> {
        let mut request = self
            .client
            .post(&self.config.url)
            .timeout(self.config.timeout)
            .json(event);

        if let Some(secret) = &self.config.secret {
            request = request.header("X-Webhook-Secret", secret);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("status {}", response.status()))
        }
    }
}

#[async_trait]
impl EventNotifier for WebhookNotifier {
    async fn notify(&self, event: &JobEvent) {
        if !self.subscribed(event) {
            return;
        }

        let mut backoff = INITIAL_BACKOFF;
        let attempts = 1 + self.config.max_retries;

        for attempt in 1..=attempts {
            match self.attempt(event).await {
                Ok(()) => {
                    tracing::debug!(
                        event = %event.event,
                        job_id = %event.job_id,
                        attempt,
                        "Webhook delivered"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        event = %event.event,
                        job_id = %event.job_id,
                        attempt,
                        error = %e,
                        "Webhook delivery attempt failed"
                    );
                }
            }

            if attempt < attempts {
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }

        tracing::error!(
            event = %event.event,
            job_id = %event.job_id,
            attempts,
            "Webhook dropped after final attempt"
        );
    }
}
