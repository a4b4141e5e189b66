//! Push feed subscription
//!
//! The relay keeps a streaming HTTP connection to the portal's push
//! gateway open: `{server_url}/{topic}/json` delivers one JSON frame per
//! line. Only `message` frames become push events; keepalives and other
//! service frames are skipped. The connection is re-established forever
//! with capped exponential backoff, so a flaky network never kills the
//! relay.

use chrono::Utc;
use flume::Sender;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FeedConfig;
use crate::errors::{AppError, AppResult, ErrorContextExt};
use crate::push::event::PushEvent;

/// One line of the feed stream
#[derive(Debug, Deserialize)]
struct FeedFrame {
    #[serde(default)]
    id: Option<String>,
    event: String,
    #[serde(default)]
    message: Option<String>,
}

/// Backoff schedule for feed reconnects
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl ReconnectPolicy {
    pub fn from_config(config: &FeedConfig) -> Self {
        ReconnectPolicy {
            base_delay_ms: config.reconnect_base_ms,
            max_delay_ms: config.reconnect_max_ms,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }

    /// Delay before the next connection attempt
    ///
    /// `attempt` counts consecutive failures; zero (clean end of stream)
    /// yields the base delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64;
        let delay = base * self.backoff_multiplier.powi(attempt as i32);
        let delay = delay.min(self.max_delay_ms as f64);

        let jitter = delay * self.jitter_factor * (rand::random::<f64>() - 0.5);
        let final_delay = (delay + jitter).max(0.0) as u64;

        Duration::from_millis(final_delay)
    }
}

/// Streaming subscriber feeding push events into the dispatch queue
pub struct FeedSubscriber {
    client: Client,
    subscribe_url: Url,
    auth_token: Option<String>,
    push_tx: Sender<PushEvent>,
    policy: ReconnectPolicy,
}

impl FeedSubscriber {
    pub fn new(config: &FeedConfig, push_tx: Sender<PushEvent>) -> AppResult<Self> {
        let mut builder = Client::builder();
        // A total request timeout would cut the long-lived stream, so only
        // the connect phase is bounded.
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .with_context("building push feed HTTP client")?;

        Ok(FeedSubscriber {
            client,
            subscribe_url: subscribe_url(&config.server_url, &config.topic)?,
            auth_token: config.auth_token.clone(),
            push_tx,
            policy: ReconnectPolicy::from_config(config),
        })
    }

    /// Subscribe, deliver events, reconnect until the dispatch queue goes
    /// away.
    pub async fn run(self) {
        let mut attempt: u32 = 0;
        loop {
            match self.stream_once().await {
                Ok(()) => {
                    attempt = 0;
                    info!("push feed closed by server, reconnecting");
                }
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    warn!("push feed error (attempt {attempt}): {e}");
                }
            }

            if self.push_tx.is_disconnected() {
                debug!("dispatch queue closed, stopping feed subscriber");
                break;
            }

            let delay = self.policy.delay_for(attempt);
            debug!("next feed connection attempt in {delay:?}");
            sleep(delay).await;
        }
    }

    /// One subscription: connect and consume frames until the stream ends
    async fn stream_once(&self) -> AppResult<()> {
        let url = self.subscribe_url.clone();
        let mut request = self.client.get(url.clone());
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| AppError::feed_connection(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FeedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        info!("subscribed to push feed at {url}");

        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::feed_connection(url.as_str(), e))?
        {
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(event) = parse_line(&line) {
                    self.push_tx
                        .send_async(event)
                        .await
                        .map_err(|_| AppError::feed("dispatch queue closed"))?;
                }
            }
        }

        Ok(())
    }
}

/// Turn one feed line into a push event, if it carries one
///
/// Service frames (`open`, `keepalive`, ...) and malformed lines are
/// skipped; a bad line must never take the stream down with it.
pub(crate) fn parse_line(line: &[u8]) -> Option<PushEvent> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_slice::<FeedFrame>(trimmed) {
        Ok(frame) if frame.event == "message" => Some(PushEvent {
            id: frame.id,
            data: frame.message.map(String::into_bytes),
            received_at: Utc::now(),
        }),
        Ok(frame) => {
            debug!("skipping feed frame of type '{}'", frame.event);
            None
        }
        Err(err) => {
            warn!("skipping malformed feed frame: {err}");
            None
        }
    }
}

fn subscribe_url(server_url: &str, topic: &str) -> AppResult<Url> {
    let base = Url::parse(server_url)
        .map_err(|e| AppError::invalid_config_value("feed.server_url", server_url, e))?;
    base.join(&format!("{topic}/json"))
        .map_err(|e| AppError::invalid_config_value("feed.topic", topic, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_frame() {
        let line = br#"{"id":"m1","event":"message","message":"{\"title\":\"T\"}"}"#;
        let event = parse_line(line).unwrap();
        assert_eq!(event.id.as_deref(), Some("m1"));
        assert_eq!(event.data.as_deref(), Some(br#"{"title":"T"}"#.as_slice()));
    }

    #[test]
    fn test_parse_message_frame_without_body() {
        let event = parse_line(br#"{"event":"message"}"#).unwrap();
        assert!(event.data.is_none());
    }

    #[test]
    fn test_keepalive_frames_are_skipped() {
        assert!(parse_line(br#"{"event":"keepalive"}"#).is_none());
        assert!(parse_line(br#"{"event":"open"}"#).is_none());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        assert!(parse_line(b"not json at all").is_none());
        assert!(parse_line(b"").is_none());
        assert!(parse_line(b"   \r\n").is_none());
    }

    #[test]
    fn test_subscribe_url_joins_topic() {
        let url = subscribe_url("https://push.example.com", "portal-updates").unwrap();
        assert_eq!(url.as_str(), "https://push.example.com/portal-updates/json");
    }

    #[test]
    fn test_subscribe_url_rejects_bad_server() {
        assert!(subscribe_url("push.example.com", "topic").is_err());
    }

    #[test]
    fn test_reconnect_delay_grows_and_caps() {
        let policy = ReconnectPolicy {
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(10), Duration::from_millis(1_000));
    }
}
