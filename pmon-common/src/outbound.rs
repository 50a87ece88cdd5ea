//! Outbound HTTP sends to downstream stages
//!
//! All sends are fire-and-forget with a short timeout: callers log a failed
//! send and move on (at-most-once delivery, no retry queue).

use crate::config::OutboundConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("pmon/", env!("CARGO_PKG_VERSION"));

/// Downstream delivery seam
///
/// Production code uses [`HttpOutbound`]; tests substitute a recorder.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// POST a JSON body; any non-2xx status is an error
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<()>;
}

/// reqwest-backed outbound client
pub struct HttpOutbound {
    http_client: reqwest::Client,
}

impl HttpOutbound {
    pub fn new(config: &OutboundConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Outbound for HttpOutbound {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<()> {
        let response = self.http_client.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Http(format!(
                "{} responded {}: {}",
                url,
                status.as_u16(),
                error_text
            )));
        }

        debug!(url = url, status = status.as_u16(), "Outbound send accepted");
        Ok(())
    }
}

/// Serialize `payload` and send it through `outbound`
pub async fn send_json<T: Serialize + ?Sized>(
    outbound: &dyn Outbound,
    url: &str,
    payload: &T,
) -> Result<()> {
    let body = serde_json::to_value(payload)?;
    outbound.post_json(url, &body).await
}
