//! Fire-and-forget data-availability dispersal client.
//!
//! Emitted signals are optionally dispersed to a DA proxy which answers
//! with an opaque commitment string. Dispersal is best-effort: the sink is
//! disabled when `DA_PROXY_URL` is unset, every failure collapses to
//! `None`, and nobody retries. Whether the returned commitment is written
//! back onto the already-gossiped signal is the loop's decision, behind a
//! configuration knob.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

/// Per-request deadline for dispersal calls.
const DISPERSE_DEADLINE: Duration = Duration::from_secs(10);

/// Client over the DA proxy.
pub struct DaSink {
    client: reqwest::Client,
    proxy_url: Option<String>,
}

impl DaSink {
    /// Create a sink; `proxy_url = None` disables dispersal entirely.
    pub fn new(proxy_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            proxy_url,
        }
    }

    /// Whether dispersal is configured.
    pub const fn is_enabled(&self) -> bool {
        self.proxy_url.is_some()
    }

    /// Disperse a blob and return the proxy's commitment, if any.
    ///
    /// Every failure mode -- disabled sink, network error, bad status,
    /// missing commitment field -- is `None`. Overflow drops silently.
    pub async fn disperse(&self, blob: &[u8]) -> Option<String> {
        let base = self.proxy_url.as_deref()?;
        let url = format!("{}/disperse", base.trim_end_matches('/'));

        let body = serde_json::json!({ "data": hex::encode(blob) });
        let response = self
            .client
            .post(&url)
            .timeout(DISPERSE_DEADLINE)
            .json(&body)
            .send()
            .await
            .map_err(|e| debug!(error = %e, "da dispersal failed"))
            .ok()?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "da proxy rejected dispersal");
            return None;
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| debug!(error = %e, "da response parse failed"))
            .ok()?;
        let commitment = json
            .get("commitment")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        if commitment.is_none() {
            debug!("da response missing commitment");
        }
        commitment
    }
}
