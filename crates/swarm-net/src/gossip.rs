//! The gossip client: pull-on-tick and push-on-emit.
//!
//! Best-effort, timeout-bounded, fire-and-forget. Every peer request gets
//! its own 3 second deadline; requests to all peers are dispatched
//! concurrently and joined with settled semantics, so a dead peer costs at
//! most one deadline and never aborts the tick. Ordering is not promised
//! anywhere: dedup-by-id at the channel guarantees eventual set-equality.

use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use swarm_types::Signal;

/// Per-peer request deadline.
pub const PEER_DEADLINE: Duration = Duration::from_secs(3);

/// HTTP client over the peer set.
pub struct GossipClient {
    client: reqwest::Client,
    peers: Vec<String>,
}

impl GossipClient {
    /// Create a client over the given peer base URLs.
    pub fn new(peers: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            peers,
        }
    }

    /// The configured peer URLs.
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// Pull `/pheromones` from every peer concurrently.
    ///
    /// Failed peers are skipped silently (their state is unknown this
    /// tick); the result is the concatenation of every successful reply.
    pub async fn pull_all(&self) -> Vec<Signal> {
        let fetches = self.peers.iter().map(|peer| self.pull_one(peer));
        join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .flatten()
            .collect()
    }

    async fn pull_one(&self, peer: &str) -> Option<Vec<Signal>> {
        let url = format!("{peer}/pheromones");
        let response = self
            .client
            .get(&url)
            .timeout(PEER_DEADLINE)
            .send()
            .await
            .map_err(|e| debug!(peer, error = %e, "gossip pull failed"))
            .ok()?;
        if !response.status().is_success() {
            debug!(peer, status = %response.status(), "gossip pull rejected");
            return None;
        }
        response
            .json::<Vec<Signal>>()
            .await
            .map_err(|e| debug!(peer, error = %e, "gossip pull parse failed"))
            .ok()
    }

    /// Push one signal to every peer concurrently.
    ///
    /// Failures are logged and ignored.
    pub async fn push_all(&self, signal: &Signal) {
        let pushes = self.peers.iter().map(|peer| self.push_one(peer, signal));
        let results = join_all(pushes).await;
        let delivered = results.iter().filter(|ok| **ok).count();
        debug!(
            delivered,
            peers = self.peers.len(),
            "gossip push settled"
        );
    }

    async fn push_one(&self, peer: &str, signal: &Signal) -> bool {
        let url = format!("{peer}/pheromone");
        match self
            .client
            .post(&url)
            .timeout(PEER_DEADLINE)
            .json(signal)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(peer, status = %response.status(), "gossip push rejected");
                false
            }
            Err(e) => {
                warn!(peer, error = %e, "gossip push failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_peers_are_skipped_silently() {
        let client = GossipClient::new(vec![
            String::from("http://127.0.0.1:9"),
            String::from("http://127.0.0.1:10"),
        ]);
        // Both peers refuse connections: the pull settles to empty.
        assert!(client.pull_all().await.is_empty());
    }

    #[tokio::test]
    async fn empty_peer_set_is_a_noop() {
        let client = GossipClient::new(Vec::new());
        assert!(client.pull_all().await.is_empty());
        assert_eq!(client.peers().len(), 0);
    }
}
