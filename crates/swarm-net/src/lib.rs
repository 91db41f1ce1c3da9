//! HTTP transport for the Swarm coordination substrate.
//!
//! Three pieces share this crate:
//!
//! - the per-agent read surface + inbound gossip deposit ([`router`],
//!   [`handlers`], [`state`])
//! - the outbound gossip client ([`gossip`]): pull-on-tick, push-on-emit,
//!   per-request deadlines, settled semantics
//! - the optional presentation [`aggregator`]: fan-out + merge over all
//!   agent surfaces, plus the `/api/inject` write path

pub mod aggregator;
pub mod error;
pub mod gossip;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use aggregator::{build_aggregator_router, AggregatorState};
pub use error::NetError;
pub use gossip::GossipClient;
pub use router::build_router;
pub use server::{serve, ServerError};
pub use state::AppState;
