//! Environment-driven configuration.
//!
//! All configuration is read from the environment exactly once at startup
//! and passed by reference afterwards; nothing re-reads variables mid-run.
//! Invalid numeric values are startup errors, not silent defaults.

use swarm_channel::ChannelConfig;

use crate::error::CoreError;

/// Built-in pool of agent display names, indexed by `AGENT_INDEX`.
const NAME_POOL: [&str; 12] = [
    "Vela", "Lyra", "Altair", "Mira", "Rigel", "Deneb", "Capella", "Atria", "Polaris",
    "Auriga", "Carina", "Sirius",
];

/// Complete node configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// This agent's index within the swarm (names, ports, roles derive
    /// from it).
    pub agent_index: u32,
    /// TCP port for the per-agent HTTP surface.
    pub agent_port: u16,
    /// Peer base URLs for gossip.
    pub peer_urls: Vec<String>,
    /// Path to the `SQLite` store; `None` disables persistence.
    pub db_path: Option<String>,
    /// Step interval when running light-only (no reasoning backend).
    pub sync_interval_ms: u64,
    /// Step interval when the reasoning backend is enabled.
    pub engineering_step_interval_ms: u64,
    /// Per-tick signal decay rate.
    pub pheromone_decay: f64,
    /// Critical density threshold for the phase transition.
    pub critical_density: f64,
    /// Reasoning-token budget per agent.
    pub token_budget: u64,
    /// Stop after this many steps; 0 means run forever.
    pub max_steps: u64,
    /// Steps to wait after a transition before the cycle reset.
    pub cycle_cooldown: u64,
    /// Number of agents assumed for density saturation.
    pub agent_count: usize,
    /// Reasoning provider name (`openai`, `anthropic`, ...); unset
    /// disables deep mode.
    pub reasoning_provider: Option<String>,
    /// Reasoning API base URL.
    pub reasoning_api_url: Option<String>,
    /// Reasoning API key.
    pub reasoning_api_key: Option<String>,
    /// Reasoning model identifier.
    pub reasoning_model: Option<String>,
    /// Cheaper model variant for the low-compute credit tier.
    pub reasoning_model_cheap: Option<String>,
    /// Data-source API key; unset selects the offline canned datasets.
    pub data_api_key: Option<String>,
    /// DA proxy base URL; unset disables dispersal.
    pub da_proxy_url: Option<String>,
    /// When true, write DA commitments back onto the local signal copy and
    /// re-gossip it; when false peers may permanently lack the commitment.
    pub da_commitment_writeback: bool,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Recognized variables (defaults in parentheses): `AGENT_INDEX` (0),
    /// `AGENT_PORT` (3001+index), `PEER_URLS` (empty, comma-separated),
    /// `DB_PATH` (unset), `SYNC_INTERVAL_MS` (2000),
    /// `ENGINEERING_STEP_INTERVAL_MS` (10000), `PHEROMONE_DECAY` (0.12),
    /// `CRITICAL_DENSITY` (0.55), `TOKEN_BUDGET_PER_AGENT` (50000),
    /// `MAX_STEPS` (0 = infinite), `CYCLE_COOLDOWN_STEPS` (18),
    /// `AGENT_COUNT` (peer count + 1), `REASONING_PROVIDER`,
    /// `REASONING_API_URL`, `REASONING_API_KEY`, `REASONING_MODEL`,
    /// `REASONING_MODEL_CHEAP`, `DATA_API_KEY`, `DA_PROXY_URL`,
    /// `DA_COMMITMENT_WRITEBACK` (false).
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(&|name| std::env::var(name).ok())
    }

    /// Load configuration through an injectable variable lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests supply maps.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let agent_index: u32 = parse_or(lookup, "AGENT_INDEX", 0)?;
        let default_port =
            3001u16.saturating_add(u16::try_from(agent_index).unwrap_or(u16::MAX));
        let agent_port: u16 = parse_or(lookup, "AGENT_PORT", default_port)?;

        let peer_urls: Vec<String> = lookup("PEER_URLS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_owned())
            .collect();

        let default_agent_count = peer_urls.len().saturating_add(1);

        Ok(Self {
            agent_index,
            agent_port,
            db_path: optional(lookup, "DB_PATH"),
            sync_interval_ms: parse_or(lookup, "SYNC_INTERVAL_MS", 2_000)?,
            engineering_step_interval_ms: parse_or(
                lookup,
                "ENGINEERING_STEP_INTERVAL_MS",
                10_000,
            )?,
            pheromone_decay: parse_or(lookup, "PHEROMONE_DECAY", 0.12)?,
            critical_density: parse_or(lookup, "CRITICAL_DENSITY", 0.55)?,
            token_budget: parse_or(lookup, "TOKEN_BUDGET_PER_AGENT", 50_000)?,
            max_steps: parse_or(lookup, "MAX_STEPS", 0)?,
            cycle_cooldown: parse_or(lookup, "CYCLE_COOLDOWN_STEPS", 18)?,
            agent_count: parse_or(lookup, "AGENT_COUNT", default_agent_count)?,
            reasoning_provider: optional(lookup, "REASONING_PROVIDER"),
            reasoning_api_url: optional(lookup, "REASONING_API_URL"),
            reasoning_api_key: optional(lookup, "REASONING_API_KEY"),
            reasoning_model: optional(lookup, "REASONING_MODEL"),
            reasoning_model_cheap: optional(lookup, "REASONING_MODEL_CHEAP"),
            data_api_key: optional(lookup, "DATA_API_KEY"),
            da_proxy_url: optional(lookup, "DA_PROXY_URL"),
            da_commitment_writeback: parse_or(lookup, "DA_COMMITMENT_WRITEBACK", false)?,
            peer_urls,
        })
    }

    /// This agent's stable string identity.
    pub fn agent_id(&self) -> String {
        format!("agent-{}", self.agent_index)
    }

    /// Display name drawn from the pool by index.
    pub fn agent_name(&self) -> String {
        let idx = usize::try_from(self.agent_index).unwrap_or(0) % NAME_POOL.len();
        NAME_POOL.get(idx).copied().unwrap_or("Vela").to_owned()
    }

    /// Seed role by index, cycling through the role table.
    pub fn agent_role(&self) -> swarm_types::AgentRole {
        let idx = usize::try_from(self.agent_index).unwrap_or(0)
            % swarm_types::AgentRole::ALL.len();
        swarm_types::AgentRole::ALL
            .get(idx)
            .copied()
            .unwrap_or(swarm_types::AgentRole::Explorer)
    }

    /// Whether the deep (reasoning-backed) mode is available at all.
    pub const fn engineering_enabled(&self) -> bool {
        self.reasoning_provider.is_some()
            && self.reasoning_api_url.is_some()
            && self.reasoning_api_key.is_some()
            && self.reasoning_model.is_some()
    }

    /// The single step interval for this run.
    ///
    /// Engineering runs use the longer interval to accommodate reasoning
    /// latency; light-only runs tick at the sync interval. There is no
    /// per-step flip on in-flight decisions.
    pub const fn step_interval_ms(&self) -> u64 {
        if self.engineering_enabled() {
            self.engineering_step_interval_ms
        } else {
            self.sync_interval_ms
        }
    }

    /// The channel configuration derived from the environment values.
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            decay_rate: self.pheromone_decay,
            critical_threshold: self.critical_density,
            ..ChannelConfig::default()
        }
    }
}

/// Read an optional variable, treating empty as unset.
fn optional(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Parse a variable or fall back to a default.
fn parse_or<T: std::str::FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, CoreError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::Config(format!("invalid {name}: {e}"))),
        None => Ok(default),
    }
}
