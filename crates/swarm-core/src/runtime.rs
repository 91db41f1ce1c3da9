//! The per-agent runtime: one tick at a time, no exceptions escaping.
//!
//! Each tick runs the pipeline of the gossip variant:
//!
//! 1. Decay the channel, recompute density, evaluate the transition
//!    trigger (synthesizing a collective memory when it latches).
//! 2. Advance the step counter and move.
//! 3. Absorb foreign signals (with channel positive feedback).
//! 4. Pick deep or light mode under budget and credit-tier gates.
//! 5. Deep: think, decide, execute, emit. Light: scan a dataset and emit.
//! 6. Check agent-local synchronization.
//! 7. Cycle-reset after the post-transition cooldown.
//! 8. Persist every tenth step, best effort.
//!
//! Every fallible call inside a tick is caught and reduced to a degraded
//! result; the loop driver (`swarm-node`) owns gossip pull/push and the
//! sleep between ticks.

use std::sync::{Arc, Mutex};

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use swarm_agents::{
    absorb, decision, movement, strong_unabsorbed, AgentState, WorldBounds,
};
use swarm_channel::SignalChannel;
use swarm_identity::AgentKeypair;
use swarm_ledger::CreditLedger;
use swarm_reasoning::{
    BackendConfig, DaSink, DataSource, GatedReasoner, PromptEngine, ReasonOptions,
    ReasoningBackend,
};
use swarm_store::SwarmStore;
use swarm_types::{
    AgentAction, Artifact, CollectiveMemory, DecisionStatus, Signal, SignalId, Thought,
};

use crate::collective;
use crate::config::Config;
use crate::error::CoreError;
use crate::parse;
use crate::snapshot::{AgentSnapshot, IdentityInfo};

/// The channel handle shared between the tick loop and the inbound gossip
/// handler. Both sides serialize on this mutex.
pub type SharedChannel = Arc<Mutex<SignalChannel>>;

/// Softmax temperature for decision selection.
const SELECT_TEMPERATURE: f64 = 0.3;

/// Steps between best-effort persistence flushes.
const PERSIST_EVERY: u64 = 10;

/// Which path a tick took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// Reasoning-backed think/decide/execute.
    Deep,
    /// Dataset scan without the reasoning backend.
    Light,
}

/// Summary of one tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// The step that was executed.
    pub step: u64,
    /// The mode the step ran in.
    pub mode: StepMode,
    /// Density after integration and decay.
    pub density: f64,
    /// Whether the transition latched during this tick.
    pub transitioned: bool,
    /// Whether the post-transition cycle reset fired.
    pub cycle_reset: bool,
    /// Signals emitted this tick.
    pub emitted: usize,
}

/// Everything one agent process owns.
pub struct AgentRuntime {
    config: Config,
    /// The agent's mutable state. Public for the driver's read projections;
    /// nothing else may hold a reference across ticks.
    pub state: AgentState,
    keypair: AgentKeypair,
    channel: SharedChannel,
    reasoner: Arc<GatedReasoner>,
    prompts: Arc<PromptEngine>,
    datasource: Arc<DataSource>,
    da: Arc<DaSink>,
    store: Option<SwarmStore>,
    outbound_tx: mpsc::UnboundedSender<Signal>,
    memories: Vec<CollectiveMemory>,
    last_emitted: Option<Signal>,
    bounds: WorldBounds,
    emitted_this_tick: usize,
}

impl AgentRuntime {
    /// Assemble a runtime from configuration.
    ///
    /// Returns the runtime plus the receiver end of the outbound signal
    /// queue; the driver drains it into gossip pushes after each tick.
    pub fn new(
        config: Config,
        channel: SharedChannel,
        store: Option<SwarmStore>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Signal>), CoreError> {
        let keypair = AgentKeypair::generate();

        let backend = if config.engineering_enabled() {
            let (Some(provider), Some(api_url), Some(api_key), Some(model)) = (
                config.reasoning_provider.clone(),
                config.reasoning_api_url.clone(),
                config.reasoning_api_key.clone(),
                config.reasoning_model.clone(),
            ) else {
                return Err(CoreError::Config(String::from(
                    "incomplete reasoning configuration",
                )));
            };
            ReasoningBackend::from_provider(
                &provider,
                BackendConfig {
                    api_url,
                    api_key,
                    model,
                    cheap_model: config.reasoning_model_cheap.clone(),
                },
            )?
        } else {
            ReasoningBackend::Disabled
        };

        let prompts = PromptEngine::new()?;

        let mut rng = rand::rng();
        let state = AgentState::new(
            config.agent_id().into(),
            config.agent_name(),
            config.agent_role(),
            keypair.public_key_hex().to_owned(),
            keypair.fingerprint().to_owned(),
            config.token_budget,
            CreditLedger::default(),
            &mut rng,
        );

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok((
            Self {
                datasource: Arc::new(DataSource::new(config.data_api_key.clone())),
                da: Arc::new(DaSink::new(config.da_proxy_url.clone())),
                reasoner: Arc::new(GatedReasoner::new(backend)),
                prompts: Arc::new(prompts),
                config,
                state,
                keypair,
                channel,
                store,
                outbound_tx,
                memories: Vec::new(),
                last_emitted: None,
                bounds: WorldBounds::default(),
                emitted_this_tick: 0,
            },
            outbound_rx,
        ))
    }

    /// The runtime's configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The shared channel handle (for the HTTP deposit path).
    pub fn channel(&self) -> SharedChannel {
        Arc::clone(&self.channel)
    }

    /// Best-effort restore of a previous run from the store.
    ///
    /// Reloads the agent state (refreshing identity material, since the
    /// private key never persists) and replays stored signals into the
    /// channel. Failures are logged and ignored.
    pub async fn restore_from_store(&mut self) {
        let Some(store) = &self.store else {
            return;
        };

        match store.load_agent(&self.state.id).await {
            Ok(Some(mut restored)) => {
                restored.public_key = self.keypair.public_key_hex().to_owned();
                restored.fingerprint = self.keypair.fingerprint().to_owned();
                restored.current_decision = None;
                info!(step = restored.step_count, "agent state restored");
                self.state = restored;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "agent restore failed"),
        }

        match store.load_signals().await {
            Ok(signals) => {
                let count = signals.len();
                self.with_channel(|c| {
                    for signal in signals {
                        c.deposit(signal);
                    }
                });
                if count > 0 {
                    debug!(count, "persisted signals replayed into channel");
                }
            }
            Err(e) => warn!(error = %e, "signal restore failed"),
        }
    }

    /// Execute one complete tick.
    pub async fn run_tick(&mut self) -> TickOutcome {
        self.emitted_this_tick = 0;

        // --- Channel upkeep: decay, density, transition trigger ---
        let (density, should_transition) = self
            .with_channel(|c| {
                c.decay();
                let density = c.recompute_density(self.config.agent_count);
                (density, c.should_transition())
            })
            .unwrap_or((0.0, false));

        let mut transitioned = false;
        if should_transition {
            let step = self.state.step_count;
            self.with_channel(|c| c.mark_transition(step));
            transitioned = true;
            self.run_synthesis().await;
        }

        // --- Step bookkeeping and movement ---
        self.state.step_count = self.state.step_count.saturating_add(1);
        let latched = self
            .with_channel(|c| c.phase_transition_occurred())
            .unwrap_or(false);
        {
            let mut rng = rand::rng();
            let strong = self
                .with_channel(|c| strong_unabsorbed(&self.state, c))
                .unwrap_or_default();
            movement::step(&mut self.state, &strong, latched, &self.bounds, &mut rng);

            // --- Absorption ---
            // The absorb call mutates both the agent state and the channel,
            // so it locks directly instead of going through with_channel.
            let channel = Arc::clone(&self.channel);
            let accepted = channel
                .lock()
                .ok()
                .map(|mut c| absorb(&mut self.state, &mut c, &mut rng))
                .unwrap_or_default();
            if !accepted.is_empty() {
                debug!(count = accepted.len(), "signals absorbed");
            }
        }

        // --- Mode gate and the step body ---
        let mode = self.pick_mode();
        match mode {
            StepMode::Deep => self.deep_step().await,
            StepMode::Light => self.light_step().await,
        }

        // --- One-shot distress on credit starvation ---
        if self.state.credits.take_distress() {
            let content = format!("{} is out of reasoning credits", self.state.name);
            self.emit(content, String::from("distress"), 0.2, Vec::new(), None)
                .await;
        }

        // --- Synchronization check ---
        let density_now = self
            .with_channel(|c| c.recompute_density(self.config.agent_count))
            .unwrap_or(density);
        if self
            .state
            .check_sync(density_now, self.config.critical_density)
        {
            info!(step = self.state.step_count, "agent synchronized");
        }

        // --- Cycle reset after cooldown ---
        let mut cycle_reset = false;
        let transition_step = self.with_channel(|c| c.transition_step()).unwrap_or(None);
        if let Some(at) = transition_step {
            if self.state.step_count.saturating_sub(at) >= self.config.cycle_cooldown {
                self.with_channel(SignalChannel::reset);
                let mut rng = rand::rng();
                self.state.reset_cycle(&mut rng);
                cycle_reset = true;
                info!(step = self.state.step_count, "cycle reset");
            }
        }

        // --- Best-effort persistence ---
        if self.state.step_count % PERSIST_EVERY == 0 {
            self.persist().await;
        }

        TickOutcome {
            step: self.state.step_count,
            mode,
            density: density_now,
            transitioned,
            cycle_reset,
            emitted: self.emitted_this_tick,
        }
    }

    /// Deep mode gate: engineering on, budget left, tier allows, and the
    /// warm-up Bernoulli (`min(0.85, step/40)`) fires.
    fn pick_mode(&self) -> StepMode {
        if !self.config.engineering_enabled()
            || self.state.tokens_used >= self.state.token_budget
            || !self.state.credits.tier().allows_reasoning()
        {
            return StepMode::Light;
        }
        let step = f64::from(u32::try_from(self.state.step_count).unwrap_or(u32::MAX));
        let p = (step / 40.0).min(0.85);
        let mut rng = rand::rng();
        if rng.random_bool(p.clamp(0.0, 1.0)) {
            StepMode::Deep
        } else {
            StepMode::Light
        }
    }

    // -- deep path --------------------------------------------------------

    /// Think, decide, execute, and emit on success.
    async fn deep_step(&mut self) {
        let thought = self.think().await;
        self.state.thoughts.push(thought.clone());
        if let Some(store) = &self.store {
            if let Err(e) = store.save_thought(&thought).await {
                warn!(error = %e, "thought persistence failed");
            }
        }

        // Decide.
        let datasets = self.datasource.cached();
        let channel_len = self.with_channel(|c| c.len()).unwrap_or(0);
        let latched = self
            .with_channel(|c| c.phase_transition_occurred())
            .unwrap_or(false);
        let selected = {
            let mut rng = rand::rng();
            let candidates = decision::generate_candidates(
                &self.state,
                channel_len,
                &datasets,
                latched,
                &mut rng,
            );
            decision::select_decision(&candidates, SELECT_TEMPERATURE, &mut rng)
        };
        let Some(candidate) = selected else {
            debug!("no affordable candidates this step");
            return;
        };

        let mut decided = candidate.into_decision(self.state.id.clone());
        decided.status = DecisionStatus::Executing;
        self.state.current_decision = Some(decided.clone());

        // Execute.
        let result = self.execute(&decided.action, &thought).await;

        decided.status = if result.success {
            DecisionStatus::Completed
        } else {
            DecisionStatus::Failed
        };
        decided.resolved_at = Some(chrono::Utc::now());
        if let Some(store) = &self.store {
            if let Err(e) = store.save_decision(&decided).await {
                warn!(error = %e, "decision persistence failed");
            }
        }
        let priority = decided.priority;
        self.state.decisions.push(decided);
        self.state.current_decision = None;

        // Emit on success with artifacts.
        if result.success {
            if let Some(artifact) = result.artifacts.first() {
                let strength = (0.65 + 0.3 * priority).min(1.0);
                let connections = self.recent_connections();
                self.emit(
                    artifact.body.clone(),
                    result.domain.clone(),
                    result.confidence,
                    connections,
                    Some(strength),
                )
                .await;
            }
        }
    }

    /// Produce a thought: synthesize absorbed signals for social agents,
    /// otherwise reason over the freshest observation available.
    async fn think(&mut self) -> Thought {
        let tier = self.state.credits.tier();
        let system = self
            .prompts
            .render_system(
                &self.state.name,
                &self.state.specialization,
                &self.state.personality,
            )
            .unwrap_or_default();

        let synthesizing =
            !self.state.absorbed.is_empty() && self.state.personality.sociability > 0.4;

        let (trigger, user) = if synthesizing {
            let projected: Vec<serde_json::Value> = self
                .state
                .knowledge
                .iter()
                .rev()
                .filter(|s| self.state.absorbed.contains(&s.id))
                .take(6)
                .map(|s| {
                    serde_json::json!({
                        "domain": s.domain,
                        "content": s.content,
                        "confidence": s.confidence,
                    })
                })
                .collect();
            let trigger = format!("synthesis of {} absorbed signals", projected.len());
            let user = self.prompts.render_synthesize(&projected).unwrap_or_default();
            (trigger, user)
        } else {
            let channel_len = self.with_channel(|c| c.len()).unwrap_or(0);
            let density = self.with_channel(|c| c.density()).unwrap_or(0.0);
            let observation = self
                .datasource
                .cached()
                .values()
                .next_back()
                .and_then(|d| d.highlights.first().cloned())
                .unwrap_or_else(|| {
                    format!("channel holds {channel_len} signals at density {density:.2}")
                });
            let trigger = String::from("step observation");
            let user = self
                .prompts
                .render_think(&trigger, &observation, &format!("step {}", self.state.step_count))
                .unwrap_or_default();
            (trigger, user)
        };

        let gated = self
            .reasoner
            .reason(tier, &system, &user, ReasonOptions::default())
            .await;
        self.state.charge_tokens(gated.reply.tokens_used);
        parse::parse_thought(&gated.reply.content, self.state.id.clone(), &trigger)
    }

    /// Dispatch one action. Data-source failures fail the decision; the
    /// caller records the failed status.
    async fn execute(&mut self, action: &AgentAction, thought: &Thought) -> ExecutionResult {
        match action {
            AgentAction::AnalyzeDataset { topic } => {
                let Some(dataset) = self.datasource.fetch_dataset(topic).await else {
                    return ExecutionResult::failure(topic.clone());
                };
                let observation = format!(
                    "{}: {}",
                    dataset.summary,
                    dataset.highlights.join("; ")
                );
                let analysis = self
                    .reason_over(&observation, &format!("analyze {topic}"))
                    .await;
                self.state.record_studied(&dataset.topic);
                self.state.discoveries = self.state.discoveries.saturating_add(1);
                ExecutionResult {
                    success: true,
                    domain: dataset.topic.clone(),
                    confidence: analysis.confidence.max(thought.confidence),
                    artifacts: vec![Artifact {
                        kind: String::from("analysis"),
                        label: dataset.title,
                        body: analysis.conclusion,
                    }],
                }
            }
            AgentAction::ShareFinding { finding, topic } => {
                // Sharing restates an existing conclusion; no backend call.
                let domain = topic.clone().unwrap_or_else(|| String::from("findings"));
                ExecutionResult {
                    success: true,
                    domain,
                    confidence: thought.confidence.max(0.5),
                    artifacts: vec![Artifact {
                        kind: String::from("finding"),
                        label: format!("{} shares a finding", self.state.name),
                        body: finding.clone(),
                    }],
                }
            }
            AgentAction::CorrelateFindings { topics } => {
                let mut summaries = Vec::new();
                for topic in topics {
                    match self.datasource.fetch_dataset(topic).await {
                        Some(dataset) => summaries.push(format!(
                            "{}: {}",
                            dataset.topic,
                            dataset.highlights.join("; ")
                        )),
                        None => return ExecutionResult::failure(topic.clone()),
                    }
                }
                let correlation = self
                    .reason_over(&summaries.join("\n"), "correlate datasets")
                    .await;
                self.state.discoveries = self.state.discoveries.saturating_add(1);
                ExecutionResult {
                    success: true,
                    domain: topics.first().cloned().unwrap_or_default(),
                    confidence: correlation.confidence,
                    artifacts: vec![Artifact {
                        kind: String::from("correlation"),
                        label: topics.join(" x "),
                        body: correlation.conclusion,
                    }],
                }
            }
            AgentAction::ExploreTopic { topic } => {
                let Some(dataset) = self.datasource.fetch_dataset(topic).await else {
                    return ExecutionResult::failure(topic.clone());
                };
                let survey = self
                    .reason_over(&dataset.summary, &format!("survey {topic}"))
                    .await;
                ExecutionResult {
                    success: true,
                    domain: dataset.topic,
                    confidence: survey.confidence.min(0.7),
                    artifacts: vec![Artifact {
                        kind: String::from("survey"),
                        label: format!("survey of {topic}"),
                        body: survey.conclusion,
                    }],
                }
            }
        }
    }

    /// One tier-gated reasoning call over an observation, parsed leniently.
    async fn reason_over(&mut self, observation: &str, trigger: &str) -> Thought {
        let tier = self.state.credits.tier();
        let system = self
            .prompts
            .render_system(
                &self.state.name,
                &self.state.specialization,
                &self.state.personality,
            )
            .unwrap_or_default();
        let user = self
            .prompts
            .render_think(trigger, observation, &format!("step {}", self.state.step_count))
            .unwrap_or_default();
        let gated = self
            .reasoner
            .reason(tier, &system, &user, ReasonOptions::default())
            .await;
        self.state.charge_tokens(gated.reply.tokens_used);
        let mut thought =
            parse::parse_thought(&gated.reply.content, self.state.id.clone(), trigger);
        if thought.conclusion.is_empty() {
            thought.conclusion = format!("{trigger}: {}", truncate(observation, 200));
        }
        thought
    }

    // -- light path -------------------------------------------------------

    /// Scan a dataset and emit a highlight without touching the backend.
    async fn light_step(&mut self) {
        let (fires, use_absorbed, confidence) = {
            let mut rng = rand::rng();
            let p = if self.state.synchronized { 0.75 } else { 0.45 };
            (
                rng.random_bool(p),
                rng.random_bool(0.55),
                rng.random_range(0.45..=0.75),
            )
        };
        if !fires {
            return;
        }

        let topic = if use_absorbed && !self.state.knowledge.is_empty() {
            let pick = {
                let mut rng = rand::rng();
                rng.random_range(0..self.state.knowledge.len())
            };
            self.state
                .knowledge
                .get(pick)
                .map(|s| s.domain.clone())
                .unwrap_or_else(|| self.current_target())
        } else {
            self.current_target()
        };

        let Some(dataset) = self.datasource.fetch_dataset(&topic).await else {
            debug!(topic, "light scan found no dataset");
            return;
        };

        let highlight = {
            let mut rng = rand::rng();
            let idx = rng.random_range(0..dataset.highlights.len().max(1));
            dataset.highlights.get(idx).cloned().unwrap_or_default()
        };
        if highlight.is_empty() {
            return;
        }

        let content = format!("{}: {highlight}", dataset.title);
        let connections = self.recent_connections();
        self.emit(content, dataset.topic, confidence, connections, None)
            .await;
    }

    /// The agent's current target topic: the latest studied one, or a
    /// random canonical topic before anything has been analyzed.
    fn current_target(&self) -> String {
        if let Some(last) = self.state.topics_studied.last() {
            return last.clone();
        }
        let mut rng = rand::rng();
        let idx = rng.random_range(0..swarm_types::CANONICAL_TOPICS.len());
        swarm_types::CANONICAL_TOPICS
            .get(idx)
            .copied()
            .unwrap_or("exoplanets")
            .to_owned()
    }

    // -- emit -------------------------------------------------------------

    /// Construct, sign, deposit, queue for gossip, and (optionally)
    /// disperse one signal.
    ///
    /// `strength` defaults to the light-mode formula `0.5 + 0.3 *
    /// confidence`; deep mode passes its priority-derived strength.
    async fn emit(
        &mut self,
        content: String,
        domain: String,
        confidence: f64,
        connections: Vec<SignalId>,
        strength: Option<f64>,
    ) {
        let timestamp = Signal::now_timestamp();
        let attestation = self
            .keypair
            .sign_attestation(&content, &self.state.id, timestamp);
        let signal = Signal {
            id: SignalId::new(),
            producer_id: self.state.id.clone(),
            content,
            domain,
            confidence,
            strength: strength
                .unwrap_or_else(|| 0.5 + 0.3 * confidence)
                .clamp(0.0, 1.0),
            connections,
            timestamp,
            attestation,
            producer_pubkey: Some(self.keypair.public_key_hex().to_owned()),
            da_commitment: None,
        };

        self.with_channel(|c| c.deposit(signal.clone()));
        if self.outbound_tx.send(signal.clone()).is_err() {
            debug!("outbound queue closed; gossip push skipped");
        }
        self.state.credits.earn_emission(confidence);
        self.last_emitted = Some(signal.clone());
        self.emitted_this_tick = self.emitted_this_tick.saturating_add(1);

        if let Some(store) = &self.store {
            if let Err(e) = store.save_signal(&signal).await {
                warn!(error = %e, "signal persistence failed");
            }
        }

        // Fire-and-forget DA dispersal. The commitment write-back (and the
        // resulting re-gossip) is behind the config knob; peers that
        // already integrated the signal will dedup the re-push by id.
        if self.da.is_enabled() {
            let da = Arc::clone(&self.da);
            let channel = Arc::clone(&self.channel);
            let outbound = self.outbound_tx.clone();
            let writeback = self.config.da_commitment_writeback;
            let blob = serde_json::to_vec(&signal).unwrap_or_default();
            let id = signal.id;
            tokio::spawn(async move {
                let Some(commitment) = da.disperse(&blob).await else {
                    return;
                };
                if !writeback {
                    return;
                }
                let updated = channel
                    .lock()
                    .ok()
                    .and_then(|mut c| c.set_da_commitment(&id, commitment));
                if let Some(updated) = updated {
                    let _ = outbound.send(updated);
                }
            });
        }

        debug!(step = self.state.step_count, "signal emitted");
    }

    /// Up to three of the most recently absorbed signal ids, as causal
    /// connections for an emission.
    fn recent_connections(&self) -> Vec<SignalId> {
        self.state.absorbed.iter().rev().take(3).copied().collect()
    }

    // -- synthesis and persistence ---------------------------------------

    /// Run collective synthesis over the current channel snapshot and
    /// credit this agent when it contributed.
    async fn run_synthesis(&mut self) {
        let signals = self.with_channel(|c| c.snapshot()).unwrap_or_default();
        let outcome = collective::synthesize(
            &signals,
            &self.state,
            &self.keypair,
            &self.reasoner,
            &self.prompts,
        )
        .await;

        let Some(outcome) = outcome else {
            return;
        };
        self.state.charge_tokens(outcome.tokens_used);
        if outcome.memory.contributors.contains(&self.state.id) {
            self.state.credits.earn_collective_bonus();
            self.state.contributions_to_collective =
                self.state.contributions_to_collective.saturating_add(1);
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.save_memory(&outcome.memory).await {
                warn!(error = %e, "memory persistence failed");
            }
        }
        self.memories.push(outcome.memory);
    }

    /// Best-effort agent state flush.
    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save_agent(&self.state).await {
            warn!(error = %e, "agent persistence failed");
        }
    }

    /// Flush once more on shutdown.
    pub async fn flush(&self) {
        self.persist().await;
    }

    // -- projections ------------------------------------------------------

    /// Build the read-API snapshot for the current tick.
    pub fn snapshot(&self) -> AgentSnapshot {
        let (density, latched, transition_step, channel_signals) = self
            .with_channel(|c| {
                (
                    c.density(),
                    c.phase_transition_occurred(),
                    c.transition_step(),
                    c.len(),
                )
            })
            .unwrap_or((0.0, false, None, 0));

        let mut thoughts: Vec<Thought> = self
            .state
            .thoughts
            .iter()
            .rev()
            .take(50)
            .cloned()
            .collect();
        thoughts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let decisions = self
            .state
            .decisions
            .iter()
            .rev()
            .take(20)
            .cloned()
            .collect();

        AgentSnapshot {
            id: self.state.id.to_string(),
            name: self.state.name.clone(),
            role: self.state.role,
            specialization: self.state.specialization.clone(),
            step: self.state.step_count,
            density,
            critical_threshold: self.config.critical_density,
            phase_transition_occurred: latched,
            transition_step,
            synchronized: self.state.synchronized,
            energy: self.state.energy,
            position: self.state.position,
            discoveries: self.state.discoveries,
            tokens_used: self.state.tokens_used,
            token_budget: self.state.token_budget,
            thought_count: self.state.thoughts.len(),
            latest_thought: self.state.thoughts.last().cloned(),
            thoughts,
            decisions,
            channel_signals,
            credits: self.state.credits.snapshot(),
            identity: IdentityInfo {
                agent_id: self.state.id.to_string(),
                name: self.state.name.clone(),
                public_key: self.keypair.public_key_hex().to_owned(),
                fingerprint: self.keypair.fingerprint().to_owned(),
                created_at: self.keypair.created_at().to_rfc3339(),
                tee_mode: false,
            },
            collective: self.memories.clone(),
            latest_signal: self.last_emitted.clone(),
            backend: self.reasoner.backend_name().to_owned(),
            da_enabled: self.da.is_enabled(),
        }
    }

    /// Run a closure under the channel lock, recovering from poisoning by
    /// skipping the operation.
    fn with_channel<R>(&self, f: impl FnOnce(&mut SignalChannel) -> R) -> Option<R> {
        self.channel.lock().ok().map(|mut guard| f(&mut guard))
    }
}

/// Result of executing one action.
struct ExecutionResult {
    success: bool,
    domain: String,
    confidence: f64,
    artifacts: Vec<Artifact>,
}

impl ExecutionResult {
    fn failure(domain: String) -> Self {
        Self {
            success: false,
            domain,
            confidence: 0.0,
            artifacts: Vec::new(),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
