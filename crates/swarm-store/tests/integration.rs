//! Integration tests for the `SQLite` store against an in-memory database.

#![allow(clippy::unwrap_used, missing_docs)]

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use swarm_agents::AgentState;
use swarm_ledger::CreditLedger;
use swarm_store::SwarmStore;
use swarm_types::{
    AgentAction, AgentId, AgentRole, CollectiveMemory, Decision, DecisionId, DecisionStatus,
    MemoryId, Signal, SignalId, Thought, ThoughtId,
};

fn agent_state(id: &str) -> AgentState {
    let mut rng = SmallRng::seed_from_u64(71);
    AgentState::new(
        AgentId::new(id),
        String::from("Kestrel"),
        AgentRole::Analyst,
        String::from("aa"),
        String::from("bb"),
        50_000,
        CreditLedger::default(),
        &mut rng,
    )
}

fn signal(producer: &str) -> Signal {
    Signal {
        id: SignalId::new(),
        producer_id: AgentId::new(producer),
        content: String::from("test content"),
        domain: String::from("exoplanets"),
        confidence: 0.7,
        strength: 0.6,
        connections: Vec::new(),
        timestamp: Signal::now_timestamp(),
        attestation: String::from("ed25519:00:00"),
        producer_pubkey: None,
        da_commitment: None,
    }
}

fn thought(producer: &str) -> Thought {
    Thought {
        id: ThoughtId::new(),
        producer_id: AgentId::new(producer),
        trigger: String::from("t"),
        observation: String::from("o"),
        reasoning: String::from("r"),
        conclusion: String::from("c"),
        suggested_actions: vec![String::from("analyze mars weather")],
        confidence: 0.8,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn agent_roundtrip() {
    let store = SwarmStore::open_in_memory().await.unwrap();
    let mut state = agent_state("agent-0");
    state.tokens_used = 1234;
    store.save_agent(&state).await.unwrap();

    let loaded = store.load_agent(&AgentId::new("agent-0")).await.unwrap();
    let loaded = loaded.unwrap();
    assert_eq!(loaded.tokens_used, 1234);
    assert_eq!(loaded.name, "Kestrel");

    assert!(store.load_agent(&AgentId::new("missing")).await.unwrap().is_none());
}

#[tokio::test]
async fn agent_save_is_idempotent_upsert() {
    let store = SwarmStore::open_in_memory().await.unwrap();
    let mut state = agent_state("agent-0");
    store.save_agent(&state).await.unwrap();
    state.tokens_used = 999;
    store.save_agent(&state).await.unwrap();

    let loaded = store.load_agent(&AgentId::new("agent-0")).await.unwrap().unwrap();
    assert_eq!(loaded.tokens_used, 999);
}

#[tokio::test]
async fn signal_dedup_by_primary_key() {
    let store = SwarmStore::open_in_memory().await.unwrap();
    let s = signal("agent-1");
    store.save_signal(&s).await.unwrap();
    store.save_signal(&s).await.unwrap();

    let loaded = store.load_signals().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.first().map(|x| x.id), Some(s.id));
}

#[tokio::test]
async fn thoughts_newest_first_with_limit() {
    let store = SwarmStore::open_in_memory().await.unwrap();
    for _ in 0..5 {
        store.save_thought(&thought("agent-0")).await.unwrap();
    }
    store.save_thought(&thought("agent-9")).await.unwrap();

    let loaded = store.load_thoughts(&AgentId::new("agent-0"), 3).await.unwrap();
    assert_eq!(loaded.len(), 3);
    for window in loaded.windows(2) {
        assert!(window[0].timestamp >= window[1].timestamp);
    }
}

#[tokio::test]
async fn decision_roundtrip() {
    let store = SwarmStore::open_in_memory().await.unwrap();
    let decision = Decision {
        id: DecisionId::new(),
        agent_id: AgentId::new("agent-0"),
        action: AgentAction::AnalyzeDataset {
            topic: String::from("solar_activity"),
        },
        priority: 0.8,
        estimated_tokens: 2_500,
        estimated_ms: 12_000,
        status: DecisionStatus::Completed,
        created_at: Utc::now(),
        resolved_at: Some(Utc::now()),
    };
    store.save_decision(&decision).await.unwrap();

    let loaded = store.load_decisions(&AgentId::new("agent-0"), 10).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.first().map(|d| d.status), Some(DecisionStatus::Completed));
}

#[tokio::test]
async fn memory_roundtrip() {
    let store = SwarmStore::open_in_memory().await.unwrap();
    let memory = CollectiveMemory {
        id: MemoryId::new(),
        topic: String::from("solar_activity"),
        synthesis: String::from("the swarm converged on flare forecasting"),
        contributors: vec![AgentId::new("agent-0"), AgentId::new("agent-1")],
        signal_ids: vec![SignalId::new()],
        confidence: 0.75,
        attestation: String::from("ed25519:00:00"),
        created_at: Utc::now(),
        report: None,
    };
    store.save_memory(&memory).await.unwrap();

    let loaded = store.load_memories().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.first().map(|m| m.contributors.len()), Some(2));
}
