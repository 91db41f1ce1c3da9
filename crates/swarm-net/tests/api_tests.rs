//! Integration tests for the per-agent HTTP surface and the aggregator.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! binding a TCP port: routing, handler logic, and the gossip dedup
//! contract are all visible at that level.

#![allow(clippy::unwrap_used, missing_docs)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use swarm_channel::SignalChannel;
use swarm_core::{AgentSnapshot, IdentityInfo};
use swarm_identity::AgentKeypair;
use swarm_ledger::CreditLedger;
use swarm_net::{build_aggregator_router, build_router, AggregatorState, AppState};
use swarm_types::{AgentId, AgentRole, Signal, SignalId};

fn make_snapshot(keypair: &AgentKeypair, latest_signal: Option<Signal>) -> AgentSnapshot {
    AgentSnapshot {
        id: String::from("agent-0"),
        name: String::from("Vela"),
        role: AgentRole::Explorer,
        specialization: String::from("broad survey and topic discovery"),
        step: 7,
        density: 0.31,
        critical_threshold: 0.55,
        phase_transition_occurred: false,
        transition_step: None,
        synchronized: false,
        energy: 0.6,
        position: swarm_agents::Vec2::new(40.0, 60.0),
        discoveries: 2,
        tokens_used: 1_200,
        token_budget: 50_000,
        thought_count: 0,
        latest_thought: None,
        thoughts: Vec::new(),
        decisions: Vec::new(),
        channel_signals: 0,
        credits: CreditLedger::default().snapshot(),
        identity: IdentityInfo {
            agent_id: String::from("agent-0"),
            name: String::from("Vela"),
            public_key: keypair.public_key_hex().to_owned(),
            fingerprint: keypair.fingerprint().to_owned(),
            created_at: chrono::Utc::now().to_rfc3339(),
            tee_mode: false,
        },
        collective: Vec::new(),
        latest_signal,
        backend: String::from("disabled"),
        da_enabled: false,
    }
}

fn make_app(latest_signal: Option<Signal>) -> (axum::Router, Arc<AppState>) {
    let keypair = AgentKeypair::from_secret_bytes(&[3u8; 32]);
    let channel = Arc::new(Mutex::new(SignalChannel::default()));
    let state = Arc::new(AppState::new(make_snapshot(&keypair, latest_signal), channel));
    (build_router(Arc::clone(&state)), state)
}

fn signed_signal(keypair: &AgentKeypair) -> Signal {
    let producer = AgentId::new("agent-0");
    let content = String::from("pressure trending down across sols");
    let timestamp = Signal::now_timestamp();
    let attestation = keypair.sign_attestation(&content, &producer, timestamp);
    Signal {
        id: SignalId::new(),
        producer_id: producer,
        content,
        domain: String::from("mars_weather"),
        confidence: 0.8,
        strength: 0.74,
        connections: Vec::new(),
        timestamp,
        attestation,
        producer_pubkey: Some(keypair.public_key_hex().to_owned()),
        da_commitment: None,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_signal_request(signal: &Signal) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/pheromone")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(signal).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_agent_and_step() {
    let (router, _) = make_app(None);
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.get("ok").and_then(Value::as_bool), Some(true));
    assert_eq!(json.get("agent").and_then(Value::as_str), Some("agent-0"));
    assert_eq!(json.get("step").and_then(Value::as_u64), Some(7));
}

#[tokio::test]
async fn state_serves_camel_case_snapshot() {
    let (router, _) = make_app(None);
    let response = router
        .oneshot(Request::builder().uri("/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.get("tokenBudget").and_then(Value::as_u64), Some(50_000));
    assert_eq!(
        json.get("phaseTransitionOccurred").and_then(Value::as_bool),
        Some(false)
    );
    assert_eq!(
        json.get("criticalThreshold").and_then(Value::as_f64),
        Some(0.55)
    );
    assert!(json.get("identity").is_some());
}

#[tokio::test]
async fn pheromone_deposit_and_dedup() {
    let (router, state) = make_app(None);
    let keypair = AgentKeypair::from_secret_bytes(&[3u8; 32]);
    let signal = signed_signal(&keypair);

    // First deposit inserts, second is a no-op; both respond {ok: true}.
    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(post_signal_request(&signal))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.get("ok").and_then(Value::as_bool), Some(true));
    }

    let held = state.channel.lock().unwrap().len();
    assert_eq!(held, 1);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/pheromones")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn gossip_between_two_surfaces_dedups_by_id() {
    // Agent A holds one signal; replaying A's snapshot into B twice (two
    // redundant pulls) leaves B with exactly one copy.
    let (router_a, _state_a) = make_app(None);
    let (router_b, state_b) = make_app(None);
    let keypair = AgentKeypair::from_secret_bytes(&[3u8; 32]);
    let signal = signed_signal(&keypair);

    let response = router_a
        .clone()
        .oneshot(post_signal_request(&signal))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..2 {
        let response = router_a
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/pheromones")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let pulled: Vec<Signal> = serde_json::from_value(body_json(response).await).unwrap();
        for s in pulled {
            let response = router_b
                .clone()
                .oneshot(post_signal_request(&s))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    assert_eq!(state_b.channel.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_wire_fields_are_rejected_at_the_edge() {
    let (router, state) = make_app(None);
    let keypair = AgentKeypair::from_secret_bytes(&[3u8; 32]);
    let mut json = serde_json::to_value(signed_signal(&keypair)).unwrap();
    json.as_object_mut()
        .unwrap()
        .insert(String::from("surprise"), serde_json::json!(1));

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/pheromone")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(state.channel.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn attestation_endpoint_verifies_latest_signal() {
    let keypair = AgentKeypair::from_secret_bytes(&[3u8; 32]);
    let signal = signed_signal(&keypair);
    let (router, _) = make_app(Some(signal));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/attestation")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json.pointer("/verification/valid").and_then(Value::as_bool),
        Some(true)
    );
    assert_eq!(
        json.pointer("/compute/tokensUsed").and_then(Value::as_u64),
        Some(1_200)
    );
    assert_eq!(
        json.pointer("/da/enabled").and_then(Value::as_bool),
        Some(false)
    );
}

#[tokio::test]
async fn thoughts_and_collective_start_empty() {
    let (router, _) = make_app(None);
    for path in ["/thoughts", "/collective"] {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().map(Vec::len), Some(0));
    }
}

#[tokio::test]
async fn aggregator_inject_with_no_agents_delivers_zero() {
    let state = Arc::new(AggregatorState::new(Vec::new()));
    let router = build_aggregator_router(state);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/inject")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"topic": "solar_activity"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.get("ok").and_then(Value::as_bool), Some(true));
    assert_eq!(json.get("delivered").and_then(Value::as_u64), Some(0));
}

#[tokio::test]
async fn aggregator_state_with_no_agents_is_empty_but_well_formed() {
    let state = Arc::new(AggregatorState::new(Vec::new()));
    let router = build_aggregator_router(state);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/state")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.get("agentCount").and_then(Value::as_u64), Some(0));
    assert_eq!(
        json.get("phaseTransitionOccurred").and_then(Value::as_bool),
        Some(false)
    );
}
