//! Probabilistic signal absorption with positive feedback.
//!
//! Each tick an agent scans the channel for foreign, unabsorbed signals
//! above the minimum strength and accepts each independently with
//! probability `strength * 0.6`. Accepting a signal feeds back into the
//! channel: the source signal is boosted, which raises its odds of being
//! absorbed by the next observer. This loop is what tips the channel into
//! the phase transition.

use rand::Rng;

use swarm_channel::SignalChannel;
use swarm_types::Signal;

use crate::state::AgentState;

/// Minimum strength a signal needs to be considered for absorption.
const ABSORB_FLOOR: f64 = 0.2;

/// Acceptance probability per unit of strength.
const ABSORB_FACTOR: f64 = 0.6;

/// Strength boost applied to an absorbed signal's source.
const FEEDBACK_BOOST: f64 = 0.1;

/// Absorb eligible signals from the channel, returning the ones accepted
/// this tick.
///
/// Mutates both sides: the agent records the absorption (id, producer,
/// energy, knowledge) and the channel boosts each accepted signal's
/// strength by 0.1 (capped at 1).
pub fn absorb(
    state: &mut AgentState,
    channel: &mut SignalChannel,
    rng: &mut impl Rng,
) -> Vec<Signal> {
    let candidates: Vec<Signal> = channel
        .signals()
        .iter()
        .filter(|s| {
            s.producer_id != state.id
                && s.strength > ABSORB_FLOOR
                && !state.absorbed.contains(&s.id)
        })
        .cloned()
        .collect();

    let mut accepted = Vec::new();
    for signal in candidates {
        let p = (signal.strength * ABSORB_FACTOR).clamp(0.0, 1.0);
        if rng.random_bool(p) {
            channel.boost_strength(&signal.id, FEEDBACK_BOOST);
            state.record_absorption(signal.clone());
            accepted.push(signal);
        }
    }
    accepted
}

/// Foreign, unabsorbed signals with strength above 0.5, for the movement
/// perturbation.
pub fn strong_unabsorbed(state: &AgentState, channel: &SignalChannel) -> Vec<Signal> {
    channel
        .signals()
        .iter()
        .filter(|s| {
            s.producer_id != state.id && s.strength > 0.5 && !state.absorbed.contains(&s.id)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use swarm_ledger::CreditLedger;
    use swarm_types::{AgentId, AgentRole, SignalId};

    use super::*;

    fn make_state(rng: &mut SmallRng) -> AgentState {
        AgentState::new(
            AgentId::new("agent-0"),
            String::from("Nyx"),
            AgentRole::Connector,
            String::new(),
            String::new(),
            50_000,
            CreditLedger::default(),
            rng,
        )
    }

    fn make_signal(producer: &str, strength: f64) -> Signal {
        Signal {
            id: SignalId::new(),
            producer_id: AgentId::new(producer),
            content: String::from("finding"),
            domain: String::from("near_earth_objects"),
            confidence: 0.7,
            strength,
            connections: Vec::new(),
            timestamp: Signal::now_timestamp(),
            attestation: String::new(),
            producer_pubkey: None,
            da_commitment: None,
        }
    }

    #[test]
    fn own_signals_are_never_absorbed() {
        let mut rng = SmallRng::seed_from_u64(31);
        let mut state = make_state(&mut rng);
        let mut channel = SignalChannel::default();
        channel.deposit(make_signal("agent-0", 0.9));

        for _ in 0..100 {
            let accepted = absorb(&mut state, &mut channel, &mut rng);
            assert!(accepted.is_empty());
        }
    }

    #[test]
    fn weak_signals_are_skipped() {
        let mut rng = SmallRng::seed_from_u64(32);
        let mut state = make_state(&mut rng);
        let mut channel = SignalChannel::default();
        channel.deposit(make_signal("agent-1", 0.15));

        for _ in 0..100 {
            assert!(absorb(&mut state, &mut channel, &mut rng).is_empty());
        }
    }

    #[test]
    fn absorption_boosts_the_source() {
        let mut rng = SmallRng::seed_from_u64(33);
        let mut state = make_state(&mut rng);
        let mut channel = SignalChannel::default();
        let signal = make_signal("agent-1", 0.9);
        let id = signal.id;
        channel.deposit(signal);

        // strength 0.9 -> acceptance probability 0.54; try until it lands.
        let mut accepted = Vec::new();
        for _ in 0..200 {
            accepted = absorb(&mut state, &mut channel, &mut rng);
            if !accepted.is_empty() {
                break;
            }
        }
        assert_eq!(accepted.len(), 1);
        assert!(state.absorbed.contains(&id));
        assert!((channel.signals()[0].strength - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn absorbed_signals_are_not_reabsorbed() {
        let mut rng = SmallRng::seed_from_u64(34);
        let mut state = make_state(&mut rng);
        let mut channel = SignalChannel::default();
        channel.deposit(make_signal("agent-1", 1.0));

        let mut total = 0;
        for _ in 0..300 {
            total += absorb(&mut state, &mut channel, &mut rng).len();
        }
        assert_eq!(total, 1);
    }

    #[test]
    fn strong_unabsorbed_filter() {
        let mut rng = SmallRng::seed_from_u64(35);
        let mut state = make_state(&mut rng);
        let mut channel = SignalChannel::default();
        channel.deposit(make_signal("agent-0", 0.9)); // own
        channel.deposit(make_signal("agent-1", 0.4)); // too weak
        let strong = make_signal("agent-2", 0.8);
        let strong_id = strong.id;
        channel.deposit(strong);

        let filtered = strong_unabsorbed(&state, &channel);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, strong_id);

        state.absorbed.insert(strong_id);
        assert!(strong_unabsorbed(&state, &channel).is_empty());
    }
}
