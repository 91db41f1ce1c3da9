//! Role-seeded personality generation.
//!
//! Each agent role maps to a fixed preset; the preset is jittered by up to
//! ±0.04 per trait at creation so no two agents are exactly alike. Traits
//! are clamped to `[0, 1]` and immutable afterwards.

use rand::Rng;

use swarm_types::{AgentRole, Personality};

/// Maximum jitter applied to each preset trait.
const JITTER: f64 = 0.04;

/// The fixed preset for a role, before jitter.
pub const fn preset(role: AgentRole) -> Personality {
    match role {
        AgentRole::Explorer => Personality {
            curiosity: 0.90,
            diligence: 0.40,
            boldness: 0.70,
            sociability: 0.50,
        },
        AgentRole::Analyst => Personality {
            curiosity: 0.60,
            diligence: 0.90,
            boldness: 0.40,
            sociability: 0.40,
        },
        AgentRole::Synthesizer => Personality {
            curiosity: 0.50,
            diligence: 0.60,
            boldness: 0.50,
            sociability: 0.90,
        },
        AgentRole::Connector => Personality {
            curiosity: 0.70,
            diligence: 0.50,
            boldness: 0.80,
            sociability: 0.70,
        },
        AgentRole::Skeptic => Personality {
            curiosity: 0.50,
            diligence: 0.85,
            boldness: 0.30,
            sociability: 0.45,
        },
    }
}

/// Seed a personality for a role and jitter each trait by ±0.04.
pub fn seeded(role: AgentRole, rng: &mut impl Rng) -> Personality {
    let base = preset(role);
    Personality {
        curiosity: jittered(base.curiosity, rng),
        diligence: jittered(base.diligence, rng),
        boldness: jittered(base.boldness, rng),
        sociability: jittered(base.sociability, rng),
    }
}

fn jittered(value: f64, rng: &mut impl Rng) -> f64 {
    (value + rng.random_range(-JITTER..=JITTER)).clamp(0.0, 1.0)
}
