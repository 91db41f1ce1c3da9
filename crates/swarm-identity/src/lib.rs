//! Agent keypairs and signal attestations.
//!
//! Every agent generates an Ed25519 keypair at startup. The public key is
//! exposed over the read API; the private key never leaves the process. An
//! attestation is the string `"ed25519:<sig>:<pubkey>"` (both hex) over the
//! payload `content|producerId|timestamp`.
//!
//! Verification is advisory: a malformed or forged attestation produces
//! `valid = false`, never an error, and the gossip layer keeps the signal
//! regardless (the verifier only annotates).

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use swarm_types::AgentId;

/// Scheme prefix for attestation strings.
const SCHEME: &str = "ed25519";

/// Number of hex characters in a fingerprint.
const FINGERPRINT_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An agent's Ed25519 keypair plus derived public material.
///
/// The signing key is private to the owning process; only the hex public key
/// and fingerprint are exposed.
pub struct AgentKeypair {
    /// The private signing key. Never serialized, never transmitted.
    signing_key: SigningKey,
    /// Hex-encoded 32-byte public key.
    public_key_hex: String,
    /// First 16 hex chars of `sha256(public_key_hex)`.
    fingerprint: String,
    /// When the keypair was generated.
    created_at: DateTime<Utc>,
}

impl AgentKeypair {
    /// Generate a fresh keypair from 32 random secret bytes.
    pub fn generate() -> Self {
        let secret: [u8; 32] = rand::rng().random();
        Self::from_secret_bytes(&secret)
    }

    /// Build a keypair from fixed secret bytes (deterministic; used by tests).
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());
        let fingerprint = fingerprint_of(&public_key_hex);
        Self {
            signing_key,
            public_key_hex,
            fingerprint,
            created_at: Utc::now(),
        }
    }

    /// Hex-encoded public key.
    pub fn public_key_hex(&self) -> &str {
        &self.public_key_hex
    }

    /// The keypair's fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// When the keypair was generated.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sign a signal payload and return the attestation string
    /// `"ed25519:<sig>:<pubkey>"`.
    pub fn sign_attestation(&self, content: &str, producer_id: &AgentId, timestamp: i64) -> String {
        let payload = attestation_payload(content, producer_id, timestamp);
        let sig = self.signing_key.sign(payload.as_bytes());
        format!(
            "{SCHEME}:{}:{}",
            hex::encode(sig.to_bytes()),
            self.public_key_hex
        )
    }
}

impl core::fmt::Debug for AgentKeypair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // The signing key is deliberately absent from the debug output.
        f.debug_struct("AgentKeypair")
            .field("public_key_hex", &self.public_key_hex)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// The result of verifying an attestation.
///
/// `public_key` and `fingerprint` are present whenever the attestation parsed
/// into three fields with a decodable key, even if the signature itself did
/// not verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// Whether the signature verified against the recomputed payload.
    pub valid: bool,
    /// Hex-encoded public key extracted from the attestation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Fingerprint of the extracted public key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Verification {
    /// An outright failure with no recoverable key material.
    const fn invalid() -> Self {
        Self {
            valid: false,
            public_key: None,
            fingerprint: None,
        }
    }
}

/// Verify an attestation string against the signal fields it claims to bind.
///
/// Recomputes the payload `content|producerId|timestamp`, parses the three
/// colon-separated attestation fields, and checks the Ed25519 signature.
/// Malformed input yields `valid = false`; this function never errors.
pub fn verify_attestation(
    attestation: &str,
    content: &str,
    producer_id: &AgentId,
    timestamp: i64,
) -> Verification {
    let mut parts = attestation.splitn(3, ':');
    let (Some(scheme), Some(sig_hex), Some(key_hex)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Verification::invalid();
    };
    if scheme != SCHEME {
        return Verification::invalid();
    }

    let Ok(key_bytes) = hex::decode(key_hex) else {
        return Verification::invalid();
    };
    let Ok(key_array) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
        return Verification::invalid();
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_array) else {
        return Verification::invalid();
    };

    let public_key = Some(key_hex.to_owned());
    let fingerprint = Some(fingerprint_of(key_hex));

    let Ok(sig_bytes) = hex::decode(sig_hex) else {
        return Verification {
            valid: false,
            public_key,
            fingerprint,
        };
    };
    let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return Verification {
            valid: false,
            public_key,
            fingerprint,
        };
    };
    let signature = Signature::from_bytes(&sig_array);

    let payload = attestation_payload(content, producer_id, timestamp);
    let valid = verifying_key.verify(payload.as_bytes(), &signature).is_ok();

    Verification {
        valid,
        public_key,
        fingerprint,
    }
}

/// Fingerprint of a hex-encoded public key: the first 16 hex chars of
/// `sha256(public_key_hex)`.
pub fn fingerprint_of(public_key_hex: &str) -> String {
    let digest = Sha256::digest(public_key_hex.as_bytes());
    let full = hex::encode(digest);
    full.chars().take(FINGERPRINT_LEN).collect()
}

/// The canonical signing payload: `content|producerId|timestamp`.
fn attestation_payload(content: &str, producer_id: &AgentId, timestamp: i64) -> String {
    format!("{content}|{producer_id}|{timestamp}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn fixed_keypair() -> AgentKeypair {
        AgentKeypair::from_secret_bytes(&[7u8; 32])
    }

    #[test]
    fn sign_verify_roundtrip() {
        let keypair = fixed_keypair();
        let producer = AgentId::new("agent-2");
        let attestation = keypair.sign_attestation("orbital decay observed", &producer, 1_700_000_000_000);

        let result =
            verify_attestation(&attestation, "orbital decay observed", &producer, 1_700_000_000_000);
        assert!(result.valid);
        assert_eq!(result.public_key.as_deref(), Some(keypair.public_key_hex()));
        assert_eq!(result.fingerprint.as_deref(), Some(keypair.fingerprint()));
    }

    #[test]
    fn tampered_content_fails() {
        let keypair = fixed_keypair();
        let producer = AgentId::new("agent-2");
        let attestation = keypair.sign_attestation("original", &producer, 42);

        let result = verify_attestation(&attestation, "tampered", &producer, 42);
        assert!(!result.valid);
        // Key material is still recoverable from a well-formed attestation.
        assert!(result.public_key.is_some());
    }

    #[test]
    fn tampered_timestamp_fails() {
        let keypair = fixed_keypair();
        let producer = AgentId::new("agent-2");
        let attestation = keypair.sign_attestation("payload", &producer, 42);
        assert!(!verify_attestation(&attestation, "payload", &producer, 43).valid);
    }

    #[test]
    fn malformed_attestation_is_invalid_not_error() {
        let producer = AgentId::new("agent-0");
        for garbage in ["", "ed25519", "ed25519:zz:zz", "rsa:00:00", "ed25519:00:notahexkey"] {
            let result = verify_attestation(garbage, "x", &producer, 0);
            assert!(!result.valid, "{garbage} should not verify");
        }
    }

    #[test]
    fn attestation_format_is_three_hex_fields() {
        let keypair = fixed_keypair();
        let attestation = keypair.sign_attestation("x", &AgentId::new("a"), 0);
        let parts: Vec<&str> = attestation.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ed25519");
        assert_eq!(parts[1].len(), 128); // 64-byte signature
        assert_eq!(parts[2].len(), 64); // 32-byte public key
    }

    #[test]
    fn fingerprint_is_16_hex_chars() {
        let keypair = fixed_keypair();
        assert_eq!(keypair.fingerprint().len(), 16);
        assert!(keypair.fingerprint().chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic: same key, same fingerprint.
        assert_eq!(
            keypair.fingerprint(),
            fingerprint_of(keypair.public_key_hex())
        );
    }

    #[test]
    fn distinct_secrets_distinct_keys() {
        let a = AgentKeypair::from_secret_bytes(&[1u8; 32]);
        let b = AgentKeypair::from_secret_bytes(&[2u8; 32]);
        assert_ne!(a.public_key_hex(), b.public_key_hex());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
