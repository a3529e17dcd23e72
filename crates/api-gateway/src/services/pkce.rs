//! PKCE verifier/challenge generation
//!
//! Proof Key for Code Exchange (RFC 7636, S256 method). The verifier is the
//! secret half: it is cached server-side and sent only at token-exchange
//! time. The challenge is its one-way derivation and travels to the provider
//! in the authorization URL.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Entropy for verifiers and state tokens (256 bits)
const TOKEN_ENTROPY_BYTES: usize = 32;

/// A generated PKCE pair
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// The secret, cached until token exchange
    pub verifier: String,
    /// `urlsafe_b64(sha256(verifier))`, padding stripped
    pub challenge: String,
}

/// Generate a random URL-safe token with 32 bytes of OS entropy
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a fresh PKCE verifier and its S256 challenge
pub fn generate() -> PkcePair {
    let verifier = random_token();
    let challenge = challenge_for(&verifier);
    PkcePair {
        verifier,
        challenge,
    }
}

/// Derive the S256 challenge for a verifier
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
