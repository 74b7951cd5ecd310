//! PKCE (Proof Key for Code Exchange) verification.
//!
//! Implements S256 code challenge verification per RFC 7636. The method is
//! checked at use time: anything other than `S256` fails verification.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Verify a PKCE code challenge.
///
/// Computes `BASE64URL(SHA256(code_verifier))` and compares to the stored
/// challenge. Only `S256` is accepted as a method.
pub fn verify(code_verifier: &str, code_challenge: &str, method: &str) -> bool {
    if method != "S256" {
        return false;
    }
    let hash = Sha256::digest(code_verifier.as_bytes());
    let computed = URL_SAFE_NO_PAD.encode(hash);
    computed == code_challenge
}
