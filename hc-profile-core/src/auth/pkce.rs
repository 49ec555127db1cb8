//! PKCE (Proof Key for Code Exchange, RFC 7636) helpers.
//!
//! All random values are base64url encoded without padding, so they can be
//! placed in query strings and form bodies verbatim.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

/// Random bytes used for the `nonce` and `state` parameters.
pub const NONCE_BYTES: usize = 16;
/// Random bytes used for the code verifier (43 characters once encoded).
pub const VERIFIER_BYTES: usize = 32;

/// Draw `byte_len` bytes from the thread-local CSPRNG and encode them
/// base64url without padding.
pub fn generate_nonce(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// BASE64URL(SHA256(ASCII(code_verifier)))
pub fn derive_code_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Values generated once per authentication attempt.
///
/// The verifier is only ever sent to the token endpoint and must not leave
/// memory; `Debug` output redacts it.
#[derive(Clone)]
pub struct PkceContext {
    pub nonce: String,
    pub state: String,
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkceContext {
    pub fn generate() -> Self {
        let code_verifier = generate_nonce(VERIFIER_BYTES);
        let code_challenge = derive_code_challenge(&code_verifier);
        Self {
            nonce: generate_nonce(NONCE_BYTES),
            state: generate_nonce(NONCE_BYTES),
            code_verifier,
            code_challenge,
        }
    }

    /// Always `S256`; plain challenges are not supported.
    pub fn challenge_method(&self) -> &'static str {
        "S256"
    }
}

impl fmt::Debug for PkceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceContext")
            .field("nonce", &self.nonce)
            .field("state", &self.state)
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}
