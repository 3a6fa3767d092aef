use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::core::types::{CodeChallenge, CodeVerifier};
use crate::util::random::random_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum Transformation {
    S256,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::S256
    }
}

#[derive(Debug, Clone)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Challenge {
    #[serde(rename = "code_challenge")]
    pub code: CodeChallenge,
    #[serde(rename = "code_challenge_method")]
    #[serde(default)]
    pub method: Transformation,
}

impl Challenge {
    pub fn s256(code: CodeChallenge) -> Self {
        Self {
            code,
            method: Transformation::S256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: CodeVerifier,
    pub challenge: CodeChallenge,
}

impl PkcePair {
    pub fn generate(length: usize) -> Self {
        let verifier = generate_verifier(length);
        let challenge = generate_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

pub fn generate_verifier(length: usize) -> CodeVerifier {
    CodeVerifier(random_string(length))
}

/// BASE64URL(SHA256(verifier)) without padding.
pub fn generate_challenge(verifier: &CodeVerifier) -> CodeChallenge {
    let digest = Sha256::digest(verifier.as_ref().as_bytes());
    CodeChallenge(URL_SAFE_NO_PAD.encode(digest))
}
