use crate::auth::pkce;
use crate::core::types::{AuthCode, ClientId, CodeChallenge, CodeVerifier, RedirectUri, Scope};

/// Query accepted by the authorize endpoint. Both fields are required, but
/// their absence is reported by the handler rather than by the query filter.
#[derive(Debug, Clone, Default)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct AuthorizeRequest {
    pub code_challenge: Option<CodeChallenge>,
    pub code_verifier: Option<CodeVerifier>,
}

#[derive(Debug, Clone, Copy)]
#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Code,
}

/// Parameters appended to the provider's authorization URL.
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct AuthorizationParams {
    pub client_id: ClientId,
    pub response_type: ResponseType,
    pub redirect_uri: RedirectUri,
    pub scope: Scope,
    #[serde(flatten)]
    pub challenge: pkce::Challenge,
    /// The verifier rides along in `state` so the callback can recover it.
    pub state: CodeVerifier,
}

#[derive(Debug, Clone, Default)]
#[derive(serde::Deserialize)]
pub struct CallbackRequest {
    pub code: Option<AuthCode>,
    pub state: Option<CodeVerifier>,
    pub error: Option<String>,
}
