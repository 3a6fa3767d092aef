#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "retryAfter")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            retry_after: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            error: "Rate limited".to_string(),
            retry_after: Some(retry_after),
        }
    }
}

/// Coarse error codes the callback hands back to the app as `?error=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// Relayed verbatim from the provider (`access_denied`, ...).
    Provider(String),
    MissingCodeOrState,
    MissingConfig,
    TokenExchangeFailed,
    CallbackFailed,
}

impl CallbackError {
    pub fn code(&self) -> &str {
        match self {
            Self::Provider(code) => code,
            Self::MissingCodeOrState => "missing_code_or_state",
            Self::MissingConfig => "missing_config",
            Self::TokenExchangeFailed => "token_exchange_failed",
            Self::CallbackFailed => "callback_failed",
        }
    }
}
