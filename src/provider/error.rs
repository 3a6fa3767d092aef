use crate::auth::CallbackError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing {0}")]
    MissingParameter(&'static str),
    #[error("Missing Spotify configuration")]
    MissingConfig,
    #[error("Missing or invalid authorization header")]
    Unauthorized,
    #[error("Token expired")]
    TokenExpired,
    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },
    #[error("{context} (upstream status {status})")]
    Upstream { status: u16, context: &'static str },
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed upstream payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors that carry no detail the caller should see.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Url(_) | Self::Http(_) | Self::Json(_))
    }
}

pub trait ResultExt<T> {
    /// Collapse any failure into a coarse callback error code.
    fn callback_context(self, error: CallbackError) -> Result<T, CallbackError>;
}

impl<T, E> ResultExt<T> for Result<T, E> {
    fn callback_context(self, error: CallbackError) -> Result<T, CallbackError> {
        self.map_err(|_| error)
    }
}
