pub mod access_token;
pub mod authorization;
pub mod error;
pub mod pkce;

pub use access_token::*;
pub use authorization::*;
pub use error::{CallbackError, ErrorResponse};

use crate::core::models::TokenPair;

/// A redirect to `uri` with `params` appended to its query string.
#[derive(Debug, Clone)]
pub struct Redirect<T> {
    pub uri: url::Url,
    pub params: T,
}

impl<T> Redirect<T> {
    pub fn new(uri: url::Url, params: T) -> Self {
        Redirect { uri, params }
    }
}

/// Where the callback sends the browser back to inside the app. Tokens travel
/// in the fragment, which user agents never send to a server.
#[derive(Debug, Clone)]
pub enum AppRedirect {
    Tokens { app_path: String, tokens: TokenPair },
    Error { app_path: String, error: CallbackError },
}
