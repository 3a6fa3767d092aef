use crate::auth::{AppRedirect, CallbackError, CallbackRequest, TokenRequest};
use crate::core::models::TokenPair;
use crate::core::types::{AccessToken, RefreshToken};

use super::error::ResultExt;
use super::{non_empty, Error, SpotifyProvider};

use tracing::{event, Level};

impl SpotifyProvider {
    /// Always answers with a redirect back into the app; failures become a
    /// coarse `error` code.
    #[tracing::instrument(skip_all)]
    pub async fn callback_request(&self, req: CallbackRequest) -> AppRedirect {
        let app_path = self.config.app_path.clone();
        match self.exchange_code(req).await {
            Ok(tokens) => {
                event!(Level::DEBUG, "Handing tokens to the app");
                AppRedirect::Tokens { app_path, tokens }
            }
            Err(error) => {
                event!(Level::DEBUG, error = error.code(), "Callback failed");
                AppRedirect::Error { app_path, error }
            }
        }
    }

    /// Same as [`callback_request`](Self::callback_request) over the raw
    /// query string. A query that does not parse still redirects.
    pub async fn callback_query(&self, query: &str) -> AppRedirect {
        match serde_urlencoded::from_str::<CallbackRequest>(query) {
            Ok(req) => self.callback_request(req).await,
            Err(e) => {
                event!(Level::WARN, error = %e, "Malformed callback query");
                AppRedirect::Error {
                    app_path: self.config.app_path.clone(),
                    error: CallbackError::CallbackFailed,
                }
            }
        }
    }

    async fn exchange_code(&self, req: CallbackRequest) -> Result<TokenPair, CallbackError> {
        if let Some(error) = non_empty(req.error) {
            return Err(CallbackError::Provider(error));
        }

        let (code, verifier) = match (non_empty(req.code), non_empty(req.state)) {
            (Some(code), Some(state)) => (code, state),
            _ => return Err(CallbackError::MissingCodeOrState),
        };

        let (client_id, redirect_uri) = self
            .credentials()
            .callback_context(CallbackError::MissingConfig)?;

        let grant = TokenRequest::AuthorizationCode {
            code,
            redirect_uri: redirect_uri.clone(),
            client_id: client_id.clone(),
            code_verifier: verifier,
        };

        let tokens = self
            .token_request(&grant, "Token exchange failed")
            .await
            .map_err(|e| match e {
                Error::Upstream { .. } => CallbackError::TokenExchangeFailed,
                e => {
                    event!(Level::ERROR, error = %e, "Callback error");
                    CallbackError::CallbackFailed
                }
            })?;

        let refresh_token = tokens.refresh_token.ok_or_else(|| {
            event!(Level::ERROR, "Token exchange returned no refresh_token");
            CallbackError::TokenExchangeFailed
        })?;

        Ok(TokenPair {
            access_token: AccessToken(tokens.access_token),
            refresh_token: RefreshToken(refresh_token),
            expires_in: tokens.expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AuthCode, CodeVerifier};
    use crate::provider::testing;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use warp::Filter;

    fn token_mock(hits: Arc<AtomicUsize>, status: u16) -> url::Url {
        let route = warp::path!("api" / "token")
            .and(warp::post())
            .and(warp::body::form())
            .map(move |form: HashMap<String, String>| {
                hits.fetch_add(1, Ordering::SeqCst);
                assert_eq!(form["grant_type"], "authorization_code");
                assert_eq!(form["code_verifier"], "the-verifier");
                let body = warp::reply::json(&serde_json::json!({
                    "access_token": "at",
                    "token_type": "Bearer",
                    "refresh_token": "rt",
                    "expires_in": 3600
                }));
                let status = warp::http::StatusCode::from_u16(status).unwrap();
                warp::reply::with_status(body, status)
            });
        testing::start_mock(route.boxed())
    }

    fn request(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> CallbackRequest {
        CallbackRequest {
            code: code.map(|c| AuthCode(c.to_string())),
            state: state.map(|s| CodeVerifier(s.to_string())),
            error: error.map(ToString::to_string),
        }
    }

    #[tokio::test]
    async fn provider_error_skips_exchange() {
        let hits = Arc::new(AtomicUsize::new(0));
        let accounts = token_mock(hits.clone(), 200);
        let provider = SpotifyProvider::new(testing::config(accounts, testing::unreachable()));

        let redirect = provider
            .callback_request(request(Some("code"), Some("the-verifier"), Some("access_denied")))
            .await;
        match redirect {
            AppRedirect::Error { error, .. } => assert_eq!(error.code(), "access_denied"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_query_still_redirects() {
        let provider = SpotifyProvider::new(testing::config(testing::unreachable(), testing::unreachable()));
        let redirect = provider.callback_query("code=a&code=b&state=x").await;
        assert!(matches!(
            redirect,
            AppRedirect::Error { error: CallbackError::CallbackFailed, .. }
        ));

        let redirect = provider.callback_query("").await;
        assert!(matches!(
            redirect,
            AppRedirect::Error { error: CallbackError::MissingCodeOrState, .. }
        ));
    }

    #[tokio::test]
    async fn missing_code_or_state() {
        let provider = SpotifyProvider::new(testing::config(testing::unreachable(), testing::unreachable()));
        let redirect = provider.callback_request(request(Some("code"), None, None)).await;
        assert!(matches!(
            redirect,
            AppRedirect::Error { error: CallbackError::MissingCodeOrState, .. }
        ));
    }

    #[tokio::test]
    async fn exchanges_code_using_state_as_verifier() {
        let hits = Arc::new(AtomicUsize::new(0));
        let accounts = token_mock(hits.clone(), 200);
        let provider = SpotifyProvider::new(testing::config(accounts, testing::unreachable()));

        let redirect = provider
            .callback_request(request(Some("code"), Some("the-verifier"), None))
            .await;
        match redirect {
            AppRedirect::Tokens { tokens, app_path } => {
                assert_eq!(app_path, "/visualizer");
                assert_eq!(tokens.access_token, AccessToken("at".to_string()));
                assert_eq!(tokens.refresh_token, RefreshToken("rt".to_string()));
                assert_eq!(tokens.expires_in, 3600);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upstream_rejection_and_transport_failure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let accounts = token_mock(hits.clone(), 400);
        let provider = SpotifyProvider::new(testing::config(accounts, testing::unreachable()));
        let redirect = provider
            .callback_request(request(Some("code"), Some("the-verifier"), None))
            .await;
        assert!(matches!(
            redirect,
            AppRedirect::Error { error: CallbackError::TokenExchangeFailed, .. }
        ));

        let provider = SpotifyProvider::new(testing::config(testing::unreachable(), testing::unreachable()));
        let redirect = provider
            .callback_request(request(Some("code"), Some("the-verifier"), None))
            .await;
        assert!(matches!(
            redirect,
            AppRedirect::Error { error: CallbackError::CallbackFailed, .. }
        ));
    }
}
