use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::auth::{ErrorResponse, RefreshRequest};
use crate::core::models::{NowPlaying, RefreshedToken};
use crate::core::types::{AccessToken, CodeChallenge, CodeVerifier, RefreshToken};
use crate::provider::now_playing::DEFAULT_RETRY_AFTER_SECS;

use super::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NowPlayingReply {
    Playing(NowPlaying),
    /// The access token was rejected upstream.
    Unauthorized,
    RateLimited { retry_after: u64 },
}

/// What the poller needs from the relay.
#[async_trait]
pub trait Backend: Send + Sync {
    fn authorize_url(&self, challenge: &CodeChallenge, verifier: &CodeVerifier) -> Result<Url, Error>;
    async fn refresh(&self, token: &RefreshToken) -> Result<RefreshedToken, Error>;
    async fn now_playing(&self, token: &AccessToken) -> Result<NowPlayingReply, Error>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    fn route(&self, name: &str) -> Result<Url, Error> {
        let base = self.base.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/api/spotify/{}", base, name))?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn authorize_url(&self, challenge: &CodeChallenge, verifier: &CodeVerifier) -> Result<Url, Error> {
        let mut url = self.route("authorize")?;
        url.query_pairs_mut()
            .append_pair("code_challenge", challenge.as_ref())
            .append_pair("code_verifier", verifier.as_ref());
        Ok(url)
    }

    async fn refresh(&self, token: &RefreshToken) -> Result<RefreshedToken, Error> {
        let body = RefreshRequest {
            refresh_token: Some(token.clone()),
        };
        let response = self.http.post(self.route("refresh")?).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    async fn now_playing(&self, token: &AccessToken) -> Result<NowPlayingReply, Error> {
        let response = self
            .http
            .get(self.route("currently-playing")?)
            .bearer_auth(token.as_ref())
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Ok(NowPlayingReply::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .json::<ErrorResponse>()
                    .await
                    .ok()
                    .and_then(|e| e.retry_after)
                    .filter(|s| *s > 0)
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                Ok(NowPlayingReply::RateLimited { retry_after })
            }
            s if !s.is_success() => Err(Error::Status(s.as_u16())),
            _ => Ok(NowPlayingReply::Playing(response.json().await?)),
        }
    }
}
