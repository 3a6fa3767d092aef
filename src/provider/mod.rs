use crate::auth::TokenRequest;
use crate::core::models::upstream::TokenResponse;
use crate::core::types::{ClientId, RedirectUri, Scope};

pub mod authorization;
pub mod callback;
pub mod error;
pub mod now_playing;
pub mod refresh;

pub use error::Error;

use tracing::{event, Level};
use url::Url;

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com";
pub const DEFAULT_APP_PATH: &str = "/visualizer";

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent values are reported per request, not at start-up.
    pub client_id: Option<ClientId>,
    pub redirect_uri: Option<RedirectUri>,
    pub scope: Scope,
    /// Path inside the app that the callback redirects back to.
    pub app_path: String,
    pub accounts_url: Url,
    pub api_url: Url,
}

impl Config {
    pub fn new(client_id: Option<ClientId>, redirect_uri: Option<RedirectUri>) -> Result<Self, Error> {
        Ok(Self {
            client_id,
            redirect_uri,
            scope: Scope::default(),
            app_path: DEFAULT_APP_PATH.to_string(),
            accounts_url: Url::parse(DEFAULT_ACCOUNTS_URL)?,
            api_url: Url::parse(DEFAULT_API_URL)?,
        })
    }
}

/// Stateless relay in front of Spotify's accounts and Web API.
#[derive(Debug)]
pub struct SpotifyProvider {
    config: Config,
    http: reqwest::Client,
}

impl SpotifyProvider {
    pub fn new(config: Config) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: Config, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn client_id(&self) -> Result<&ClientId, Error> {
        match &self.config.client_id {
            Some(id) if !id.0.is_empty() => Ok(id),
            _ => Err(Error::MissingConfig),
        }
    }

    fn credentials(&self) -> Result<(&ClientId, &RedirectUri), Error> {
        let client_id = self.client_id()?;
        match &self.config.redirect_uri {
            Some(uri) if !uri.0.is_empty() => Ok((client_id, uri)),
            _ => Err(Error::MissingConfig),
        }
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url, Error> {
        let base = base.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }

    /// POSTs a grant to the token endpoint. The upstream body is logged on
    /// failure; it never contains issued tokens.
    #[tracing::instrument(skip_all)]
    async fn token_request(
        &self,
        req: &TokenRequest,
        context: &'static str,
    ) -> Result<TokenResponse, Error> {
        let url = Self::endpoint(&self.config.accounts_url, "api/token")?;
        let response = self.http.post(url).form(req).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            event!(
                Level::ERROR,
                status = status.as_u16(),
                body = %body,
                "{}", context
            );
            return Err(Error::Upstream {
                status: status.as_u16(),
                context,
            });
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}

/// Treats empty query values the same as missing ones.
pub(crate) fn non_empty<T: AsRef<str>>(value: Option<T>) -> Option<T> {
    value.filter(|v| !v.as_ref().is_empty())
}
