use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{event, Level};
use url::Url;

use crate::auth::pkce::PkcePair;
use crate::core::models::TrackSnapshot;
use crate::core::types::AccessToken;
use crate::util::random::VERIFIER_LENGTH;

use super::backend::{Backend, NowPlayingReply};
use super::fragment::{decode_tokens, Location};
use super::token_store::TokenStore;
use super::Error;

pub const BASE_INTERVAL: Duration = Duration::from_secs(5);
pub const ERROR_INTERVAL: Duration = Duration::from_secs(10);
/// Upper bound on a server-requested delay.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

pub const SESSION_EXPIRED: &str = "Session expired. Please reconnect.";
pub const LOAD_FAILED: &str = "Failed to load track";
pub const AUTH_FAILED: &str = "Failed to authenticate";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Authenticated, waiting for the first result.
    Loading,
    Unauthenticated { notice: Option<String> },
    Authenticated { track: Option<TrackSnapshot> },
    /// Authenticated, last poll failed. The last known track is kept.
    Failed {
        message: String,
        track: Option<TrackSnapshot>,
    },
}

impl ViewState {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Unauthenticated { .. })
    }

    pub fn track(&self) -> Option<&TrackSnapshot> {
        match self {
            Self::Authenticated { track } | Self::Failed { track, .. } => track.as_ref(),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Loading => "Loading...".to_string(),
            Self::Unauthenticated { notice: None } => {
                "Connect Spotify to see what's playing".to_string()
            }
            Self::Unauthenticated { notice: Some(n) } => {
                format!("Connect Spotify to see what's playing ({})", n)
            }
            Self::Failed { message, track: None } => message.clone(),
            Self::Authenticated { track: None } => "Not playing anything".to_string(),
            Self::Authenticated { track: Some(t) } | Self::Failed { track: Some(t), .. } => {
                format!("{} - {}", t.name, t.artist)
            }
        }
    }
}

/// Whether the user can currently see the output. Polls are skipped while
/// hidden; the timer keeps running.
pub trait Visibility: Send + Sync {
    fn is_visible(&self) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysVisible;

impl Visibility for AlwaysVisible {
    fn is_visible(&self) -> bool {
        true
    }
}

impl Visibility for AtomicBool {
    fn is_visible(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Updated,
    SessionExpired,
    RateLimited(Duration),
    Failed,
}

pub struct Poller<B> {
    backend: B,
    tokens: TokenStore,
    visibility: Arc<dyn Visibility>,
    state: ViewState,
    interval: Duration,
}

impl<B: Backend> Poller<B> {
    pub fn new(backend: B, tokens: TokenStore) -> Self {
        Self {
            backend,
            tokens,
            visibility: Arc::new(AlwaysVisible),
            state: ViewState::Loading,
            interval: BASE_INTERVAL,
        }
    }

    pub fn with_visibility(mut self, visibility: Arc<dyn Visibility>) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Picks up tokens handed over in the location fragment, then decides the
    /// initial state from the stored refresh token.
    pub fn mount(&mut self, location: &mut Location) {
        let mut notice = None;

        if let Some(payload) = location.token_payload() {
            match decode_tokens(payload) {
                Ok(tokens) => {
                    self.tokens.set_refresh_token(&tokens.refresh_token);
                    self.tokens
                        .set_access_token(&tokens.access_token, tokens.expires_in);
                    location.strip_to_path();
                    event!(Level::DEBUG, "Stored tokens from redirect");
                }
                Err(e) => {
                    event!(Level::ERROR, error = %e, "Failed to parse tokens");
                    notice = Some(AUTH_FAILED.to_string());
                }
            }
        }

        self.state = match (self.tokens.refresh_token(), notice) {
            (Some(_), None) => ViewState::Loading,
            (Some(_), Some(message)) => ViewState::Failed {
                message,
                track: None,
            },
            (None, notice) => ViewState::Unauthenticated { notice },
        };
    }

    /// Starts the authorization round trip and returns the URL to open.
    pub fn connect(&self) -> Result<Url, Error> {
        let pair = PkcePair::generate(VERIFIER_LENGTH);
        self.tokens.set_code_verifier(&pair.verifier);
        self.backend.authorize_url(&pair.challenge, &pair.verifier)
    }

    pub fn disconnect(&mut self) {
        self.tokens.clear_tokens();
        self.state = ViewState::Unauthenticated { notice: None };
        self.interval = BASE_INTERVAL;
    }

    /// Drops the current error and polls again right away.
    pub async fn retry(&mut self) -> PollOutcome {
        self.state = ViewState::Loading;
        self.poll_once().await
    }

    /// The cached access token, or a freshly refreshed one. A failed refresh
    /// clears every stored token.
    pub async fn ensure_access_token(&self) -> Option<AccessToken> {
        if let Some(stored) = self.tokens.access_token() {
            return Some(stored.token);
        }

        let refresh_token = self.tokens.refresh_token()?;
        match self.backend.refresh(&refresh_token).await {
            Ok(refreshed) => {
                self.tokens
                    .set_access_token(&refreshed.access_token, refreshed.expires_in);
                Some(refreshed.access_token)
            }
            Err(e) => {
                event!(Level::ERROR, error = %e, "Failed to refresh access token");
                self.tokens.clear_tokens();
                None
            }
        }
    }

    fn expire_session(&mut self) -> PollOutcome {
        self.tokens.clear_tokens();
        self.state = ViewState::Unauthenticated {
            notice: Some(SESSION_EXPIRED.to_string()),
        };
        PollOutcome::SessionExpired
    }

    pub async fn poll_once(&mut self) -> PollOutcome {
        let token = match self.ensure_access_token().await {
            Some(token) => token,
            None => return self.expire_session(),
        };

        match self.backend.now_playing(&token).await {
            Ok(NowPlayingReply::Playing(now)) => {
                self.state = ViewState::Authenticated { track: now.track };
                self.interval = BASE_INTERVAL;
                PollOutcome::Updated
            }
            Ok(NowPlayingReply::Unauthorized) => self.expire_session(),
            Ok(NowPlayingReply::RateLimited { retry_after }) => {
                self.interval = Duration::from_secs(retry_after).min(MAX_RETRY_AFTER);
                event!(Level::WARN, retry_after, "Rate limited, slowing down");
                PollOutcome::RateLimited(self.interval)
            }
            Err(e) => {
                event!(Level::ERROR, error = %e, "Error fetching track");
                let track = self.state.track().cloned();
                self.state = ViewState::Failed {
                    message: LOAD_FAILED.to_string(),
                    track,
                };
                self.interval = ERROR_INTERVAL;
                PollOutcome::Failed
            }
        }
    }

    fn ticker(period: Duration) -> Interval {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Polls immediately, then on every tick while visible, until `shutdown`
    /// resolves or the session ends. Polls run inside the loop, so a slow
    /// response delays the next tick instead of overlapping it.
    pub async fn run_until<F, C>(&mut self, shutdown: F, mut on_change: C)
    where
        F: Future<Output = ()>,
        C: FnMut(&ViewState),
    {
        if !self.state.is_authenticated() {
            return;
        }
        tokio::pin!(shutdown);

        self.poll_once().await;
        on_change(&self.state);

        let mut period = self.interval;
        let mut ticker = Self::ticker(period);

        while self.state.is_authenticated() {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    if !self.visibility.is_visible() {
                        event!(Level::TRACE, "Hidden, skipping poll");
                        continue;
                    }

                    let before = self.state.clone();
                    self.poll_once().await;
                    if self.state != before {
                        on_change(&self.state);
                    }

                    if self.interval != period {
                        period = self.interval;
                        ticker = Self::ticker(period);
                    }
                }
            }
        }
    }
}
