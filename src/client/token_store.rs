use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::core::types::{AccessToken, CodeVerifier, RefreshToken};

use super::storage::KeyValueStore;

pub const REFRESH_TOKEN_KEY: &str = "spotify_refresh_token";
pub const ACCESS_TOKEN_KEY: &str = "spotify_access_token";
pub const TOKEN_EXPIRY_KEY: &str = "spotify_token_expiry";
pub const CODE_VERIFIER_KEY: &str = "spotify_code_verifier";

/// Taken off every access token lifetime before computing its expiry.
pub const EXPIRY_MARGIN_SECS: u64 = 60;

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccessToken {
    pub token: AccessToken,
    /// Milliseconds since the Unix epoch.
    pub expires_at: u64,
}

/// Client token storage over two scopes: the refresh token lives in the
/// durable store, the access token and its expiry in the session store.
///
/// A store without backing scopes (see [`TokenStore::detached`]) accepts every
/// call and remembers nothing.
#[derive(Clone)]
pub struct TokenStore {
    durable: Option<Arc<dyn KeyValueStore>>,
    session: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("durable", &self.durable.is_some())
            .field("session", &self.session.is_some())
            .finish()
    }
}

impl TokenStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            durable: Some(durable),
            session: Some(session),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn detached() -> Self {
        Self {
            durable: None,
            session: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.durable
            .as_ref()?
            .get(REFRESH_TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(RefreshToken)
    }

    pub fn set_refresh_token(&self, token: &RefreshToken) {
        if let Some(durable) = &self.durable {
            durable.set(REFRESH_TOKEN_KEY, token.as_ref());
        }
    }

    /// The cached access token, if present and unexpired. An expired or
    /// unreadable entry is removed as a side effect.
    pub fn access_token(&self) -> Option<StoredAccessToken> {
        let session = self.session.as_ref()?;

        let token = session.get(ACCESS_TOKEN_KEY)?;
        let expiry = session.get(TOKEN_EXPIRY_KEY)?;

        match expiry.parse::<u64>() {
            Ok(expires_at) if self.clock.now_millis() < expires_at => Some(StoredAccessToken {
                token: AccessToken(token),
                expires_at,
            }),
            _ => {
                session.delete(ACCESS_TOKEN_KEY);
                session.delete(TOKEN_EXPIRY_KEY);
                None
            }
        }
    }

    pub fn set_access_token(&self, token: &AccessToken, expires_in_secs: u64) {
        if let Some(session) = &self.session {
            let lifetime_ms = expires_in_secs
                .saturating_sub(EXPIRY_MARGIN_SECS)
                .saturating_mul(1000);
            let expires_at = self.clock.now_millis().saturating_add(lifetime_ms);
            session.set(ACCESS_TOKEN_KEY, token.as_ref());
            session.set(TOKEN_EXPIRY_KEY, &expires_at.to_string());
        }
    }

    pub fn clear_tokens(&self) {
        if let Some(durable) = &self.durable {
            durable.delete(REFRESH_TOKEN_KEY);
        }
        if let Some(session) = &self.session {
            session.delete(ACCESS_TOKEN_KEY);
            session.delete(TOKEN_EXPIRY_KEY);
        }
    }

    pub fn code_verifier(&self) -> Option<CodeVerifier> {
        self.session.as_ref()?.get(CODE_VERIFIER_KEY).map(CodeVerifier)
    }

    pub fn set_code_verifier(&self, verifier: &CodeVerifier) {
        if let Some(session) = &self.session {
            session.set(CODE_VERIFIER_KEY, verifier.as_ref());
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;
    use crate::client::storage::MemoryStore;

    fn store() -> (TokenStore, Arc<MemoryStore>, Arc<MemoryStore>, Arc<ManualClock>) {
        let durable = Arc::new(MemoryStore::new());
        let session = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(1_700_000_000_000);
        let tokens = TokenStore::new(durable.clone(), session.clone()).with_clock(clock.clone());
        (tokens, durable, session, clock)
    }

    #[test]
    fn access_token_expires_with_margin() {
        let (tokens, _, session, clock) = store();
        let token = AccessToken("at".to_string());
        tokens.set_access_token(&token, 3600);

        let stored = tokens.access_token().unwrap();
        assert_eq!(stored.token, token);
        assert_eq!(stored.expires_at, 1_700_000_000_000 + 3_540_000);

        clock.advance(Duration::from_secs(3539));
        assert!(tokens.access_token().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(tokens.access_token().is_none());
        assert_eq!(session.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(session.get(TOKEN_EXPIRY_KEY), None);
    }

    #[test]
    fn huge_lifetime_saturates() {
        let (tokens, _, _, clock) = store();
        tokens.set_access_token(&AccessToken("at".to_string()), u64::MAX);

        let stored = tokens.access_token().unwrap();
        assert_eq!(stored.expires_at, u64::MAX);

        clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));
        assert!(tokens.access_token().is_some());
    }

    #[test]
    fn unreadable_expiry_is_evicted() {
        let (tokens, _, session, _) = store();
        session.set(ACCESS_TOKEN_KEY, "at");
        session.set(TOKEN_EXPIRY_KEY, "soon");
        assert!(tokens.access_token().is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn scopes_are_separate_and_cleared_together() {
        let (tokens, durable, session, _) = store();
        tokens.set_refresh_token(&RefreshToken("rt".to_string()));
        tokens.set_access_token(&AccessToken("at".to_string()), 3600);

        assert_eq!(durable.get(REFRESH_TOKEN_KEY).as_deref(), Some("rt"));
        assert_eq!(session.get(ACCESS_TOKEN_KEY).as_deref(), Some("at"));
        assert_eq!(durable.get(ACCESS_TOKEN_KEY), None);

        tokens.clear_tokens();
        assert!(tokens.refresh_token().is_none());
        assert!(tokens.access_token().is_none());
        assert!(durable.is_empty());
        assert!(session.is_empty());
    }

    #[test]
    fn detached_store_is_inert() {
        let tokens = TokenStore::detached();
        tokens.set_refresh_token(&RefreshToken("rt".to_string()));
        tokens.set_access_token(&AccessToken("at".to_string()), 3600);
        tokens.set_code_verifier(&CodeVerifier("v".to_string()));
        tokens.clear_tokens();

        assert!(tokens.refresh_token().is_none());
        assert!(tokens.access_token().is_none());
        assert!(tokens.code_verifier().is_none());
    }
}
