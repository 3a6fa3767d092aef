use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::core::models::TokenPair;

use super::Error;

const TOKENS_PARAM: &str = "tokens=";

/// The parts of the app URL the client reads and rewrites after the OAuth
/// round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: None,
            fragment: None,
        }
    }

    /// The raw `tokens=` value from the fragment, up to the next `&`.
    pub fn token_payload(&self) -> Option<&str> {
        let fragment = self.fragment.as_deref()?;
        let start = fragment.find(TOKENS_PARAM)? + TOKENS_PARAM.len();
        let rest = &fragment[start..];
        let payload = rest.split('&').next().unwrap_or(rest);
        Some(payload).filter(|p| !p.is_empty())
    }

    /// Drops query and fragment, keeping only the path.
    pub fn strip_to_path(&mut self) {
        self.query = None;
        self.fragment = None;
    }
}

impl FromStr for Location {
    type Err = Error;

    /// Accepts an absolute URL or a bare `path[?query][#fragment]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(url) = url::Url::parse(s) {
            return Ok(Self {
                path: url.path().to_string(),
                query: url.query().map(ToString::to_string),
                fragment: url.fragment().map(ToString::to_string),
            });
        }

        let (rest, fragment) = match s.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (s, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };
        Ok(Self {
            path: path.to_string(),
            query,
            fragment,
        })
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

pub fn decode_tokens(payload: &str) -> Result<TokenPair, Error> {
    let json = STANDARD.decode(payload.trim())?;
    Ok(serde_json::from_slice(&json)?)
}
