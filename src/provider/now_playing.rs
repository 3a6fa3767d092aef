use crate::core::models::{upstream::CurrentlyPlaying, NowPlaying};
use crate::core::types::BearerToken;

use super::{Error, SpotifyProvider};

use reqwest::StatusCode;
use tracing::{event, Level};

/// Used when a 429 comes back without a usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

impl SpotifyProvider {
    #[tracing::instrument(skip_all)]
    pub async fn now_playing_request(&self, token: BearerToken) -> Result<NowPlaying, Error> {
        let url = Self::endpoint(&self.config.api_url, "v1/me/player/currently-playing")?;
        let response = self.http.get(url).bearer_auth(token.as_ref()).send().await?;

        let status = response.status();
        match status {
            StatusCode::NO_CONTENT => return Ok(NowPlaying::idle()),
            StatusCode::UNAUTHORIZED => return Err(Error::TokenExpired),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                event!(Level::WARN, retry_after, "Rate limited by provider");
                return Err(Error::RateLimited { retry_after });
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                event!(Level::ERROR, status = s.as_u16(), body = %body, "Spotify API error");
                return Err(Error::Upstream {
                    status: s.as_u16(),
                    context: "Failed to fetch currently playing track",
                });
            }
            _ => {}
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(NowPlaying::idle());
        }

        let data: CurrentlyPlaying = serde_json::from_slice(&body)?;
        Ok(data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing;

    use warp::http::StatusCode as WarpStatus;
    use warp::Filter;

    fn api_mock() -> url::Url {
        let route = warp::path!("v1" / "me" / "player" / "currently-playing")
            .and(warp::header::<String>("authorization"))
            .map(|auth: String| {
                let builder = warp::http::Response::builder();
                let response = match auth.as_str() {
                    "Bearer idle" => builder.status(WarpStatus::NO_CONTENT).body(String::new()),
                    "Bearer empty" => builder.status(WarpStatus::OK).body(String::new()),
                    "Bearer expired" => builder.status(WarpStatus::UNAUTHORIZED).body("{}".to_string()),
                    "Bearer limited" => builder
                        .status(WarpStatus::TOO_MANY_REQUESTS)
                        .header("Retry-After", "45")
                        .body(String::new()),
                    "Bearer limited-bare" => builder
                        .status(WarpStatus::TOO_MANY_REQUESTS)
                        .body(String::new()),
                    "Bearer broken" => builder
                        .status(WarpStatus::BAD_GATEWAY)
                        .body("upstream down".to_string()),
                    _ => builder.status(WarpStatus::OK).body(
                        serde_json::json!({
                            "is_playing": true,
                            "progress_ms": 5000,
                            "item": {
                                "name": "Song",
                                "duration_ms": 200000,
                                "artists": [{"name": "A"}, {"name": "B"}],
                                "album": {"name": "Album", "images": [{"url": "https://img/640"}]}
                            }
                        })
                        .to_string(),
                    ),
                };
                response.unwrap()
            });
        testing::start_mock(route.boxed())
    }

    fn provider() -> SpotifyProvider {
        SpotifyProvider::new(testing::config(testing::unreachable(), api_mock()))
    }

    fn token(s: &str) -> BearerToken {
        BearerToken(s.to_string())
    }

    #[tokio::test]
    async fn nothing_playing() {
        let provider = provider();
        assert_eq!(provider.now_playing_request(token("idle")).await.unwrap(), NowPlaying::idle());
        assert_eq!(provider.now_playing_request(token("empty")).await.unwrap(), NowPlaying::idle());
    }

    #[tokio::test]
    async fn relays_expiry_and_rate_limits() {
        let provider = provider();
        assert!(matches!(
            provider.now_playing_request(token("expired")).await,
            Err(Error::TokenExpired)
        ));
        assert!(matches!(
            provider.now_playing_request(token("limited")).await,
            Err(Error::RateLimited { retry_after: 45 })
        ));
        assert!(matches!(
            provider.now_playing_request(token("limited-bare")).await,
            Err(Error::RateLimited { retry_after: DEFAULT_RETRY_AFTER_SECS })
        ));
        assert!(matches!(
            provider.now_playing_request(token("broken")).await,
            Err(Error::Upstream { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn normalizes_track() {
        let now = provider().now_playing_request(token("playing")).await.unwrap();
        assert!(now.is_playing);
        let track = now.track.unwrap();
        assert_eq!(track.name, "Song");
        assert_eq!(track.artist, "A, B");
        assert_eq!(track.album_art, "https://img/640");
        assert_eq!(track.progress_ms, 5000);
    }
}
