use crate::core::types::{AccessToken, RefreshToken};

/// Tokens handed to the client after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub expires_in: u64,
}

/// Result of a refresh grant. The refresh token is not rotated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RefreshedToken {
    pub access_token: AccessToken,
    pub expires_in: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TrackSnapshot {
    pub name: String,
    pub artist: String,
    pub album: String,
    #[serde(rename = "albumArt")]
    pub album_art: String,
    pub progress_ms: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct NowPlaying {
    #[serde(rename = "isPlaying")]
    pub is_playing: bool,
    pub track: Option<TrackSnapshot>,
}

impl NowPlaying {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Subset of Spotify's `currently-playing` object the proxy cares about.
pub mod upstream {
    #[derive(Debug, serde::Deserialize)]
    pub struct CurrentlyPlaying {
        #[serde(default)]
        pub is_playing: bool,
        #[serde(default)]
        pub progress_ms: Option<u64>,
        #[serde(default)]
        pub item: Option<Item>,
    }

    #[derive(Debug, serde::Deserialize)]
    pub struct Item {
        pub name: String,
        #[serde(default)]
        pub duration_ms: u64,
        #[serde(default)]
        pub artists: Vec<Artist>,
        pub album: Album,
    }

    #[derive(Debug, serde::Deserialize)]
    pub struct Artist {
        pub name: String,
    }

    #[derive(Debug, serde::Deserialize)]
    pub struct Album {
        pub name: String,
        #[serde(default)]
        pub images: Vec<Image>,
    }

    #[derive(Debug, serde::Deserialize)]
    pub struct Image {
        pub url: String,
    }

    #[derive(Debug, serde::Deserialize)]
    pub struct TokenResponse {
        pub access_token: String,
        #[serde(default)]
        pub refresh_token: Option<String>,
        pub expires_in: u64,
    }
}

impl From<upstream::CurrentlyPlaying> for NowPlaying {
    fn from(data: upstream::CurrentlyPlaying) -> Self {
        let progress_ms = data.progress_ms.unwrap_or(0);
        let track = data.item.map(|item| TrackSnapshot {
            artist: item
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            album_art: item
                .album
                .images
                .first()
                .map(|i| i.url.clone())
                .unwrap_or_default(),
            name: item.name,
            album: item.album.name,
            progress_ms,
            duration_ms: item.duration_ms,
        });

        Self {
            is_playing: data.is_playing,
            track,
        }
    }
}
