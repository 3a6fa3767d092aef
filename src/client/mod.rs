pub mod backend;
pub mod fragment;
pub mod poller;
pub mod storage;
pub mod token_store;

pub use backend::{Backend, HttpBackend, NowPlayingReply};
pub use fragment::Location;
pub use poller::{Poller, ViewState, Visibility};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use token_store::TokenStore;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed token payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay answered {0}")]
    Status(u16),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
