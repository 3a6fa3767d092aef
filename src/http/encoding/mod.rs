pub mod error;
pub mod reply;

use crate::auth::RefreshRequest;
use crate::core::types::BearerToken;
use crate::provider::Error;
use warp::{Filter, Rejection};

const MAX_JSON_BODY: u64 = 16 * 1024;

/// `Authorization: Bearer <token>`; anything else is a 401.
pub fn bearer() -> impl Filter<Extract = (BearerToken,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(|s: Option<String>| async move {
        let token = match s.as_deref().and_then(|s| s.strip_prefix("Bearer ")) {
            Some(token) if !token.trim().is_empty() => Ok(BearerToken(token.trim().to_string())),
            _ => Err(Error::Unauthorized),
        };
        reply::accept(token)
    })
}

/// JSON refresh body. A body that does not parse is treated as one without a
/// token so the handler reports it as a missing parameter.
pub fn refresh_body() -> impl Filter<Extract = (RefreshRequest,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_JSON_BODY)
        .and(warp::body::bytes())
        .map(|body: warp::hyper::body::Bytes| serde_json::from_slice::<RefreshRequest>(&body).unwrap_or_default())
}
