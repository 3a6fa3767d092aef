use std::sync::Arc;

use warp::Filter;

use crate::auth::{AuthorizeRequest, RefreshRequest};
use crate::core::types::BearerToken;
use crate::http::encoding::{self, reply};
use crate::provider::SpotifyProvider;

pub fn spotify_endpoint(
    provider: Arc<SpotifyProvider>,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_provider = warp::any().map(move || provider.clone());

    let authorize = warp::path!("authorize")
        .and(warp::get())
        .and(with_provider.clone())
        .and(warp::query())
        .and_then(|provider: Arc<SpotifyProvider>, req: AuthorizeRequest| async move {
            reply::reply(provider.authorization_request(req))
        });

    // Never fails: every outcome is a redirect back into the app, so the
    // query is parsed by the provider rather than by a rejecting filter
    let callback = warp::path!("callback")
        .and(warp::get())
        .and(with_provider.clone())
        .and(warp::query::raw().or(warp::any().map(String::new)).unify())
        .then(|provider: Arc<SpotifyProvider>, query: String| async move {
            provider.callback_query(&query).await
        });

    let refresh = warp::path!("refresh")
        .and(warp::post())
        .and(with_provider.clone())
        .and(encoding::refresh_body())
        .and_then(|provider: Arc<SpotifyProvider>, req: RefreshRequest| async move {
            reply::json_encode(provider.refresh_request(req).await)
        });

    let now_playing = warp::path!("currently-playing")
        .and(warp::get())
        .and(with_provider.clone())
        .and(encoding::bearer())
        .and_then(|provider: Arc<SpotifyProvider>, token: BearerToken| async move {
            reply::json_encode(provider.now_playing_request(token).await)
        });

    authorize.or(callback).or(refresh).or(now_playing)
}
