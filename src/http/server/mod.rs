use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use crate::provider::SpotifyProvider;

mod endpoints;

use endpoints::spotify::spotify_endpoint;

use super::encoding::error::handle_reject;

#[derive(Debug)]
pub struct Server {
    provider: Arc<SpotifyProvider>,
}

impl Server {
    pub fn new(provider: Arc<SpotifyProvider>) -> Self {
        Self {
            provider: Arc::clone(&provider),
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let spotify = warp::path("api")
            .and(warp::path("spotify"))
            .and(spotify_endpoint(self.provider.clone()));

        spotify
            .recover(handle_reject)
            .with(warp::log("http-api"))
    }

    /// Binds `addr` and returns the bound address with a server future that
    /// completes once `shutdown` resolves.
    pub fn bind_with_shutdown(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(SocketAddr, impl Future<Output = ()> + 'static), warp::Error> {
        let routes = self.routes();
        warp::serve(routes).try_bind_with_graceful_shutdown(addr, shutdown)
    }
}
