use std::sync::Arc;

use clap::Parser;
use tracing::{event, Level};

use nowplaying::http::server::Server;
use nowplaying::provider::SpotifyProvider;
use nowplaying::util::cli::ServerOptions;

#[tokio::main]
async fn main() -> Result<(), warp::Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let opts = ServerOptions::parse();
    let bind = opts.bind;
    let provider = Arc::new(SpotifyProvider::new(opts.into_config()));

    let config = provider.config();
    if config.client_id.is_none() || config.redirect_uri.is_none() {
        event!(
            Level::WARN,
            "Spotify client id or redirect URI not set, requests will fail"
        );
    }

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let (addr, server) = Server::new(provider).bind_with_shutdown(bind, shutdown)?;
    event!(Level::INFO, %addr, "Listening");

    server.await;
    event!(Level::INFO, "Shut down");
    Ok(())
}
