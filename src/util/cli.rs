use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use url::Url;

use crate::client::poller::PollOutcome;
use crate::client::{self, FileStore, HttpBackend, Location, MemoryStore, Poller, TokenStore};
use crate::core::types::{ClientId, RedirectUri, Scope};
use crate::provider::Config;

#[derive(Parser)]
#[clap(
    name = "nowplayingd",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
pub struct ServerOptions {
    #[clap(long, env = "PUBLIC_SPOTIFY_CLIENT_ID")]
    client_id: Option<ClientId>,
    #[clap(long, env = "SPOTIFY_REDIRECT_URI")]
    redirect_uri: Option<RedirectUri>,
    #[clap(long, env = "NOWPLAYING_BIND", default_value = "127.0.0.1:4321")]
    pub bind: SocketAddr,
    #[clap(long, env = "NOWPLAYING_APP_PATH", default_value = "/visualizer")]
    app_path: String,
    #[clap(long, env = "SPOTIFY_ACCOUNTS_URL", default_value = "https://accounts.spotify.com")]
    accounts_url: Url,
    #[clap(long, env = "SPOTIFY_API_URL", default_value = "https://api.spotify.com")]
    api_url: Url,
    #[clap(long, env = "SPOTIFY_SCOPE", default_value = "user-read-currently-playing")]
    scope: Scope,
}

impl ServerOptions {
    pub fn into_config(self) -> Config {
        Config {
            client_id: self.client_id,
            redirect_uri: self.redirect_uri,
            scope: self.scope,
            app_path: self.app_path,
            accounts_url: self.accounts_url,
            api_url: self.api_url,
        }
    }
}

#[derive(Parser)]
#[clap(
    name = "nowplaying",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
pub struct Options {
    #[clap(long, env = "NOWPLAYING_SERVER", default_value = "http://127.0.0.1:4321")]
    server: Url,
    #[clap(long, env = "NOWPLAYING_STATE", default_value = ".nowplaying.json")]
    state: PathBuf,
    #[clap(subcommand)]
    command: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    /// Print the URL that starts the Spotify authorization
    Connect(Connect),
    /// Store the tokens from the URL the authorization redirected to
    Login(Login),
    /// Show the current track until interrupted
    Watch(Watch),
    /// Show the current track once
    Status(Status),
    /// Forget all stored tokens
    Logout(Logout),
}

#[derive(Parser)]
struct Connect;

#[derive(Parser)]
struct Login {
    location: String,
}

#[derive(Parser)]
struct Watch;

#[derive(Parser)]
struct Status;

#[derive(Parser)]
struct Logout;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot open state file: {0}")]
    State(#[from] io::Error),
    #[error(transparent)]
    Client(#[from] client::Error),
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("{0}")]
    NotConnected(String),
}

fn get_poller(opts: &Options) -> Result<Poller<HttpBackend>, CliError> {
    let durable = Arc::new(FileStore::open(&opts.state)?);
    let session = Arc::new(MemoryStore::new());
    let tokens = TokenStore::new(durable, session);
    Ok(Poller::new(HttpBackend::new(opts.server.clone()), tokens))
}

fn redirect_error(location: &Location) -> Option<String> {
    let query = location.query.as_deref()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "error")
        .map(|(_, v)| v.into_owned())
}

fn connect(_c: &Connect, poller: &Poller<HttpBackend>) -> Result<(), CliError> {
    let url = poller.connect()?;
    println!("Open this URL to connect Spotify:\n\n    {}\n", url);
    println!("Then run `nowplaying login <url>` with the address you land on.");
    Ok(())
}

fn login(c: &Login, poller: &mut Poller<HttpBackend>) -> Result<(), CliError> {
    let mut location: Location = c.location.parse()?;
    if let Some(error) = redirect_error(&location) {
        return Err(CliError::Authorization(error));
    }

    poller.mount(&mut location);
    if !poller.state().is_authenticated() {
        return Err(CliError::NotConnected(poller.state().render()));
    }
    println!("Connected.");
    Ok(())
}

async fn status(_c: &Status, poller: &mut Poller<HttpBackend>) -> Result<(), CliError> {
    poller.mount(&mut Location::new("/"));
    if poller.state().is_authenticated() {
        if let PollOutcome::Failed = poller.poll_once().await {
            poller.retry().await;
        }
    }
    println!("{}", poller.state().render());
    Ok(())
}

async fn watch(_c: &Watch, poller: &mut Poller<HttpBackend>) -> Result<(), CliError> {
    poller.mount(&mut Location::new("/"));
    if !poller.state().is_authenticated() {
        return Err(CliError::NotConnected(poller.state().render()));
    }

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    poller
        .run_until(shutdown, |state| println!("{}", state.render()))
        .await;

    // the loop only ends on its own when the session is gone
    if !poller.state().is_authenticated() {
        return Err(CliError::NotConnected(poller.state().render()));
    }
    Ok(())
}

fn logout(_c: &Logout, poller: &mut Poller<HttpBackend>) -> Result<(), CliError> {
    poller.disconnect();
    println!("Disconnected.");
    Ok(())
}

pub async fn run_cli_action(opts: Options) -> Result<(), CliError> {
    use SubCommand::*;

    let mut poller = get_poller(&opts)?;

    match &opts.command {
        Connect(c) => connect(c, &poller),
        Login(c) => login(c, &mut poller),
        Watch(c) => watch(c, &mut poller).await,
        Status(c) => status(c, &mut poller).await,
        Logout(c) => logout(c, &mut poller),
    }
}
