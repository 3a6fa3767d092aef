use clap::Parser;

#[tokio::main]
async fn main() {
    use nowplaying::util::cli::*;

    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let opts = Options::parse();
    if let Err(e) = run_cli_action(opts).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
