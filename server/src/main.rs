use clap::Parser;
use log::info;
use server::network::Server;
use shared::BoxError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the listener to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Directory for persisted leaderboard files
    #[arg(short, long, default_value = "leaderboards")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    std::fs::create_dir_all(&args.data_dir)?;

    let addr = format!("{}:{}", args.host, args.port);
    let mut server = Server::bind(&addr, &args.data_dir).await?;
    info!(
        "Leaderboard server on {} (data dir: {})",
        server.local_addr(),
        args.data_dir.display()
    );

    server.run().await
}
