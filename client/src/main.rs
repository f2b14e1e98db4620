use clap::Parser;
use client::network::Client;
use log::info;
use shared::{BoxError, LevelId, PlayerEntry, SortMethod};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:7777")]
    server: String,

    /// Connection timeout in seconds
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    /// Level whose leaderboard to use (no_motion, beginner, advanced, practice)
    #[arg(short, long, default_value = "beginner")]
    level: String,

    /// Submit an entry under this player name before requesting the board
    #[arg(short, long)]
    name: Option<String>,

    /// Score for the submitted entry
    #[arg(long, default_value = "0")]
    score: i32,

    /// Number of entries to request
    #[arg(short, long, default_value = "10")]
    count: i32,
}

fn parse_level(name: &str) -> Result<LevelId, BoxError> {
    LevelId::ALL
        .into_iter()
        .find(|level| level.name() == name)
        .ok_or_else(|| format!("unknown level '{name}'").into())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let level = parse_level(&args.level)?;

    let mut client = Client::new();
    if !client.connect(&args.server, args.timeout).await {
        for event in client.drain_events() {
            eprintln!("{:?}", event);
        }
        return Err(format!("could not connect to {}", args.server).into());
    }

    client.send_user_connected().await;

    if let Some(name) = &args.name {
        let entry = PlayerEntry {
            player_name: name.clone(),
            score: args.score,
            ..PlayerEntry::default()
        };
        info!("Submitting entry for '{}' with score {}", name, args.score);
        client.send_write_to_leaderboard(level, &entry).await;
    }

    client
        .send_leaderboard_request(level, args.count, 0, SortMethod::HighestScore)
        .await;

    // Wait briefly for the reply to land in the holding area.
    let mut entries = Vec::new();
    for _ in 0..50 {
        entries = client.take_leaderboard_entries(level);
        if !entries.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    println!("Leaderboard for {:?}:", level);
    for (rank, entry) in entries.iter().enumerate() {
        if entry.player_name.is_empty() {
            println!("{:3}. (empty)", rank + 1);
        } else {
            println!(
                "{:3}. {:<20} score {:>8} accuracy {:>5.1}%",
                rank + 1,
                entry.player_name,
                entry.score,
                entry.accuracy
            );
        }
    }

    for event in client.drain_events() {
        info!("{:?}", event);
    }

    client.disconnect_from_server().await;
    Ok(())
}
