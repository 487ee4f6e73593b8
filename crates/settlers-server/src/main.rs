//! Settlers game server.

use clap::Parser;
use settlers_core::GameConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod game_loop;
mod lobby;
mod protocol;
mod server;

use game_loop::GameLoop;
use server::ServerState;

#[derive(Parser)]
#[command(name = "settlers-server")]
#[command(about = "Authoritative server for a four-player Catan game")]
struct Args {
    #[arg(short, long, env = "SERVER_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    #[arg(short, long, default_value_t = 0, help = "Seats taken by computer players (0-4)")]
    bots: usize,

    #[arg(long, help = "Seed for the board, dice and card draws")]
    seed: Option<u64>,

    #[arg(long, default_value_t = 10)]
    victory_points: u32,

    #[arg(long, default_value_t = 30, help = "Seconds a trade offer stays open")]
    trade_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = GameConfig {
        seed: args.seed,
        victory_points_to_win: args.victory_points,
        trade_timeout_secs: args.trade_timeout,
        ..GameConfig::default()
    };

    info!("Starting Settlers server...");

    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let state = Arc::new(ServerState::new(inbound_tx));
    let game = GameLoop::new(config, args.bots.min(4));
    tokio::spawn(server::run_game_loop(game, inbound_rx, Arc::clone(&state)));

    server::run_server(args.addr, state).await
}
