//! Pairroom coordinator server.
//!
//! Tracks room presence, relays WebRTC signaling and collaborative editing events,
//! fans chat out and drives the interview lifecycle over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin pairroom-server
//! cargo run --bin pairroom-server -- --host 0.0.0.0 --port 3000 --database-url sqlite://pairroom.db
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use pairroom_server::{
    infrastructure::repository::{PersistenceGateway, RetryPolicy, SqliteConnector},
    ui::{Server, state::AppState},
    usecase::LifecyclePolicy,
};
use pairroom_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "pairroom-server")]
#[command(about = "Real-time interview room coordinator", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Durable store connection URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://pairroom.db")]
    database_url: String,

    /// Connection attempts before falling back to the in-memory store
    #[arg(long, default_value = "5")]
    connect_attempts: u32,

    /// Base delay of the exponential connection backoff (milliseconds)
    #[arg(long, default_value = "1000")]
    retry_base_delay_ms: u64,

    /// Upper bound of the connection backoff (milliseconds)
    #[arg(long, default_value = "5000")]
    retry_max_delay_ms: u64,

    /// Trust the role claimed on connect without checking the stored interviewer
    #[arg(long)]
    trust_claimed_role: bool,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logger(
        "pairroom_server",
        env!("CARGO_BIN_NAME"),
        &args.log_level,
    );

    // Initialize dependencies in order:
    // 1. Persistence Gateway (durable store or in-memory fallback)
    // 2. AppState (presence, message pusher, use cases)
    // 3. Server

    // 1. Select the persistence backend once for the lifetime of the process
    let gateway = Arc::new(PersistenceGateway::new());
    let policy = RetryPolicy {
        max_attempts: args.connect_attempts,
        base_delay: Duration::from_millis(args.retry_base_delay_ms),
        max_delay: Duration::from_millis(args.retry_max_delay_ms),
    };
    let backend = gateway
        .establish(&SqliteConnector::new(args.database_url), &policy)
        .await;
    tracing::info!("Persistence backend: {}", backend);

    // 2. Wire use cases
    let lifecycle = LifecyclePolicy {
        verify_interviewer_identity: !args.trust_claimed_role,
    };
    if args.trust_claimed_role {
        tracing::warn!("Interviewer identity is not verified when ending interviews");
    }
    let state = AppState::new(gateway, Arc::new(SystemClock), lifecycle);

    // 3. Run the server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
