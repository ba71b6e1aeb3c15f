//! VersoKV Server Binary
//!
//! Starts the TCP server over an in-memory versioned store.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use versokv::network::Server;
use versokv::{
    Config, MemoryStore, Principal, RequestHandler, StaticTokenValidator, Workout, WorkoutEntry,
};

/// VersoKV Server
#[derive(Parser, Debug)]
#[command(name = "versokv-server")]
#[command(about = "Versioned resource store with optimistic concurrency control")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Number of lock shards in the resource table
    #[arg(short, long, default_value = "16")]
    shards: usize,

    /// Accept workouts with a blank title
    #[arg(long)]
    allow_empty_title: bool,

    /// Accepted credential, as USER_ID:NAME:TOKEN (repeatable)
    #[arg(short, long = "token", value_parser = parse_token)]
    tokens: Vec<(String, Principal)>,

    /// Create a sample workout with this id, owned by the first token's user (repeatable)
    #[arg(long = "seed")]
    seeds: Vec<u64>,
}

fn parse_token(s: &str) -> Result<(String, Principal), String> {
    let mut parts = s.splitn(3, ':');
    let (Some(user_id), Some(name), Some(token)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err("expected USER_ID:NAME:TOKEN".to_string());
    };

    let user_id = user_id
        .parse::<u64>()
        .map_err(|e| format!("invalid user id {:?}: {}", user_id, e))?;
    if token.is_empty() {
        return Err("token must not be empty".to_string());
    }

    Ok((
        token.to_string(),
        Principal {
            user_id,
            name: name.to_string(),
        },
    ))
}

fn sample_workout() -> Workout {
    Workout {
        title: "Morning walk".to_string(),
        description: "Seeded at startup".to_string(),
        duration_minutes: 45,
        calories_burned: 250,
        entries: vec![WorkoutEntry {
            exercise_name: "Walking".to_string(),
            sets: 1,
            duration_seconds: Some(2700),
            weight: Some(0.0),
            notes: "Keep a steady pace".to_string(),
            order_index: 1,
            ..Default::default()
        }],
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,versokv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("VersoKV Server v{}", versokv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .shard_count(args.shards)
        .allow_empty_title(args.allow_empty_title)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    if args.tokens.is_empty() {
        tracing::warn!("No tokens configured; every request will be unauthorized");
    }

    let auth = StaticTokenValidator::new();
    let first_user = args.tokens.first().map(|(_, p)| p.user_id);
    for (token, principal) in args.tokens {
        tracing::info!("Accepting token for user {} ({})", principal.user_id, principal.name);
        auth.insert(token, principal);
    }

    let store = MemoryStore::with_config(&config);
    if !args.seeds.is_empty() {
        let Some(owner) = first_user else {
            tracing::error!("--seed needs at least one --token to own the workouts");
            std::process::exit(1);
        };
        for id in args.seeds {
            if let Err(e) = store.insert(id, owner, sample_workout()) {
                tracing::error!("Failed to seed workout {}: {}", id, e);
                std::process::exit(1);
            }
            tracing::info!("Seeded workout {} for user {}", id, owner);
        }
    }

    let handler = Arc::new(RequestHandler::new(
        Arc::new(store),
        Arc::new(auth),
        config.validation,
    ));

    let server = match Server::bind(config, handler) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
