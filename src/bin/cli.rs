//! VersoKV CLI Client
//!
//! Command-line interface for interacting with VersoKV.

use std::sync::{Arc, Barrier};
use std::thread;

use clap::{Parser, Subcommand};
use versokv::network::Client;
use versokv::protocol::{Response, Status};
use versokv::{ResourceId, Result, Version, VersoError, Workout};

/// VersoKV CLI
#[derive(Parser, Debug)]
#[command(name = "versokv-cli")]
#[command(about = "CLI for the VersoKV versioned store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    server: String,

    /// Bearer token
    #[arg(short, long, default_value = "")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a workout
    Get {
        id: ResourceId,
    },

    /// Create a workout from a JSON body
    Create {
        /// Workout JSON (title, description, duration_minutes, calories_burned, entries)
        #[arg(short, long)]
        body: String,
    },

    /// Replace a workout if its version still matches
    Update {
        id: ResourceId,

        /// Version the update is based on
        #[arg(short, long)]
        version: Version,

        /// Workout JSON without the version
        #[arg(short, long)]
        body: String,
    },

    /// Delete a workout
    Del {
        id: ResourceId,
    },

    /// Fire concurrent updates that all claim the same version
    Race {
        id: ResourceId,

        /// Number of concurrent writers
        #[arg(short, long, default_value = "2")]
        writers: usize,

        /// Version every writer submits (defaults to the current one)
        #[arg(short, long)]
        version: Option<Version>,

        /// On conflict, retry with the version from the conflict body
        #[arg(short, long)]
        retry: bool,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server, &args.token)?;

    match args.command {
        Commands::Get { id } => print_response(&client.get(id)?),
        Commands::Create { body } => {
            let workout: Workout = serde_json::from_str(&body)?;
            print_response(&client.create(&workout)?);
        }
        Commands::Update { id, version, body } => {
            let workout: Workout = serde_json::from_str(&body)?;
            print_response(&client.update(id, version, &workout)?);
        }
        Commands::Del { id } => print_response(&client.delete(id)?),
        Commands::Ping => print_response(&client.ping()?),
        Commands::Race {
            id,
            writers,
            version,
            retry,
        } => race(&args.server, &args.token, client, id, writers, version, retry)?,
    }

    Ok(())
}

/// Read the workout once, then let `writers` threads submit retitled copies
/// at the same moment
fn race(
    server: &str,
    token: &str,
    mut client: Client,
    id: ResourceId,
    writers: usize,
    version: Option<Version>,
    retry: bool,
) -> Result<()> {
    let current = client.get(id)?;
    let Some(base) = current.resource_body() else {
        print_response(&current);
        return Err(VersoError::NotFound(id));
    };
    let version = version.unwrap_or(base.version);

    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|n| {
            let barrier = Arc::clone(&barrier);
            let server = server.to_string();
            let token = token.to_string();
            let mut workout = base.workout.clone();
            workout.title = format!("Update #{}", n + 1);

            thread::spawn(move || -> Result<(usize, Response, usize)> {
                let mut client = Client::connect(&server, token)?;
                barrier.wait();

                let mut attempts = 1;
                let mut response = client.update(id, version, &workout)?;
                while retry && response.status == Status::Conflict {
                    let Some(conflict) = response.conflict_body() else {
                        break;
                    };
                    attempts += 1;
                    response = client.update(id, conflict.current_version, &workout)?;
                }
                Ok((n + 1, response, attempts))
            })
        })
        .collect();

    for handle in handles {
        let (writer, response, attempts) = handle
            .join()
            .map_err(|_| VersoError::Internal("writer thread panicked".to_string()))??;
        println!("[writer {}] attempts: {}", writer, attempts);
        print_response(&response);
    }

    Ok(())
}

fn print_response(response: &Response) {
    println!("Status: {}", response.status.as_str());
    if let Some(body) = &response.body {
        match serde_json::to_string_pretty(body) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", body),
        }
    }
}
