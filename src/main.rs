mod api;
mod auth;
mod cli;
mod config;
mod dashboard;
mod dispatch;
mod engine;
mod model;
mod reference;
mod storage;

use std::{io, process};

use tracing_subscriber::{EnvFilter, fmt};

use config::Config;
use storage::Storage;

fn main() {
    // Diagnostics go to stderr so stdout stays clean for routes and tables.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    let root = Storage::default_root().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let storage = match Storage::new(root) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, &storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
