//! Parlor chat client binary.
//!
//! # Usage
//!
//! ```bash
//! # Local session against the in-memory backend
//! parlor
//!
//! # Firebase project, logging to a file
//! PARLOR_API_KEY=... parlor --backend firebase \
//!     --database-url https://project.firebaseio.com --log-file parlor.log
//! ```

use std::{fs::File, process::ExitCode, sync::Mutex};

use clap::Parser;
use parlor_app::{Exit, Runtime, RuntimeError};
use parlor_backend::{FirebaseBackend, MemoryBackend};
use parlor_core::Gateway;
use parlor_tui::{Args, BackendKind, TerminalDriver, TerminalError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install logging. Stdout is the chat, so logs only go to a file.
fn init_tracing(args: &Args) -> Result<(), std::io::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let file_layer = match &args.log_file {
        Some(path) => {
            let file = File::create(path)?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        },
        None => None,
    };

    tracing_subscriber::registry().with(file_layer).with(filter).init();
    Ok(())
}

async fn run_session<G: Gateway>(
    gateway: G,
    topic: String,
) -> Result<Exit, RuntimeError<TerminalError>> {
    let driver = TerminalDriver::new().map_err(RuntimeError::Driver)?;
    let mut runtime = Runtime::new(driver, gateway, topic);
    runtime.run().await
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args)?;

    let firebase = match args.backend {
        BackendKind::Firebase => Some(args.firebase_config()?),
        BackendKind::Memory => None,
    };

    tracing::info!(backend = ?args.backend, topic = %args.topic, "Parlor starting");

    let exit = match firebase {
        Some(config) => run_session(FirebaseBackend::new(config), args.topic).await?,
        None => run_session(MemoryBackend::new(), args.topic).await?,
    };

    tracing::info!(?exit, "Parlor stopped");
    Ok(ExitCode::from(u8::try_from(exit.code()).unwrap_or(1)))
}
