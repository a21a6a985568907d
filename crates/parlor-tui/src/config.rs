//! Command-line configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use parlor_backend::FirebaseConfig;
use thiserror::Error;

/// Which gateway the session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// In-process accounts and messages. Nothing persists.
    Memory,
    /// A Firebase project (Identity Toolkit and Realtime Database).
    Firebase,
}

/// Configuration errors, reported before the terminal is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Firebase mode needs an API key.
    #[error("--api-key (or PARLOR_API_KEY) is required with --backend firebase")]
    MissingApiKey,

    /// Firebase mode needs a database URL.
    #[error("--database-url (or PARLOR_DATABASE_URL) is required with --backend firebase")]
    MissingDatabaseUrl,
}

/// Parlor terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(about = "Terminal chat client with email sign-in")]
#[command(version)]
pub struct Args {
    /// Backend to use
    #[arg(short, long, value_enum, default_value = "memory")]
    pub backend: BackendKind,

    /// Firebase Web API key
    #[arg(long, env = "PARLOR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Firebase Realtime Database URL
    #[arg(long, env = "PARLOR_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Topic holding the shared message list
    #[arg(short, long, default_value = "messages")]
    pub topic: String,

    /// Write logs to this file (stdout is the chat)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Firebase settings from the arguments.
    pub fn firebase_config(&self) -> Result<FirebaseConfig, ConfigError> {
        let api_key = self.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        let database_url = self.database_url.clone().ok_or(ConfigError::MissingDatabaseUrl)?;
        Ok(FirebaseConfig { api_key, database_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_memory_backend() {
        let args = Args::try_parse_from(["parlor"]).unwrap();

        assert_eq!(args.backend, BackendKind::Memory);
        assert_eq!(args.topic, "messages");
        assert_eq!(args.log_level, "info");
        assert!(args.log_file.is_none());
    }

    #[test]
    fn firebase_needs_key_and_url() {
        let args = Args::try_parse_from([
            "parlor",
            "--backend",
            "firebase",
            "--database-url",
            "https://demo.firebaseio.com",
        ])
        .unwrap();
        if args.api_key.is_none() {
            assert_eq!(args.firebase_config().unwrap_err(), ConfigError::MissingApiKey);
        }

        let args = Args::try_parse_from([
            "parlor",
            "--backend",
            "firebase",
            "--api-key",
            "k",
            "--database-url",
            "https://demo.firebaseio.com",
        ])
        .unwrap();
        let config = args.firebase_config().unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.database_url, "https://demo.firebaseio.com");
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Args::try_parse_from(["parlor", "--backend", "sqlite"]).is_err());
    }
}
