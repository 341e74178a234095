use hangman_core::IdlePolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where room snapshots are kept between actor lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceBackend {
    Sqlite,
    Memory,
}

impl FromStr for PersistenceBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown persistence backend: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub idle_reset_seconds: u64,
    pub room_channel_size: usize,
    pub persistence: PersistenceBackend,
    pub database_url: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            idle_reset_seconds: env::var("IDLE_RESET_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid IDLE_RESET_SECONDS"),
            room_channel_size: env::var("ROOM_CHANNEL_SIZE")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .expect("Invalid ROOM_CHANNEL_SIZE"),
            persistence: env::var("PERSISTENCE")
                .unwrap_or_else(|_| "sqlite".to_string())
                .parse()
                .expect("Invalid PERSISTENCE"),
            database_url: hangman_persistence::connection::database_url_from_env(),
        }
    }

    pub fn idle_policy(&self) -> IdlePolicy {
        IdlePolicy::new(Duration::from_secs(self.idle_reset_seconds))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
