use crate::import::ImportConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Application configuration
/// In debug builds: loads .env first, then environment variables
/// In release builds: environment variables only
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the database and settings file
    pub library_path: PathBuf,
    /// Worker tuning for imports
    pub import: ImportConfig,
}

impl Config {
    /// Load configuration based on build mode
    pub fn load() -> Self {
        #[cfg(debug_assertions)]
        {
            // Try to load .env file
            if dotenvy::dotenv().is_ok() {
                info!("Dev mode activated - loaded .env file");
            } else {
                info!("No .env file found, using environment only");
            }
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let library_path = std::env::var("ECHO_LIBRARY_PATH")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(default_library_path);

        let defaults = ImportConfig::default();
        let import = ImportConfig {
            sub_batch_size: env_number("ECHO_SUB_BATCH_SIZE")
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .unwrap_or(defaults.sub_batch_size),
            debounce: env_number("ECHO_DEBOUNCE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            batch_yield: env_number("ECHO_BATCH_YIELD_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.batch_yield),
        };

        info!("Library path: {}", library_path.display());

        Self {
            library_path,
            import,
        }
    }

    /// SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.library_path.join("library.db")
    }

    /// Settings file holding the watched folders
    pub fn settings_path(&self) -> PathBuf {
        self.library_path.join("settings.json")
    }
}

/// `~/.echo`, or `.echo` in the working directory when there is no home
fn default_library_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".echo"),
        None => {
            warn!("No home directory, using ./.echo");
            PathBuf::from(".echo")
        }
    }
}

fn env_number(key: &str) -> Option<u64> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", key, value);
            None
        }
    }
}
