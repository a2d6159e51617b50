use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

#[derive(Clone, Debug, PartialEq)]
pub enum StoreBackend {
    /// `tasks.json` and `recurring.json` inside `data_dir`.
    Json { data_dir: PathBuf },
    Sqlite { database_url: String },
    Memory,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub tick_interval: Duration,
    pub bind_addr: SocketAddr,
    pub trend_window_days: u32,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "json".to_string());
        let store = match backend.trim().to_lowercase().as_str() {
            "json" => StoreBackend::Json {
                data_dir: PathBuf::from(lookup("DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            },
            "sqlite" => StoreBackend::Sqlite {
                database_url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite://worklog.db?mode=rwc".to_string()),
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(AppError::Config(format!(
                    "STORE_BACKEND must be json, sqlite or memory, got '{}'",
                    other
                )));
            }
        };

        let tick_secs: u64 = parse_or(&lookup, "TICK_INTERVAL_SECS", 60)?;
        if tick_secs == 0 {
            return Err(AppError::Config(
                "TICK_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let bind_addr = parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?;
        let trend_window_days = parse_or(&lookup, "TREND_WINDOW_DAYS", 7)?;

        Ok(Self {
            store,
            tick_interval: Duration::from_secs(tick_secs),
            bind_addr,
            trend_window_days,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value '{}'", key, raw))),
    }
}
