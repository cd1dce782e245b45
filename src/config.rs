use std::env;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Path to the SQLite database file.
    pub database_path: String,
    /// Alpha Vantage API key for live stock quotes (optional, synthetic
    /// quotes are served without one).
    pub alpha_vantage_api_key: Option<String>,
    /// Cash balance granted to every new user.
    pub starting_balance: f64,
    /// Timeout for live quote requests (seconds).
    pub quote_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/moonbag.db".to_string()),
            alpha_vantage_api_key: env::var("ALPHA_VANTAGE_API_KEY").ok(),
            starting_balance: env::var("STARTING_BALANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000.0),
            quote_timeout_secs: env::var("QUOTE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
