use serde::Deserialize;
use std::path::PathBuf;

/// Default retention cap for the search history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Base URL of the external lead-search backend. `None` runs in demo mode.
    pub search_api_url: Option<String>,
    pub search_api_token: Option<String>,
    pub search_api_timeout_secs: u64,
    pub history_capacity: usize,
    /// Snapshot file backing the history store, if any.
    pub history_path: Option<PathBuf>,
    pub seed_demo_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            search_api_url: None,
            search_api_token: None,
            search_api_timeout_secs: 30,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_path: None,
            seed_demo_history: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            search_api_url: std::env::var("SEARCH_API_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    let parsed = url::Url::parse(&url)
                        .map_err(|e| anyhow::anyhow!("SEARCH_API_URL is not a valid URL: {}", e))?;
                    if parsed.scheme() != "http" && parsed.scheme() != "https" {
                        anyhow::bail!("SEARCH_API_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })
                .transpose()?,
            search_api_token: std::env::var("SEARCH_API_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            search_api_timeout_secs: std::env::var("SEARCH_API_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    anyhow::anyhow!("SEARCH_API_TIMEOUT_SECS must be a positive number of seconds")
                })?,
            history_capacity: std::env::var("HISTORY_CAPACITY")
                .unwrap_or_else(|_| DEFAULT_HISTORY_CAPACITY.to_string())
                .parse()
                .ok()
                .filter(|cap| *cap > 0)
                .ok_or_else(|| anyhow::anyhow!("HISTORY_CAPACITY must be a positive number"))?,
            history_path: std::env::var("HISTORY_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            seed_demo_history: std::env::var("SEED_DEMO_HISTORY")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        match config.search_api_url {
            Some(ref url) => tracing::info!("Search API: {}", url),
            None => tracing::info!("SEARCH_API_URL not set, running in demo mode"),
        }
        if let Some(ref path) = config.history_path {
            tracing::info!("History snapshot: {}", path.display());
        }
        tracing::debug!("History capacity: {}", config.history_capacity);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
