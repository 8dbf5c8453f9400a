use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub store_dir: PathBuf,
    pub retry_on_unauthorized: bool,
    pub request_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = env::var("INVOICE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let store_dir = match env::var("INVOICE_STORE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_store_dir()
                .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?,
        };
        let retry_on_unauthorized = env::var("INVOICE_RETRY_ON_UNAUTHORIZED")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(true);
        let request_timeout = env::var("INVOICE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Ok(Self {
            api_url,
            store_dir,
            retry_on_unauthorized,
            request_timeout,
        })
    }

    /// Config pointing at `api_url` with everything else defaulted. Used by tests
    /// and embedders that manage storage themselves.
    pub fn for_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            store_dir: default_store_dir().unwrap_or_else(|| PathBuf::from(".invoice-desk")),
            retry_on_unauthorized: true,
            request_timeout: None,
        }
    }
}

/// `~/.invoice-desk/`
pub fn default_store_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".invoice-desk"))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
