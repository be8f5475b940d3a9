use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the anime metadata CSV
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the trained embedding model artifact (JSON)
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for a single batched inference call
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,
}

fn default_catalog_path() -> String {
    "anime-dataset-2023.csv".to_string()
}

fn default_model_path() -> String {
    "anime_recommender.json".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_inference_timeout_ms() -> u64 {
    5000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
