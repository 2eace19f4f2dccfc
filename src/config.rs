use std::env;

use anyhow::{anyhow, Result};
use tracing::debug;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_DB_PATH: &str = "data/anglerpro.sqlite";

pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub db_path: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: var_or("ANGLERPRO_MODEL", DEFAULT_MODEL),
            api_base: var_or("ANGLERPRO_API_BASE", DEFAULT_API_BASE),
            db_path: var_or("ANGLERPRO_DB", DEFAULT_DB_PATH),
        }
    }

    /// Only `scout` talks to the API, so the key is checked lazily.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY environment variable must be set"))
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    })
}
