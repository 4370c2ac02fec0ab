//! Credentials and endpoints, read from the environment (`.env` supported).

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const TRMNL_BASE: &str = "https://usetrmnl.com";

#[derive(Debug, Clone)]
pub struct TmdbSettings {
    pub api_key: String,
    pub base_url: String,
    pub image_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RadarrSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TrmnlSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl TmdbSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: required("TMDB_API_KEY")?,
            base_url: optional("TMDB_BASE_URL").unwrap_or_else(|| TMDB_BASE.to_string()),
            image_base: optional("TMDB_IMAGE_BASE").unwrap_or_else(|| TMDB_IMAGE_BASE.to_string()),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

impl RadarrSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: required("RADARR_URL")?,
            api_key: required("RADARR_API_KEY")?,
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

impl TrmnlSettings {
    pub fn from_env() -> Self {
        Self {
            base_url: optional("TRMNL_BASE_URL").unwrap_or_else(|| TRMNL_BASE.to_string()),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("Missing required environment variable: {key}"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}
