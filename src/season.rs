//! Per-season inputs: which movies, their catalog ids, and known lookup quirks.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_SEASON_PATH: &str = "data/season.toml";

/// Placeholder left in `manual_posters` until someone finds a URL.
const URL_PLACEHOLDER: &str = "https://";

#[derive(Debug, Clone, Deserialize)]
pub struct Season {
    pub season: String,
    pub year: i32,
    pub radarr_tag: Option<String>,
    #[serde(default)]
    pub movies: Vec<SeasonMovie>,
    #[serde(default)]
    pub alternate_titles: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub manual_posters: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonMovie {
    pub title: String,
    pub tmdb_id: Option<u64>,
    pub imdb_id: Option<String>,
    pub year: Option<i32>,
}

impl Season {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read season file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid season file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("TOML parse failed")
    }

    pub fn tmdb_ids(&self) -> Vec<u64> {
        self.movies.iter().filter_map(|m| m.tmdb_id).collect()
    }

    /// Manual poster entries that actually carry a URL, sorted by filename.
    pub fn manual_urls(&self) -> Vec<(&str, &str)> {
        let mut urls: Vec<_> = self
            .manual_posters
            .iter()
            .filter(|(_, url)| {
                let url = url.trim();
                !url.is_empty() && url != URL_PLACEHOLDER
            })
            .map(|(f, u)| (f.as_str(), u.as_str()))
            .collect();
        urls.sort();
        urls
    }
}
