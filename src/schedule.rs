//! Building a catalog from a hand-transcribed network listing.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Map;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::catalog::{Catalog, Movie};
use crate::slug::catalog_image_path;

const DEFAULT_CHANNEL: &str = "Hallmark Channel";
const DEFAULT_DURATION: u32 = 120;
const DEFAULT_TIME: &str = "20:00";

/// One row of a raw listing, as copied from the network's programming guide.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingEntry {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub time: String,
    pub channel: Option<String>,
    pub duration: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stars: String,
    pub premiere: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct SeasonHeader {
    pub season: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub year: i32,
}

pub fn load_listing(path: &Path) -> Result<Vec<ListingEntry>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read listing {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse listing {}", path.display()))
}

/// `"Friday, October 18"`, `"October 18"` or `"Oct 18"` in the given year.
/// A leading weekday is ignored, even when it disagrees with the date.
pub fn normalize_date(input: &str, year: i32) -> Option<NaiveDate> {
    let input = input.trim();
    let day = match input.split_once(',') {
        Some((_, rest)) => rest.trim(),
        None => input,
    };
    let dated = format!("{day}, {year}");
    ["%B %d, %Y", "%b %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&dated, fmt).ok())
}

/// Eastern start hour as `HH:00`; listings give `8/7c`, `8 PM ET/PT`, `9 AM`.
pub fn normalize_time(input: &str) -> String {
    let digits: String = input
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let Ok(hour) = digits.parse::<u32>() else {
        return DEFAULT_TIME.to_string();
    };
    let upper = input.to_ascii_uppercase();
    let hour = if upper.contains("AM") && !upper.contains("PM") {
        hour % 12
    } else if hour < 12 {
        hour + 12
    } else {
        hour
    };
    format!("{:02}:00", hour % 24)
}

/// Converts listing rows into catalog records; rows with unreadable dates are dropped.
pub fn build_catalog(header: &SeasonHeader, entries: &[ListingEntry]) -> Catalog {
    let movies = entries
        .iter()
        .filter_map(|entry| {
            let Some(date) = normalize_date(&entry.date, header.year) else {
                warn!("Skipping '{}': unreadable date '{}'", entry.title, entry.date);
                return None;
            };
            Some(Movie {
                title: entry.title.clone(),
                date,
                time: normalize_time(&entry.time),
                channel: entry
                    .channel
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
                duration_minutes: Some(entry.duration.unwrap_or(DEFAULT_DURATION)),
                description: entry.description.clone(),
                stars: entry.stars.clone(),
                premiere: entry.premiere.unwrap_or(true),
                image: catalog_image_path(&entry.title),
                tmdb_id: None,
                imdb_id: None,
                extra: Map::new(),
            })
        })
        .collect();

    Catalog {
        season: header.season.clone(),
        start_date: header.start_date,
        end_date: header.end_date,
        movies,
    }
}
