//! The season schedule document (`data/movies.json`).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::slug::poster_filename;

pub const DEFAULT_CATALOG_PATH: &str = "data/movies.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub season: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub title: String,
    pub date: NaiveDate,
    pub time: String,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stars: String,
    #[serde(default)]
    pub premiere: bool,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Fields this tool does not interpret; written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Movie {
    /// Last path segment of `image`, i.e. the poster file this record expects.
    pub fn image_filename(&self) -> &str {
        self.image.rsplit('/').next().unwrap_or(&self.image)
    }

    /// Poster file to read or produce: `image_filename`, or the title slug
    /// when the record names no file.
    pub fn poster_file(&self) -> String {
        match self.image_filename() {
            "" => poster_filename(&self.title),
            name => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
    pub before: usize,
    pub after: usize,
}

impl FilterReport {
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut text = serde_json::to_string_pretty(self).context("Failed to serialize catalog")?;
        text.push('\n');
        fs::write(path, text).with_context(|| format!("Failed to write catalog {}", path.display()))
    }

    /// Keeps only records airing on or after `cutoff`.
    pub fn retain_from(&mut self, cutoff: NaiveDate) -> FilterReport {
        let before = self.movies.len();
        self.movies.retain(|m| m.date >= cutoff);
        FilterReport {
            before,
            after: self.movies.len(),
        }
    }

    /// Records on or after `today`, in document order, at most `limit`.
    pub fn upcoming(&self, today: NaiveDate, limit: usize) -> impl Iterator<Item = &Movie> {
        self.movies.iter().filter(move |m| m.date >= today).take(limit)
    }

    /// Records whose `image` filename is not the slug of their title.
    pub fn slug_mismatches(&self) -> Vec<(&Movie, String)> {
        self.movies
            .iter()
            .filter_map(|m| {
                let expected = poster_filename(&m.title);
                (m.image_filename() != expected).then_some((m, expected))
            })
            .collect()
    }

    /// Distinct titles that map onto the same poster filename.
    pub fn slug_collisions(&self) -> Vec<(String, Vec<&str>)> {
        let mut by_slug: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for m in &self.movies {
            let titles = by_slug.entry(poster_filename(&m.title)).or_default();
            if !titles.contains(&m.title.as_str()) {
                titles.push(&m.title);
            }
        }
        by_slug.into_iter().filter(|(_, t)| t.len() > 1).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn movie(title: &str, date: &str) -> Movie {
        Movie {
            title: title.to_string(),
            date: date.parse().expect("valid date"),
            time: "20:00".to_string(),
            channel: "Hallmark Channel".to_string(),
            duration_minutes: Some(120),
            description: String::new(),
            stars: String::new(),
            premiere: true,
            image: crate::slug::catalog_image_path(title),
            tmdb_id: None,
            imdb_id: None,
            extra: Map::new(),
        }
    }

    pub(crate) fn catalog(movies: Vec<Movie>) -> Catalog {
        Catalog {
            season: "2025 Countdown to Christmas".to_string(),
            start_date: "2025-10-17".parse().expect("valid date"),
            end_date: "2025-12-25".parse().expect("valid date"),
            movies,
        }
    }

    #[test]
    fn cutoff_keeps_same_day_and_later() {
        let mut c = catalog(vec![
            movie("A Newport Christmas", "2025-11-30"),
            movie("Christmas on Duty", "2025-12-01"),
        ]);
        let cutoff = "2025-12-01".parse().unwrap();
        let report = c.retain_from(cutoff);
        assert_eq!(report, FilterReport { before: 2, after: 1 });
        assert_eq!(report.removed(), 1);
        assert_eq!(c.movies[0].title, "Christmas on Duty");
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let mut c = catalog(vec![
            movie("One", "2025-11-01"),
            movie("Two", "2025-12-02"),
            movie("Three", "2025-12-20"),
        ]);
        let cutoff = "2025-12-01".parse().unwrap();
        c.retain_from(cutoff);
        let once = c.clone();
        let report = c.retain_from(cutoff);
        assert_eq!(report.before, report.after);
        assert_eq!(c, once);
    }

    #[test]
    fn upcoming_is_bounded_and_skips_past() {
        let c = catalog(vec![
            movie("Past", "2025-11-01"),
            movie("One", "2025-12-02"),
            movie("Two", "2025-12-03"),
            movie("Three", "2025-12-04"),
        ]);
        let today = "2025-12-01".parse().unwrap();
        let titles: Vec<_> = c.upcoming(today, 2).map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[test]
    fn round_trips_unknown_fields() {
        let doc = json!({
            "season": "S",
            "start_date": "2025-10-17",
            "end_date": "2025-12-25",
            "movies": [{
                "title": "The Christmas Cup",
                "date": "2025-11-08",
                "time": "20:00",
                "channel": "Hallmark Channel",
                "duration_minutes": 120,
                "description": "d",
                "stars": "s",
                "premiere": true,
                "image": "images/1bit/the-christmas-cup.png",
                "network_note": "encore at 10"
            }]
        });
        let c: Catalog = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(c.movies[0].extra.get("network_note"), Some(&json!("encore at 10")));
        assert_eq!(serde_json::to_value(&c).unwrap(), doc);
    }

    #[test]
    fn reports_slug_mismatch_and_collisions() {
        let mut odd = movie("Oy to the World!", "2025-11-01");
        odd.image = "images/1bit/oy-to-the-world-2025.png".to_string();
        let c = catalog(vec![
            odd,
            movie("She's Making a List", "2025-11-02"),
            movie("Shes Making a List", "2025-11-03"),
        ]);
        let mismatches = c.slug_mismatches();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].1, "oy-to-the-world.png");

        let collisions = c.slug_collisions();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].0, "shes-making-a-list.png");
        assert_eq!(collisions[0].1.len(), 2);
    }

    #[test]
    fn save_and_load_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("movies.json");
        let c = catalog(vec![movie("The Snow Must Go On", "2025-12-12")]);
        c.save(&path).unwrap();
        assert_eq!(Catalog::load(&path).unwrap(), c);
    }
}
