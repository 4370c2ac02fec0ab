//! Turning a poster request into an image URL.
//!
//! One trait, several sources: TMDB search by title, TMDB lookup by id,
//! the Radarr library, or a hand-maintained URL table. The pipeline does
//! not know which one it is driving.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::radarr::{RadarrApi, RadarrMovie};
use crate::slug::poster_filename;
use crate::tmdb::TmdbApi;

/// One poster the pipeline should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterItem {
    pub title: String,
    pub filename: String,
    pub tmdb_id: Option<u64>,
    pub imdb_id: Option<String>,
}

impl PosterItem {
    pub fn from_title(title: &str) -> Self {
        Self {
            title: title.to_string(),
            filename: poster_filename(title),
            tmdb_id: None,
            imdb_id: None,
        }
    }
}

#[async_trait]
pub trait PosterResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "no poster for this item"; it is not an error.
    async fn resolve(&self, item: &PosterItem) -> Result<Option<String>>;
}

/// TMDB title search with year and spelling fallbacks.
pub struct SearchResolver {
    tmdb: Arc<dyn TmdbApi>,
    year: i32,
    alternate_titles: HashMap<String, Vec<String>>,
}

impl SearchResolver {
    pub fn new(
        tmdb: Arc<dyn TmdbApi>,
        year: i32,
        alternate_titles: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            tmdb,
            year,
            alternate_titles,
        }
    }

    /// Query order: title in the season year, title a year earlier, then
    /// each known alternate spelling in the season year.
    pub fn attempts(&self, title: &str) -> Vec<(String, i32)> {
        let mut attempts = vec![
            (title.to_string(), self.year),
            (title.to_string(), self.year - 1),
        ];
        if let Some(alts) = self.alternate_titles.get(title) {
            attempts.extend(alts.iter().map(|alt| (alt.clone(), self.year)));
        }
        attempts
    }
}

#[async_trait]
impl PosterResolver for SearchResolver {
    fn name(&self) -> &'static str {
        "tmdb-search"
    }

    async fn resolve(&self, item: &PosterItem) -> Result<Option<String>> {
        for (query, year) in self.attempts(&item.title) {
            debug!("Searching TMDB for '{}' ({})", query, year);
            match self.tmdb.search_poster(&query, year).await {
                Ok(Some(url)) => {
                    if query != item.title || year != self.year {
                        info!("Matched '{}' via '{}' ({})", item.title, query, year);
                    }
                    return Ok(Some(url));
                }
                Ok(None) => {}
                Err(e) => warn!("TMDB search for '{}' ({}) failed: {:#}", query, year, e),
            }
        }
        Ok(None)
    }
}

/// Direct TMDB lookup by the item's TMDB id, or its IMDb id via `/find`.
pub struct IdResolver {
    tmdb: Arc<dyn TmdbApi>,
}

impl IdResolver {
    pub fn new(tmdb: Arc<dyn TmdbApi>) -> Self {
        Self { tmdb }
    }
}

#[async_trait]
impl PosterResolver for IdResolver {
    fn name(&self) -> &'static str {
        "tmdb-id"
    }

    async fn resolve(&self, item: &PosterItem) -> Result<Option<String>> {
        let id = match (item.tmdb_id, item.imdb_id.as_deref()) {
            (Some(id), _) => Some(id),
            (None, Some(imdb)) => self.tmdb.find_imdb(imdb).await?,
            (None, None) => None,
        };
        match id {
            Some(id) => self.tmdb.movie_poster(id).await,
            None => {
                warn!("'{}' has no TMDB or IMDb id", item.title);
                Ok(None)
            }
        }
    }
}

/// Posters Radarr already knows about, keyed by TMDB id.
pub struct OrchestratorResolver {
    posters: HashMap<u64, String>,
}

impl OrchestratorResolver {
    pub fn new(movies: &[RadarrMovie], base_url: &str) -> Self {
        let posters = movies
            .iter()
            .filter_map(|m| Some((m.tmdb_id?, m.poster_url(base_url)?)))
            .collect();
        Self { posters }
    }

    /// Fetches the library once and keeps the season's movies as poster items.
    pub async fn load(radarr: &dyn RadarrApi, tmdb_ids: &[u64]) -> Result<(Self, Vec<PosterItem>)> {
        let library = radarr.movies().await?;
        let season: Vec<RadarrMovie> = library
            .into_iter()
            .filter(|m| m.tmdb_id.is_some_and(|id| tmdb_ids.contains(&id)))
            .collect();
        info!("Radarr has {} of {} season movies", season.len(), tmdb_ids.len());
        let items = season
            .iter()
            .map(|m| PosterItem {
                tmdb_id: m.tmdb_id,
                imdb_id: m.imdb_id.clone(),
                ..PosterItem::from_title(&m.title)
            })
            .collect();
        Ok((Self::new(&season, radarr.base_url()), items))
    }
}

#[async_trait]
impl PosterResolver for OrchestratorResolver {
    fn name(&self) -> &'static str {
        "radarr"
    }

    async fn resolve(&self, item: &PosterItem) -> Result<Option<String>> {
        Ok(item.tmdb_id.and_then(|id| self.posters.get(&id).cloned()))
    }
}

/// Hand-collected URLs keyed by output filename.
pub struct ManualResolver {
    urls: HashMap<String, String>,
}

impl ManualResolver {
    pub fn new<'a>(urls: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            urls: urls
                .into_iter()
                .map(|(f, u)| (f.to_string(), u.to_string()))
                .collect(),
        }
    }

    /// Items named after the filename (without extension) since no title is known.
    pub fn items(&self) -> Vec<PosterItem> {
        let mut items: Vec<PosterItem> = self
            .urls
            .keys()
            .map(|filename| PosterItem {
                title: filename.trim_end_matches(".png").to_string(),
                filename: filename.clone(),
                tmdb_id: None,
                imdb_id: None,
            })
            .collect();
        items.sort_by(|a, b| a.filename.cmp(&b.filename));
        items
    }
}

#[async_trait]
impl PosterResolver for ManualResolver {
    fn name(&self) -> &'static str {
        "manual"
    }

    async fn resolve(&self, item: &PosterItem) -> Result<Option<String>> {
        Ok(self.urls.get(&item.filename).cloned())
    }
}
