use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::fetch::Fetcher;
use crate::normalize::Normalizer;
use crate::resolver::{PosterItem, PosterResolver};
use crate::season::Season;

pub const DEFAULT_OUTPUT_DIR: &str = "images/1bit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Converted,
    Skipped,
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_titles: Vec<String>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.failed
    }

    fn record(&mut self, title: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Converted => self.converted += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::NotFound | Outcome::Failed(_) => {
                self.failed += 1;
                self.failed_titles.push(title.to_string());
            }
        }
    }
}

pub struct PosterPipeline<'a> {
    resolver: &'a dyn PosterResolver,
    fetcher: Fetcher,
    normalizer: Normalizer,
    output_dir: PathBuf,
    force: bool,
    scratch_root: Option<PathBuf>,
}

impl<'a> PosterPipeline<'a> {
    pub fn new(resolver: &'a dyn PosterResolver, fetcher: Fetcher, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            fetcher,
            normalizer: Normalizer::default(),
            output_dir: output_dir.into(),
            force: false,
            scratch_root: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Regenerate posters even when the output file already exists.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Parent for the per-run download directory; the system temp dir otherwise.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub async fn run(&self, items: &[PosterItem]) -> Result<RunSummary> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;
        let mut builder = tempfile::Builder::new();
        builder.prefix("reelboard-");
        // Deleted on drop, however the run ends.
        let scratch = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .context("Failed to create download directory")?;

        info!(
            "Processing {} posters with the {} resolver",
            items.len(),
            self.resolver.name()
        );
        let mut summary = RunSummary::default();
        for (i, item) in items.iter().enumerate() {
            let outcome = self.process(&scratch, i, item).await;
            let position = format!("[{}/{}]", i + 1, items.len());
            match &outcome {
                Outcome::Converted => info!("{} {} → {}", position, item.title, item.filename),
                Outcome::Skipped => info!("{} {}: already present", position, item.title),
                Outcome::NotFound => warn!("{} {}: no poster found", position, item.title),
                Outcome::Failed(reason) => warn!("{} {}: {}", position, item.title, reason),
            }
            summary.record(&item.title, &outcome);
        }

        info!(
            "Posters: {} converted, {} already present, {} failed ({} total)",
            summary.converted,
            summary.skipped,
            summary.failed,
            summary.total()
        );
        Ok(summary)
    }

    async fn process(&self, scratch: &TempDir, index: usize, item: &PosterItem) -> Outcome {
        let output = self.output_dir.join(&item.filename);
        if !self.force && output.exists() {
            return Outcome::Skipped;
        }

        let url = match self.resolver.resolve(item).await {
            Ok(Some(url)) => url,
            Ok(None) => return Outcome::NotFound,
            Err(e) => return Outcome::Failed(format!("lookup failed: {e:#}")),
        };

        let download = scratch.path().join(format!("download_{index}"));
        if let Err(e) = self.fetcher.download(&url, &download).await {
            return Outcome::Failed(format!("download failed: {e:#}"));
        }
        match self.normalizer.convert_file(&download, &output) {
            Ok(()) => Outcome::Converted,
            Err(e) => Outcome::Failed(format!("conversion failed: {e:#}")),
        }
    }
}

/// Catalog records whose poster file is absent from `output_dir`.
pub fn missing_from_catalog(catalog: &Catalog, output_dir: &Path) -> Vec<PosterItem> {
    catalog
        .movies
        .iter()
        .filter(|m| !output_dir.join(m.poster_file()).exists())
        .map(|m| PosterItem {
            title: m.title.clone(),
            filename: m.poster_file(),
            tmdb_id: m.tmdb_id,
            imdb_id: m.imdb_id.clone(),
        })
        .collect()
}

/// Every movie listed in the season file, named by title slug.
pub fn items_from_season(season: &Season) -> Vec<PosterItem> {
    season
        .movies
        .iter()
        .map(|m| PosterItem {
            tmdb_id: m.tmdb_id,
            imdb_id: m.imdb_id.clone(),
            ..PosterItem::from_title(&m.title)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{catalog, movie};

    #[test]
    fn records_without_image_filename_count_as_missing() {
        let out = tempfile::tempdir().unwrap();
        fs::write(out.path().join("the-christmas-cup.png"), b"done").unwrap();
        let mut blank = movie("Three Wisest Men", "2025-11-01");
        blank.image = String::new();
        let mut dir_only = movie("Oy to the World!", "2025-11-02");
        dir_only.image = "images/1bit/".to_string();
        let c = catalog(vec![movie("The Christmas Cup", "2025-11-03"), blank, dir_only]);

        let missing = missing_from_catalog(&c, out.path());
        let files: Vec<&str> = missing.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(files, vec!["three-wisest-men.png", "oy-to-the-world.png"]);
    }
}
