use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::radarr::{AddOptions, NewMovie, RadarrApi};
use crate::season::SeasonMovie;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Existing tag id for `label` (case-insensitive), creating it if needed.
pub async fn ensure_tag(radarr: &dyn RadarrApi, label: &str) -> Result<i64> {
    let tags = radarr.tags().await.context("Failed to list Radarr tags")?;
    if let Some(tag) = tags.iter().find(|t| t.label.eq_ignore_ascii_case(label)) {
        return Ok(tag.id);
    }
    info!("Creating Radarr tag '{}'", label);
    let tag = radarr
        .create_tag(label)
        .await
        .with_context(|| format!("Failed to create Radarr tag '{label}'"))?;
    Ok(tag.id)
}

/// Adds every season movie Radarr does not already track.
pub async fn add_season(
    radarr: &dyn RadarrApi,
    movies: &[SeasonMovie],
    tag_label: &str,
) -> Result<AddReport> {
    let root_folder = radarr
        .root_folders()
        .await
        .context("Failed to list Radarr root folders")?
        .into_iter()
        .next()
        .map(|f| f.path)
        .context("Radarr has no root folders configured")?;
    let profile = radarr
        .quality_profiles()
        .await
        .context("Failed to list Radarr quality profiles")?
        .into_iter()
        .next()
        .context("Radarr has no quality profiles configured")?;
    info!("Root folder: {}", root_folder);
    info!("Quality profile: {} ({})", profile.name, profile.id);

    let tag_id = ensure_tag(radarr, tag_label).await?;
    info!("Tag: {} ({})", tag_label, tag_id);

    let existing: HashSet<u64> = radarr
        .movies()
        .await
        .context("Failed to list Radarr movies")?
        .into_iter()
        .filter_map(|m| m.tmdb_id)
        .collect();

    let mut report = AddReport::default();
    for movie in movies {
        let Some(tmdb_id) = movie.tmdb_id else {
            warn!("'{}' has no TMDB id; cannot add to Radarr", movie.title);
            report.failed += 1;
            continue;
        };
        if existing.contains(&tmdb_id) {
            info!("'{}' is already in Radarr", movie.title);
            report.skipped += 1;
            continue;
        }

        let found = match radarr.lookup_tmdb(tmdb_id).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                error!("Radarr lookup found nothing for '{}' ({})", movie.title, tmdb_id);
                report.failed += 1;
                continue;
            }
            Err(e) => {
                error!("Radarr lookup for '{}' failed: {:#}", movie.title, e);
                report.failed += 1;
                continue;
            }
        };

        let payload = NewMovie {
            title: found.title,
            year: found.year.or(movie.year),
            tmdb_id: found.tmdb_id.unwrap_or(tmdb_id),
            imdb_id: found.imdb_id.or_else(|| movie.imdb_id.clone()),
            quality_profile_id: profile.id,
            root_folder_path: root_folder.clone(),
            monitored: true,
            add_options: AddOptions {
                search_for_movie: true,
            },
            tags: vec![tag_id],
        };
        match radarr.add_movie(&payload).await {
            Ok(()) => {
                info!("Added '{}' to Radarr", payload.title);
                report.added += 1;
            }
            Err(e) => {
                error!("Failed to add '{}': {:#}", movie.title, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Radarr: {} added, {} already present, {} failed ({} total)",
        report.added,
        report.skipped,
        report.failed,
        movies.len()
    );
    Ok(report)
}
