//! Command-line surface: one subcommand per maintenance task.

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::catalog::{Catalog, DEFAULT_CATALOG_PATH};
use crate::fetch::Fetcher;
use crate::normalize::{one_bit_name, Normalizer};
use crate::pipeline::{self, PosterPipeline, DEFAULT_OUTPUT_DIR};
use crate::radarr::RadarrClient;
use crate::resolver::{
    IdResolver, ManualResolver, OrchestratorResolver, PosterItem, PosterResolver, SearchResolver,
};
use crate::schedule::{self, SeasonHeader};
use crate::season::{Season, DEFAULT_SEASON_PATH};
use crate::settings::{RadarrSettings, TmdbSettings, TrmnlSettings};
use crate::sync;
use crate::tmdb::{TmdbApi, TmdbClient};
use crate::trmnl::{self, DisplayView, TrmnlClient, DEFAULT_MAX_MOVIES};

/// Season schedule and e-ink poster maintenance
#[derive(Debug, Parser)]
#[command(name = "reelboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog document to read and rewrite
    #[arg(long, global = true, default_value = DEFAULT_CATALOG_PATH)]
    pub catalog: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch and convert missing posters
    Posters {
        #[arg(long, value_enum, default_value_t = Source::Search)]
        source: Source,
        #[arg(long, default_value = DEFAULT_SEASON_PATH)]
        season: PathBuf,
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        /// Search year (defaults to the season file's year)
        #[arg(long)]
        year: Option<i32>,
        /// Rebuild posters that already exist
        #[arg(long)]
        force: bool,
        #[arg(long)]
        no_dither: bool,
    },

    /// Convert local images to 1-bit PNG
    Convert {
        input: PathBuf,
        output: Option<PathBuf>,
        /// Convert every image in the input directory
        #[arg(long)]
        batch: bool,
        #[arg(long)]
        no_dither: bool,
    },

    /// Drop catalog entries that aired before the cutoff
    Filter {
        /// Defaults to today
        #[arg(long)]
        cutoff: Option<NaiveDate>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Push upcoming movies to the TRMNL plugin webhook
    Publish {
        /// Plugin UUID from the webhook URL
        #[arg(long, env = "TRMNL_PLUGIN_UUID")]
        uuid: String,
        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
        /// Device API key; reads back the current screen after sending
        #[arg(long)]
        check_screen: Option<String>,
        #[arg(long, default_value_t = DEFAULT_MAX_MOVIES)]
        max: usize,
    },

    /// Add the season's movies to Radarr
    RadarrAdd {
        #[arg(long, default_value = DEFAULT_SEASON_PATH)]
        season: PathBuf,
        /// Tag label (defaults to the season file's radarr_tag)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Build the catalog from a raw listing
    Build {
        /// JSON array of listing rows
        #[arg(long)]
        listing: PathBuf,
        #[arg(long)]
        season_label: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Year the listing dates fall in (defaults to the start year)
        #[arg(long)]
        year: Option<i32>,
        /// Overwrite an existing catalog
        #[arg(long)]
        force: bool,
    },

    /// Report slug mismatches and missing posters
    Audit {
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// TMDB search by catalog title
    Search,
    /// TMDB lookup by the season file's ids
    TmdbId,
    /// Posters Radarr already has for the season's movies
    Radarr,
    /// URLs listed under [manual_posters]
    Manual,
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Posters {
            source,
            season,
            output,
            year,
            force,
            no_dither,
        } => {
            let normalizer = normalizer(no_dither);
            posters(&cli.catalog, source, &season, &output, year, force, normalizer).await
        }
        Commands::Convert {
            input,
            output,
            batch,
            no_dither,
        } => convert(&input, output.as_deref(), batch, normalizer(no_dither)),
        Commands::Filter { cutoff, dry_run } => filter(&cli.catalog, cutoff, dry_run),
        Commands::Publish {
            uuid,
            dry_run,
            check_screen,
            max,
        } => publish(&cli.catalog, &uuid, dry_run, check_screen.as_deref(), max).await,
        Commands::RadarrAdd { season, tag } => radarr_add(&season, tag).await,
        Commands::Build {
            listing,
            season_label,
            start,
            end,
            year,
            force,
        } => {
            let header = SeasonHeader {
                season: season_label,
                start_date: start,
                end_date: end,
                year: year.unwrap_or_else(|| start.year()),
            };
            build(&cli.catalog, &listing, &header, force)
        }
        Commands::Audit { output } => audit(&cli.catalog, &output),
    }
}

fn normalizer(no_dither: bool) -> Normalizer {
    if no_dither {
        Normalizer::default().without_dither()
    } else {
        Normalizer::default()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn posters(
    catalog_path: &Path,
    source: Source,
    season_path: &Path,
    output: &Path,
    year: Option<i32>,
    force: bool,
    normalizer: Normalizer,
) -> Result<ExitCode> {
    let resolver: Box<dyn PosterResolver>;
    let items: Vec<PosterItem>;
    match source {
        Source::Search => {
            let catalog = Catalog::load(catalog_path)?;
            let season = if season_path.exists() {
                Some(Season::load(season_path)?)
            } else {
                warn!("{} not found; searching without alternate titles", season_path.display());
                None
            };
            let year = year
                .or(season.as_ref().map(|s| s.year))
                .unwrap_or_else(|| catalog.start_date.year());
            let alternates = season.map(|s| s.alternate_titles).unwrap_or_default();
            let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(TmdbSettings::from_env()?)?);
            items = if force {
                catalog_items(&catalog)
            } else {
                pipeline::missing_from_catalog(&catalog, output)
            };
            resolver = Box::new(SearchResolver::new(tmdb, year, alternates));
        }
        Source::TmdbId => {
            let season = Season::load(season_path)?;
            let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(TmdbSettings::from_env()?)?);
            items = pipeline::items_from_season(&season);
            resolver = Box::new(IdResolver::new(tmdb));
        }
        Source::Radarr => {
            let season = Season::load(season_path)?;
            let radarr = RadarrClient::new(RadarrSettings::from_env()?)?;
            let (orchestrator, found) =
                OrchestratorResolver::load(&radarr, &season.tmdb_ids()).await?;
            items = found;
            resolver = Box::new(orchestrator);
        }
        Source::Manual => {
            let season = Season::load(season_path)?;
            let manual = ManualResolver::new(season.manual_urls());
            items = manual.items();
            resolver = Box::new(manual);
        }
    }

    if items.is_empty() {
        info!("Nothing to do: no posters to fetch");
        return Ok(ExitCode::SUCCESS);
    }

    let summary = PosterPipeline::new(resolver.as_ref(), Fetcher::new()?, output)
        .with_normalizer(normalizer)
        .force(force)
        .run(&items)
        .await?;
    for title in &summary.failed_titles {
        warn!("Still missing: {}", title);
    }
    Ok(ExitCode::SUCCESS)
}

fn catalog_items(catalog: &Catalog) -> Vec<PosterItem> {
    catalog
        .movies
        .iter()
        .map(|m| PosterItem {
            title: m.title.clone(),
            filename: m.poster_file(),
            tmdb_id: m.tmdb_id,
            imdb_id: m.imdb_id.clone(),
        })
        .collect()
}

fn convert(
    input: &Path,
    output: Option<&Path>,
    batch: bool,
    normalizer: Normalizer,
) -> Result<ExitCode> {
    if batch || input.is_dir() {
        let report = normalizer.convert_dir(input, output)?;
        info!(
            "Batch conversion complete: {}/{} images converted",
            report.converted, report.total
        );
        return Ok(if report.converted == report.total {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_file_name(one_bit_name(input)));
    normalizer.convert_file(input, &output)?;
    info!("Converted {} → {}", input.display(), output.display());
    Ok(ExitCode::SUCCESS)
}

fn filter(catalog_path: &Path, cutoff: Option<NaiveDate>, dry_run: bool) -> Result<ExitCode> {
    let mut catalog = Catalog::load(catalog_path)?;
    let cutoff = cutoff.unwrap_or_else(today);
    info!("Keeping movies airing on or after {}", cutoff);
    let report = catalog.retain_from(cutoff);
    info!(
        "Filtered {} movies down to {} upcoming movies ({} removed)",
        report.before,
        report.after,
        report.removed()
    );
    if dry_run {
        info!("Dry run: {} left unchanged", catalog_path.display());
    } else {
        catalog.save(catalog_path)?;
        info!("Updated {}", catalog_path.display());
    }
    Ok(ExitCode::SUCCESS)
}

async fn publish(
    catalog_path: &Path,
    uuid: &str,
    dry_run: bool,
    check_screen: Option<&str>,
    max: usize,
) -> Result<ExitCode> {
    let catalog = match Catalog::load(catalog_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Error loading movies data: {:#}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let view = DisplayView::from_catalog(&catalog, today(), max);
    info!("Loaded {} upcoming movies", view.movies.len());

    if dry_run {
        let payload = trmnl::webhook_payload(&view)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("Failed to render payload")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    let client = TrmnlClient::new(TrmnlSettings::from_env())?;
    if !client.publish(uuid, &view).await {
        return Ok(ExitCode::FAILURE);
    }

    if let Some(key) = check_screen {
        match client.current_screen(key).await {
            Ok(screen) => {
                info!("Current screen status: {:?}", screen.status);
                info!("Current screen image: {:?}", screen.image_url);
                info!("Current screen file: {:?}", screen.filename);
                info!("Current screen refresh rate: {:?}", screen.refresh_rate);
            }
            Err(e) => warn!("Failed to read current screen: {:#}", e),
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn radarr_add(season_path: &Path, tag: Option<String>) -> Result<ExitCode> {
    let season = Season::load(season_path)?;
    let tag = tag
        .or_else(|| season.radarr_tag.clone())
        .context("No Radarr tag given and the season file sets no radarr_tag")?;
    let radarr = RadarrClient::new(RadarrSettings::from_env()?)?;
    let report = sync::add_season(&radarr, &season.movies, &tag).await?;
    Ok(if report.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build(
    catalog_path: &Path,
    listing: &Path,
    header: &SeasonHeader,
    force: bool,
) -> Result<ExitCode> {
    if catalog_path.exists() && !force {
        warn!(
            "{} already exists; pass --force to rebuild it",
            catalog_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }
    let entries = schedule::load_listing(listing)?;
    let catalog = schedule::build_catalog(header, &entries);
    catalog.save(catalog_path)?;
    info!(
        "Wrote {} of {} listing rows to {}",
        catalog.movies.len(),
        entries.len(),
        catalog_path.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn audit(catalog_path: &Path, output: &Path) -> Result<ExitCode> {
    let catalog = Catalog::load(catalog_path)?;

    let mismatches = catalog.slug_mismatches();
    for (movie, expected) in &mismatches {
        warn!(
            "'{}' points at {} but its slug is {}",
            movie.title,
            movie.image_filename(),
            expected
        );
    }
    let collisions = catalog.slug_collisions();
    for (filename, titles) in &collisions {
        warn!("{} is shared by: {}", filename, titles.join(" | "));
    }
    let missing = pipeline::missing_from_catalog(&catalog, output);
    for item in &missing {
        warn!("Missing poster for '{}': {}", item.title, item.filename);
    }

    info!(
        "{} movies: {} slug mismatches, {} collisions, {} missing posters",
        catalog.movies.len(),
        mismatches.len(),
        collisions.len(),
        missing.len()
    );
    Ok(ExitCode::SUCCESS)
}
