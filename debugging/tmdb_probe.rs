//! Show what each TMDB poster query returns for one title or id.
//! Usage:
//!   cargo run --bin tmdb_probe -- search "<title>" <year>
//!   cargo run --bin tmdb_probe -- id <tmdb_id|imdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use reelboard::settings::TmdbSettings;
use reelboard::tmdb::{parse_imdb_id, parse_tmdb_id, TmdbApi, TmdbClient};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let args: Vec<String> = env::args().skip(1).collect();
    let tmdb = TmdbClient::new(TmdbSettings::from_env()?)?;

    match args.first().map(String::as_str) {
        Some("search") => {
            let title = args.get(1).context("missing title")?;
            let year: i32 = args
                .get(2)
                .context("missing year")?
                .parse()
                .context("year must be a number")?;
            for y in [year, year - 1] {
                let poster = tmdb.search_poster(title, y).await?;
                println!("{title} ({y}): {}", poster.as_deref().unwrap_or("-"));
            }
        }
        Some("id") => {
            let raw = args.get(1).context("missing id")?;
            let id = match (parse_tmdb_id(raw), parse_imdb_id(raw)) {
                (Some(id), _) => id,
                (None, Some(imdb)) => tmdb
                    .find_imdb(&imdb)
                    .await?
                    .with_context(|| format!("no TMDB movie for {imdb}"))?,
                (None, None) => bail!("'{raw}' is neither a TMDB nor an IMDb id"),
            };
            let poster = tmdb.movie_poster(id).await?;
            println!("{id}: {}", poster.as_deref().unwrap_or("-"));
        }
        _ => bail!("usage: tmdb_probe search <title> <year> | id <tmdb_id|imdb_id>"),
    }
    Ok(())
}
