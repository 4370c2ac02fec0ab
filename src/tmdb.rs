use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::settings::TmdbSettings;

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_base: String,
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Poster URL of the first search hit, if that hit has a poster.
    async fn search_poster(&self, title: &str, year: i32) -> Result<Option<String>>;
    async fn movie_poster(&self, id: u64) -> Result<Option<String>>;
    async fn find_imdb(&self, imdb_id: &str) -> Result<Option<u64>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieDetail {
    poster_path: Option<String>,
}

impl TmdbClient {
    pub fn new(settings: TmdbSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: settings.api_key,
            base_url: settings.base_url,
            image_base: settings.image_base,
        })
    }

    fn poster_url(&self, path: &str) -> String {
        format!("{}{path}", self.image_base)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("TMDB returned {status}: {text}"));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn search_poster(&self, title: &str, year: i32) -> Result<Option<String>> {
        let url = format!(
            "{}/search/movie?api_key={}&query={}&year={year}&include_adult=false",
            self.base_url,
            self.api_key,
            urlencoding::encode(title)
        );
        let data: SearchResponse = self.get_json(&url).await?;
        Ok(data
            .results
            .first()
            .and_then(|r| r.poster_path.as_deref())
            .map(|p| self.poster_url(p)))
    }

    async fn movie_poster(&self, id: u64) -> Result<Option<String>> {
        let url = format!("{}/movie/{id}?api_key={}", self.base_url, self.api_key);
        let detail: MovieDetail = self.get_json(&url).await?;
        Ok(detail.poster_path.as_deref().map(|p| self.poster_url(p)))
    }

    async fn find_imdb(&self, imdb_id: &str) -> Result<Option<u64>> {
        #[derive(Deserialize)]
        struct FindResponse {
            movie_results: Option<Vec<FindResult>>,
        }
        #[derive(Deserialize)]
        struct FindResult {
            id: u64,
        }

        let Some(imdb) = parse_imdb_id(imdb_id) else {
            return Err(anyhow!("'{}' is not an IMDb id", imdb_id));
        };
        let url = format!(
            "{}/find/{imdb}?external_source=imdb_id&api_key={}",
            self.base_url, self.api_key
        );
        let data: FindResponse = self.get_json(&url).await?;
        Ok(data
            .movie_results
            .and_then(|v| v.into_iter().next())
            .map(|r| r.id))
    }
}

pub fn parse_tmdb_id(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse().ok();
    }
    None
}

pub fn parse_imdb_id(input: &str) -> Option<String> {
    let lower = input.trim().to_lowercase();
    if lower.starts_with("tt") && lower.len() > 2 && lower[2..].chars().all(|c| c.is_ascii_digit())
    {
        return Some(lower);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids() {
        assert_eq!(parse_tmdb_id("1535223"), Some(1535223));
        assert_eq!(parse_tmdb_id(" 42 "), Some(42));
        assert_eq!(parse_tmdb_id("tt36364046"), None);
        assert_eq!(parse_tmdb_id(""), None);
        assert_eq!(parse_imdb_id("TT36364046").as_deref(), Some("tt36364046"));
        assert_eq!(parse_imdb_id("tt"), None);
        assert_eq!(parse_imdb_id("nm123"), None);
    }

    #[test]
    fn search_result_poster_is_optional() {
        let data: SearchResponse =
            serde_json::from_str(r#"{"results":[{"id":1,"poster_path":null}]}"#).unwrap();
        assert!(data.results[0].poster_path.is_none());
        let empty: SearchResponse = serde_json::from_str(r#"{"page":1}"#).unwrap();
        assert!(empty.results.is_empty());
    }
}
