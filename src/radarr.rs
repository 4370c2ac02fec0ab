//! Radarr v3 REST client (movie library backend).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::settings::RadarrSettings;

#[derive(Debug, Clone)]
pub struct RadarrClient {
    client: Client,
    base_url: String,
}

#[async_trait]
pub trait RadarrApi: Send + Sync {
    fn base_url(&self) -> &str;
    async fn root_folders(&self) -> Result<Vec<RootFolder>>;
    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>>;
    async fn tags(&self) -> Result<Vec<Tag>>;
    async fn create_tag(&self, label: &str) -> Result<Tag>;
    async fn movies(&self) -> Result<Vec<RadarrMovie>>;
    async fn lookup_tmdb(&self, tmdb_id: u64) -> Result<Option<RadarrMovie>>;
    async fn add_movie(&self, movie: &NewMovie) -> Result<()>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct RootFolder {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityProfile {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrMovie {
    pub title: String,
    pub year: Option<i32>,
    pub tmdb_id: Option<u64>,
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub images: Vec<MediaCover>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCover {
    pub cover_type: String,
    pub url: Option<String>,
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub title: String,
    pub year: Option<i32>,
    pub tmdb_id: u64,
    pub imdb_id: Option<String>,
    pub quality_profile_id: i64,
    pub root_folder_path: String,
    pub monitored: bool,
    pub add_options: AddOptions,
    pub tags: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOptions {
    pub search_for_movie: bool,
}

impl RadarrMovie {
    /// Poster image URL: the remote (TMDB) URL when Radarr has one, else its
    /// own media cover path made absolute against `base_url`.
    pub fn poster_url(&self, base_url: &str) -> Option<String> {
        let poster = self
            .images
            .iter()
            .find(|img| img.cover_type.eq_ignore_ascii_case("poster"))?;
        if let Some(remote) = poster.remote_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(remote.to_string());
        }
        let local = poster.url.as_deref().filter(|u| !u.is_empty())?;
        if local.starts_with("http") {
            Some(local.to_string())
        } else {
            Some(format!("{}{local}", base_url.trim_end_matches('/')))
        }
    }
}

impl RadarrClient {
    pub fn new(settings: RadarrSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key =
            HeaderValue::from_str(&settings.api_key).context("RADARR_API_KEY is not a valid header")?;
        key.set_sensitive(true);
        headers.insert("X-Api-Key", key);
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout)
            .build()
            .context("Failed to build Radarr HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v3/{path}", self.base_url)
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(&self, req: RequestBuilder) -> Result<T> {
        let res = req.send().await.context("Radarr request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading Radarr body failed")?;
        if !status.is_success() {
            return Err(anyhow!("Radarr returned {status}: {text}"));
        }
        serde_json::from_str(&text).context("Radarr JSON parse failed")
    }
}

#[async_trait]
impl RadarrApi for RadarrClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn root_folders(&self) -> Result<Vec<RootFolder>> {
        self.send_json(self.client.get(self.url("rootfolder"))).await
    }

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        self.send_json(self.client.get(self.url("qualityprofile")))
            .await
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        self.send_json(self.client.get(self.url("tag"))).await
    }

    async fn create_tag(&self, label: &str) -> Result<Tag> {
        self.send_json(
            self.client
                .post(self.url("tag"))
                .json(&json!({ "label": label })),
        )
        .await
    }

    async fn movies(&self) -> Result<Vec<RadarrMovie>> {
        self.send_json(self.client.get(self.url("movie"))).await
    }

    async fn lookup_tmdb(&self, tmdb_id: u64) -> Result<Option<RadarrMovie>> {
        let res = self
            .client
            .get(self.url(&format!("movie/lookup/tmdb?tmdbId={tmdb_id}")))
            .send()
            .await
            .context("Radarr lookup request failed")?;
        if !res.status().is_success() {
            return Ok(None);
        }
        let movie = res.json().await.context("Radarr lookup JSON parse failed")?;
        Ok(Some(movie))
    }

    async fn add_movie(&self, movie: &NewMovie) -> Result<()> {
        let res = self
            .client
            .post(self.url("movie"))
            .json(movie)
            .send()
            .await
            .context("Radarr add request failed")?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!("Radarr rejected '{}' ({status}): {text}", movie.title));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_with(images: serde_json::Value) -> RadarrMovie {
        serde_json::from_value(json!({
            "title": "Three Wisest Men",
            "year": 2025,
            "tmdbId": 1537084,
            "imdbId": "tt38353919",
            "images": images
        }))
        .unwrap()
    }

    #[test]
    fn prefers_remote_poster_url() {
        let m = movie_with(json!([
            { "coverType": "fanart", "remoteUrl": "https://image.tmdb.org/fanart.jpg" },
            { "coverType": "poster", "url": "/MediaCover/7/poster.jpg", "remoteUrl": "https://image.tmdb.org/poster.jpg" }
        ]));
        assert_eq!(
            m.poster_url("http://radarr:7878").as_deref(),
            Some("https://image.tmdb.org/poster.jpg")
        );
    }

    #[test]
    fn falls_back_to_local_cover_path() {
        let m = movie_with(json!([{ "coverType": "poster", "url": "/MediaCover/7/poster.jpg" }]));
        assert_eq!(
            m.poster_url("http://radarr:7878/").as_deref(),
            Some("http://radarr:7878/MediaCover/7/poster.jpg")
        );
    }

    #[test]
    fn no_poster_cover_means_none() {
        let m = movie_with(json!([{ "coverType": "banner", "url": "/b.jpg" }]));
        assert_eq!(m.poster_url("http://radarr:7878"), None);
        assert_eq!(movie_with(json!([])).poster_url("http://radarr:7878"), None);
    }

    #[test]
    fn new_movie_serializes_camel_case() {
        let payload = NewMovie {
            title: "A Newport Christmas".to_string(),
            year: Some(2025),
            tmdb_id: 1537560,
            imdb_id: Some("tt36491858".to_string()),
            quality_profile_id: 4,
            root_folder_path: "/movies".to_string(),
            monitored: true,
            add_options: AddOptions {
                search_for_movie: true,
            },
            tags: vec![9],
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["tmdbId"], 1537560);
        assert_eq!(v["qualityProfileId"], 4);
        assert_eq!(v["rootFolderPath"], "/movies");
        assert_eq!(v["addOptions"]["searchForMovie"], true);
        assert_eq!(v["tags"], json!([9]));
    }
}
