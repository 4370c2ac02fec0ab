//! TRMNL private-plugin webhook: push the upcoming schedule, read the screen back.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{Catalog, Movie};
use crate::settings::TrmnlSettings;

/// The free tier caps merge variables at 2 KB; four movies fit comfortably.
pub const DEFAULT_MAX_MOVIES: usize = 4;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DisplayView {
    pub season: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub movies: Vec<DisplayMovie>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DisplayMovie {
    pub title: String,
    pub date: NaiveDate,
    pub time: String,
    pub channel: String,
    pub premiere: bool,
    pub image: String,
}

#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    merge_variables: &'a DisplayView,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CurrentScreen {
    pub status: Option<i64>,
    pub image_url: Option<String>,
    pub filename: Option<String>,
    pub refresh_rate: Option<i64>,
}

impl From<&Movie> for DisplayMovie {
    fn from(m: &Movie) -> Self {
        Self {
            title: m.title.clone(),
            date: m.date,
            time: m.time.clone(),
            channel: m.channel.clone(),
            premiere: m.premiere,
            image: m.image.clone(),
        }
    }
}

impl DisplayView {
    pub fn from_catalog(catalog: &Catalog, today: NaiveDate, max: usize) -> Self {
        Self {
            season: catalog.season.clone(),
            start_date: catalog.start_date,
            end_date: catalog.end_date,
            movies: catalog.upcoming(today, max).map(DisplayMovie::from).collect(),
        }
    }
}

/// The JSON document the webhook receives.
pub fn webhook_payload(view: &DisplayView) -> Result<serde_json::Value> {
    serde_json::to_value(WebhookBody {
        merge_variables: view,
    })
    .context("Failed to serialize webhook payload")
}

#[derive(Debug, Clone)]
pub struct TrmnlClient {
    client: Client,
    base_url: String,
}

impl TrmnlClient {
    pub fn new(settings: TrmnlSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout)
            .build()
            .context("Failed to build TRMNL HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.base_url,
        })
    }

    /// Sends the view to the plugin webhook. Failures are logged, never raised.
    pub async fn publish(&self, plugin_uuid: &str, view: &DisplayView) -> bool {
        let url = format!("{}/api/custom_plugins/{plugin_uuid}", self.base_url);
        let body = WebhookBody {
            merge_variables: view,
        };
        match serde_json::to_string(&body) {
            Ok(s) => info!("Sending {} movies ({} bytes) to TRMNL", view.movies.len(), s.len()),
            Err(e) => warn!("Could not measure payload: {}", e),
        }

        let res = match self.client.post(&url).json(&body).send().await {
            Ok(res) => res,
            Err(e) => {
                warn!("TRMNL webhook request failed: {}", e);
                return false;
            }
        };
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if status.is_success() {
            info!("TRMNL accepted the update: {}", text);
            true
        } else {
            warn!("TRMNL rejected the update ({}): {}", status, text);
            false
        }
    }

    /// What the device is currently showing, for verification after a push.
    pub async fn current_screen(&self, access_token: &str) -> Result<CurrentScreen> {
        let res = self
            .client
            .get(format!("{}/api/current_screen", self.base_url))
            .header("access-token", access_token)
            .send()
            .await
            .context("TRMNL current_screen request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading TRMNL body failed")?;
        if !status.is_success() {
            return Err(anyhow!("TRMNL current_screen returned {status}: {text}"));
        }
        serde_json::from_str(&text).context("TRMNL current_screen JSON parse failed")
    }
}
