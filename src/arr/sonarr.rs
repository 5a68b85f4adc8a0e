//! Sonarr (series) endpoints

use serde_json::{json, Map, Value};
use tracing::info;

use super::client::{ArrClient, Query};
use super::error::{ArrError, ArrResult};
use super::models::{Episode, Page, Series};
use super::Service;
use crate::config::ServiceConfig;

/// Options for adding a series by TVDB id
#[derive(Debug, Clone, Default)]
pub struct AddSeries {
    pub tvdb_id: i64,
    pub quality_profile_id: i64,
    pub root_folder_path: String,
    pub monitored: bool,
    pub season_folder: bool,
    pub search: bool,
}

/// Fields that may be changed on an existing series
#[derive(Debug, Clone, Default)]
pub struct SeriesUpdate {
    pub monitored: Option<bool>,
    pub quality_profile_id: Option<i64>,
    pub season_folder: Option<bool>,
    pub tags: Option<Vec<i64>>,
}

impl SeriesUpdate {
    pub fn is_empty(&self) -> bool {
        self.monitored.is_none()
            && self.quality_profile_id.is_none()
            && self.season_folder.is_none()
            && self.tags.is_none()
    }

    fn apply(&self, series: &mut Map<String, Value>) {
        if let Some(monitored) = self.monitored {
            series.insert("monitored".into(), json!(monitored));
        }
        if let Some(id) = self.quality_profile_id {
            series.insert("qualityProfileId".into(), json!(id));
        }
        if let Some(season_folder) = self.season_folder {
            series.insert("seasonFolder".into(), json!(season_folder));
        }
        if let Some(tags) = &self.tags {
            series.insert("tags".into(), json!(tags));
        }
    }
}

#[derive(Debug, Clone)]
pub struct SonarrApi {
    client: ArrClient,
}

impl SonarrApi {
    pub fn new(client: ArrClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ServiceConfig) -> ArrResult<Self> {
        Ok(Self::new(ArrClient::from_config(Service::Sonarr, config)?))
    }

    pub fn client(&self) -> &ArrClient {
        &self.client
    }

    pub async fn series(&self) -> ArrResult<Vec<Series>> {
        self.client.get("series", Vec::new()).await
    }

    pub async fn series_by_id(&self, id: i64) -> ArrResult<Series> {
        self.client.get(&format!("series/{}", id), Vec::new()).await
    }

    /// Search TVDB through Sonarr; `tvdb:<id>` terms match one series
    pub async fn lookup(&self, term: &str) -> ArrResult<Vec<Series>> {
        self.client
            .get("series/lookup", vec![("term", term.to_string())])
            .await
    }

    pub async fn add_series(&self, request: &AddSeries) -> ArrResult<Series> {
        let found: Vec<Value> = self
            .client
            .get(
                "series/lookup",
                vec![("term", format!("tvdb:{}", request.tvdb_id))],
            )
            .await?;

        let mut series = match found.into_iter().next() {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(ArrError::Invalid(format!(
                    "No series found for TVDB id {}",
                    request.tvdb_id
                )))
            }
        };

        series.insert("qualityProfileId".into(), json!(request.quality_profile_id));
        series.insert("rootFolderPath".into(), json!(request.root_folder_path));
        series.insert("monitored".into(), json!(request.monitored));
        series.insert("seasonFolder".into(), json!(request.season_folder));
        series.insert(
            "addOptions".into(),
            json!({
                "monitor": if request.monitored { "all" } else { "none" },
                "searchForMissingEpisodes": request.search,
            }),
        );

        let added: Series = self.client.post("series", &series).await?;
        info!("Added series {} ({})", added.title, added.id);
        Ok(added)
    }

    pub async fn update_series(&self, id: i64, update: &SeriesUpdate) -> ArrResult<Series> {
        let path = format!("series/{}", id);
        let mut series = match self.client.get::<Value>(&path, Vec::new()).await? {
            Value::Object(map) => map,
            other => {
                return Err(ArrError::Invalid(format!(
                    "Unexpected series resource: {}",
                    other
                )))
            }
        };
        update.apply(&mut series);
        self.client.put(&path, &series).await
    }

    pub async fn delete_series(&self, id: i64, delete_files: bool) -> ArrResult<()> {
        self.client
            .delete(
                &format!("series/{}", id),
                vec![("deleteFiles", delete_files.to_string())],
            )
            .await
    }

    pub async fn episodes(&self, series_id: i64, season: Option<i32>) -> ArrResult<Vec<Episode>> {
        let mut query: Query = vec![("seriesId", series_id.to_string())];
        if let Some(season) = season {
            query.push(("seasonNumber", season.to_string()));
        }
        self.client.get("episode", query).await
    }

    pub async fn monitor_episodes(&self, episode_ids: &[i64], monitored: bool) -> ArrResult<()> {
        let _: Value = self
            .client
            .put(
                "episode/monitor",
                &json!({ "episodeIds": episode_ids, "monitored": monitored }),
            )
            .await?;
        Ok(())
    }

    /// Episodes airing between `start` and `end` (YYYY-MM-DD)
    pub async fn calendar(&self, start: &str, end: &str) -> ArrResult<Vec<Episode>> {
        self.client
            .get(
                "calendar",
                vec![
                    ("start", start.to_string()),
                    ("end", end.to_string()),
                    ("includeSeries", "true".to_string()),
                ],
            )
            .await
    }

    /// Monitored, aired episodes without a file
    pub async fn wanted_missing(&self, page_size: u32) -> ArrResult<Page<Episode>> {
        self.client
            .get(
                "wanted/missing",
                vec![
                    ("page", "1".to_string()),
                    ("pageSize", page_size.to_string()),
                    ("includeSeries", "true".to_string()),
                    ("monitored", "true".to_string()),
                ],
            )
            .await
    }
}
