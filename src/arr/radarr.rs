//! Radarr (movies) endpoints

use serde_json::{json, Map, Value};
use tracing::info;

use super::client::ArrClient;
use super::error::{ArrError, ArrResult};
use super::models::{Movie, Page};
use super::Service;
use crate::config::ServiceConfig;

/// Options for adding a movie by TMDb id
#[derive(Debug, Clone, Default)]
pub struct AddMovie {
    pub tmdb_id: i64,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub quality_profile_id: i64,
    pub root_folder_path: String,
    pub monitored: bool,
    pub minimum_availability: Option<String>,
    pub search: bool,
}

/// Fields that may be changed on an existing movie
#[derive(Debug, Clone, Default)]
pub struct MovieUpdate {
    pub monitored: Option<bool>,
    pub quality_profile_id: Option<i64>,
    pub minimum_availability: Option<String>,
    pub tags: Option<Vec<i64>>,
}

impl MovieUpdate {
    pub fn is_empty(&self) -> bool {
        self.monitored.is_none()
            && self.quality_profile_id.is_none()
            && self.minimum_availability.is_none()
            && self.tags.is_none()
    }

    fn apply(&self, movie: &mut Map<String, Value>) {
        if let Some(monitored) = self.monitored {
            movie.insert("monitored".into(), json!(monitored));
        }
        if let Some(id) = self.quality_profile_id {
            movie.insert("qualityProfileId".into(), json!(id));
        }
        if let Some(availability) = &self.minimum_availability {
            movie.insert("minimumAvailability".into(), json!(availability));
        }
        if let Some(tags) = &self.tags {
            movie.insert("tags".into(), json!(tags));
        }
    }
}

#[derive(Debug, Clone)]
pub struct RadarrApi {
    client: ArrClient,
}

impl RadarrApi {
    pub fn new(client: ArrClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ServiceConfig) -> ArrResult<Self> {
        Ok(Self::new(ArrClient::from_config(Service::Radarr, config)?))
    }

    /// Shared endpoints (queue, profiles, commands, ...)
    pub fn client(&self) -> &ArrClient {
        &self.client
    }

    pub async fn movies(&self) -> ArrResult<Vec<Movie>> {
        self.client.get("movie", Vec::new()).await
    }

    pub async fn movie(&self, id: i64) -> ArrResult<Movie> {
        self.client.get(&format!("movie/{}", id), Vec::new()).await
    }

    /// Search TMDb through Radarr
    pub async fn lookup(&self, term: &str) -> ArrResult<Vec<Movie>> {
        self.client
            .get("movie/lookup", vec![("term", term.to_string())])
            .await
    }

    /// Full lookup resource for one TMDb id, as Radarr expects it back on add
    pub async fn lookup_tmdb(&self, tmdb_id: i64) -> ArrResult<Value> {
        self.client
            .get("movie/lookup/tmdb", vec![("tmdbId", tmdb_id.to_string())])
            .await
    }

    pub async fn add_movie(&self, request: &AddMovie) -> ArrResult<Movie> {
        let mut movie = match self.lookup_tmdb(request.tmdb_id).await {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(ArrError::NotFound { .. }) => {
                let title = request.title.clone().ok_or_else(|| {
                    ArrError::Invalid(format!(
                        "TMDb id {} not found and no title given",
                        request.tmdb_id
                    ))
                })?;
                let mut map = Map::new();
                map.insert("title".into(), json!(title));
                map.insert("year".into(), json!(request.year.unwrap_or_default()));
                map.insert("tmdbId".into(), json!(request.tmdb_id));
                map
            }
            Err(e) => return Err(e),
        };

        movie.insert("qualityProfileId".into(), json!(request.quality_profile_id));
        movie.insert("rootFolderPath".into(), json!(request.root_folder_path));
        movie.insert("monitored".into(), json!(request.monitored));
        movie.insert(
            "minimumAvailability".into(),
            json!(request
                .minimum_availability
                .as_deref()
                .unwrap_or("released")),
        );
        movie.insert(
            "addOptions".into(),
            json!({ "searchForMovie": request.search }),
        );

        let added: Movie = self.client.post("movie", &movie).await?;
        info!("Added movie {} ({})", added.title, added.id);
        Ok(added)
    }

    pub async fn update_movie(&self, id: i64, update: &MovieUpdate) -> ArrResult<Movie> {
        let path = format!("movie/{}", id);
        let mut movie = match self.client.get::<Value>(&path, Vec::new()).await? {
            Value::Object(map) => map,
            other => {
                return Err(ArrError::Invalid(format!(
                    "Unexpected movie resource: {}",
                    other
                )))
            }
        };
        update.apply(&mut movie);
        self.client.put(&path, &movie).await
    }

    pub async fn delete_movie(
        &self,
        id: i64,
        delete_files: bool,
        add_import_exclusion: bool,
    ) -> ArrResult<()> {
        self.client
            .delete(
                &format!("movie/{}", id),
                vec![
                    ("deleteFiles", delete_files.to_string()),
                    ("addImportExclusion", add_import_exclusion.to_string()),
                ],
            )
            .await
    }

    /// Movies with a release date between `start` and `end` (YYYY-MM-DD)
    pub async fn calendar(&self, start: &str, end: &str) -> ArrResult<Vec<Movie>> {
        self.client
            .get(
                "calendar",
                vec![("start", start.to_string()), ("end", end.to_string())],
            )
            .await
    }

    /// Monitored movies without a file
    pub async fn wanted_missing(&self, page_size: u32) -> ArrResult<Page<Movie>> {
        self.client
            .get(
                "wanted/missing",
                vec![
                    ("page", "1".to_string()),
                    ("pageSize", page_size.to_string()),
                    ("monitored", "true".to_string()),
                ],
            )
            .await
    }
}
