//! Endpoints with the same shape on Radarr and Sonarr

use serde_json::{json, Map, Value};
use tracing::info;

use super::client::ArrClient;
use super::error::{ArrError, ArrResult};
use super::models::{
    Command, HistoryRecord, ImportCandidate, Page, QualityProfile, QueueRecord, RootFolder,
    SystemStatus,
};
use super::Service;

/// Command that re-checks download clients for finished downloads
pub const REFRESH_MONITORED_COMMAND: &str = "RefreshMonitoredDownloads";

/// How imported files are moved into the library
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ImportMode {
    #[default]
    Move,
    Copy,
}

impl ImportMode {
    pub fn parse(s: &str) -> ArrResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "move" => Ok(Self::Move),
            "copy" => Ok(Self::Copy),
            other => Err(ArrError::Invalid(format!(
                "Invalid import mode '{}' (expected 'move' or 'copy')",
                other
            ))),
        }
    }

    fn as_api_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
        }
    }
}

/// Result of a manual import request
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualImportOutcome {
    pub imported: Vec<String>,
    pub rejected: Vec<RejectedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RejectedFile {
    pub path: String,
    pub reasons: Vec<String>,
}

impl ArrClient {
    pub async fn system_status(&self) -> ArrResult<SystemStatus> {
        self.get("system/status", Vec::new()).await
    }

    pub async fn quality_profiles(&self) -> ArrResult<Vec<QualityProfile>> {
        self.get("qualityprofile", Vec::new()).await
    }

    pub async fn root_folders(&self) -> ArrResult<Vec<RootFolder>> {
        self.get("rootfolder", Vec::new()).await
    }

    pub async fn queue(&self, page_size: u32) -> ArrResult<Page<QueueRecord>> {
        self.get(
            "queue",
            vec![
                ("page", "1".to_string()),
                ("pageSize", page_size.to_string()),
            ],
        )
        .await
    }

    pub async fn remove_from_queue(
        &self,
        id: i64,
        remove_from_client: bool,
        blocklist: bool,
    ) -> ArrResult<()> {
        self.delete(
            &format!("queue/{}", id),
            vec![
                ("removeFromClient", remove_from_client.to_string()),
                ("blocklist", blocklist.to_string()),
            ],
        )
        .await
    }

    /// Most recent history events first
    pub async fn history(&self, page_size: u32) -> ArrResult<Page<HistoryRecord>> {
        self.get(
            "history",
            vec![
                ("page", "1".to_string()),
                ("pageSize", page_size.to_string()),
                ("sortKey", "date".to_string()),
                ("sortDirection", "descending".to_string()),
            ],
        )
        .await
    }

    /// Queue a named command; `extra` is merged into the request body
    pub async fn command(&self, name: &str, extra: Map<String, Value>) -> ArrResult<Command> {
        let mut body = extra;
        body.insert("name".into(), json!(name));
        let command: Command = self.post("command", &body).await?;
        info!("{} queued command {} ({})", self.service(), command.name, command.id);
        Ok(command)
    }

    pub async fn manual_import_candidates(&self, folder: &str) -> ArrResult<Vec<ImportCandidate>> {
        self.get(
            "manualimport",
            vec![
                ("folder", folder.to_string()),
                ("filterExistingFiles", "true".to_string()),
            ],
        )
        .await
    }

    /// Import every acceptable file found in `folder`
    pub async fn manual_import(
        &self,
        folder: &str,
        mode: ImportMode,
    ) -> ArrResult<ManualImportOutcome> {
        let candidates = self.manual_import_candidates(folder).await?;
        let mut outcome = ManualImportOutcome::default();
        let mut files = Vec::new();

        for candidate in candidates {
            match import_file(self.service(), &candidate) {
                Ok(file) => {
                    outcome.imported.push(candidate.path.clone());
                    files.push(file);
                }
                Err(reasons) => outcome.rejected.push(RejectedFile {
                    path: candidate.path.clone(),
                    reasons,
                }),
            }
        }

        if files.is_empty() {
            return Ok(outcome);
        }

        let mut extra = Map::new();
        extra.insert("files".into(), Value::Array(files));
        extra.insert("importMode".into(), json!(mode.as_api_str()));
        outcome.command = Some(self.command("ManualImport", extra).await?);
        Ok(outcome)
    }
}

/// Build the `files[]` entry for one candidate, or the reasons it cannot be imported
fn import_file(service: Service, candidate: &ImportCandidate) -> Result<Value, Vec<String>> {
    if !candidate.rejections.is_empty() {
        return Err(candidate
            .rejections
            .iter()
            .map(|r| r.reason.clone())
            .collect());
    }

    let rest = &candidate.rest;
    let id_of = |key: &str| rest.get(key).and_then(|v| v.get("id")).and_then(Value::as_i64);

    let mut file = Map::new();
    file.insert("path".into(), json!(candidate.path));
    for key in ["quality", "languages", "releaseGroup", "downloadId"] {
        if let Some(value) = rest.get(key) {
            file.insert(key.into(), value.clone());
        }
    }

    match service {
        Service::Radarr => {
            let movie_id = id_of("movie").ok_or_else(|| vec!["No matching movie".to_string()])?;
            file.insert("movieId".into(), json!(movie_id));
        }
        Service::Sonarr => {
            let series_id =
                id_of("series").ok_or_else(|| vec!["No matching series".to_string()])?;
            let episode_ids: Vec<i64> = rest
                .get("episodes")
                .and_then(Value::as_array)
                .map(|eps| eps.iter().filter_map(|e| e.get("id")?.as_i64()).collect())
                .unwrap_or_default();
            if episode_ids.is_empty() {
                return Err(vec!["No matching episodes".to_string()]);
            }
            file.insert("seriesId".into(), json!(series_id));
            file.insert("episodeIds".into(), json!(episode_ids));
        }
    }

    Ok(Value::Object(file))
}
