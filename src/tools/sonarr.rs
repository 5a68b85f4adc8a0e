//! Sonarr tools

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::shared::resolve_add_defaults;
use super::{parse_args, title_matches, to_pretty, truncate_text, ArrTools, ToolDef};
use crate::arr::models::{Episode, Series};
use crate::arr::{AddSeries, SeriesUpdate};

const DEFAULT_LIMIT: usize = 50;
const SEARCH_OVERVIEW_CHARS: usize = 200;

pub static TOOLS: &[ToolDef] = &[
    ToolDef {
        name: "get_sonarr_series",
        description: "List series in the Sonarr library. Optional filters: title substring, monitored. Returns id, title, year, TVDB id, status and episode statistics.",
        input_schema: list_series_schema,
    },
    ToolDef {
        name: "get_sonarr_series_by_id",
        description: "Get details of one Sonarr series by its Sonarr id, including seasons and overview.",
        input_schema: series_id_schema,
    },
    ToolDef {
        name: "search_sonarr_series",
        description: "Search TVDB through Sonarr for series to add. Returns candidates with their tvdbId.",
        input_schema: search_schema,
    },
    ToolDef {
        name: "get_sonarr_episodes",
        description: "List episodes of a Sonarr series, optionally for one season or only those without a file.",
        input_schema: episodes_schema,
    },
    ToolDef {
        name: "add_sonarr_series",
        description: "Add a series to Sonarr by TVDB id. Uses the first quality profile and root folder unless given, and searches for missing episodes unless searchForMissingEpisodes is false.",
        input_schema: add_series_schema,
    },
    ToolDef {
        name: "update_sonarr_series",
        description: "Change monitoring, quality profile, season folder or tags of a Sonarr series.",
        input_schema: update_series_schema,
    },
    ToolDef {
        name: "delete_sonarr_series",
        description: "Remove a series from Sonarr, optionally deleting its files.",
        input_schema: delete_series_schema,
    },
    ToolDef {
        name: "monitor_sonarr_episodes",
        description: "Set the monitored flag of one or more Sonarr episodes.",
        input_schema: monitor_episodes_schema,
    },
];

fn list_series_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "Case-insensitive title substring" },
            "monitored": { "type": "boolean", "description": "Only monitored (true) or unmonitored (false) series" },
            "limit": { "type": "integer", "minimum": 1, "description": "Maximum series to return (default 50)" }
        }
    })
}

fn series_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "seriesId": { "type": "integer", "description": "Sonarr series id" }
        },
        "required": ["seriesId"]
    })
}

fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "term": { "type": "string", "description": "Title to search for, or tvdb:<id>" },
            "limit": { "type": "integer", "minimum": 1, "description": "Maximum results (default 50)" }
        },
        "required": ["term"]
    })
}

fn episodes_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "seriesId": { "type": "integer", "description": "Sonarr series id" },
            "seasonNumber": { "type": "integer", "description": "Only this season" },
            "missingOnly": { "type": "boolean", "description": "Only episodes without a file (default false)" }
        },
        "required": ["seriesId"]
    })
}

fn add_series_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tvdbId": { "type": "integer", "description": "TVDB id of the series" },
            "qualityProfileId": { "type": "integer", "description": "Quality profile id (default: first profile)" },
            "rootFolderPath": { "type": "string", "description": "Root folder (default: first root folder)" },
            "monitored": { "type": "boolean", "description": "Monitor all episodes (default true)" },
            "seasonFolder": { "type": "boolean", "description": "Use season folders (default true)" },
            "searchForMissingEpisodes": { "type": "boolean", "description": "Search after adding (default true)" }
        },
        "required": ["tvdbId"]
    })
}

fn update_series_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "seriesId": { "type": "integer", "description": "Sonarr series id" },
            "monitored": { "type": "boolean" },
            "qualityProfileId": { "type": "integer" },
            "seasonFolder": { "type": "boolean" },
            "tags": { "type": "array", "items": { "type": "integer" }, "description": "Replaces the series' tag ids" }
        },
        "required": ["seriesId"]
    })
}

fn delete_series_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "seriesId": { "type": "integer", "description": "Sonarr series id" },
            "deleteFiles": { "type": "boolean", "description": "Delete the series folder and files (default false)" }
        },
        "required": ["seriesId"]
    })
}

fn monitor_episodes_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "episodeIds": { "type": "array", "items": { "type": "integer" }, "minItems": 1 },
            "monitored": { "type": "boolean", "description": "New monitored state (default true)" }
        },
        "required": ["episodeIds"]
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSeriesArgs {
    title: Option<String>,
    monitored: Option<bool>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesIdArgs {
    series_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    term: String,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodesArgs {
    series_id: i64,
    season_number: Option<i32>,
    #[serde(default)]
    missing_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddSeriesArgs {
    tvdb_id: i64,
    quality_profile_id: Option<i64>,
    root_folder_path: Option<String>,
    monitored: Option<bool>,
    season_folder: Option<bool>,
    search_for_missing_episodes: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSeriesArgs {
    series_id: i64,
    monitored: Option<bool>,
    quality_profile_id: Option<i64>,
    season_folder: Option<bool>,
    tags: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteSeriesArgs {
    series_id: i64,
    #[serde(default)]
    delete_files: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonitorEpisodesArgs {
    episode_ids: Vec<i64>,
    monitored: Option<bool>,
}

/// Episode counts per season
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeasonSummary {
    season_number: i32,
    episodes: usize,
    with_file: usize,
}

pub(crate) async fn execute(tools: &ArrTools, name: &str, args: Value) -> Result<String> {
    let sonarr = tools.sonarr();
    match name {
        "get_sonarr_series" => {
            let args: ListSeriesArgs = parse_args(name, args)?;
            let series = sonarr.series().await?;
            let (total, series) = filter_series(series, &args);
            to_pretty(&json!({
                "total": total,
                "returned": series.len(),
                "series": series,
            }))
        }
        "get_sonarr_series_by_id" => {
            let args: SeriesIdArgs = parse_args(name, args)?;
            to_pretty(&sonarr.series_by_id(args.series_id).await?)
        }
        "search_sonarr_series" => {
            let args: SearchArgs = parse_args(name, args)?;
            let term = args.term.trim();
            if term.is_empty() {
                return Err(anyhow!("term is required"));
            }
            let results: Vec<Series> = sonarr
                .lookup(term)
                .await?
                .into_iter()
                .take(args.limit.unwrap_or(DEFAULT_LIMIT))
                .map(|mut s| {
                    s.overview = s
                        .overview
                        .map(|o| truncate_text(&o, SEARCH_OVERVIEW_CHARS));
                    s
                })
                .collect();
            to_pretty(&results)
        }
        "get_sonarr_episodes" => {
            let args: EpisodesArgs = parse_args(name, args)?;
            let episodes: Vec<Episode> = sonarr
                .episodes(args.series_id, args.season_number)
                .await?
                .into_iter()
                .filter(|e| !args.missing_only || !e.has_file)
                .collect();
            to_pretty(&json!({
                "seasons": summarize_seasons(&episodes),
                "episodes": episodes,
            }))
        }
        "add_sonarr_series" => {
            let args: AddSeriesArgs = parse_args(name, args)?;
            let (quality_profile_id, root_folder_path) = resolve_add_defaults(
                sonarr.client(),
                args.quality_profile_id,
                args.root_folder_path,
            )
            .await?;
            let request = AddSeries {
                tvdb_id: args.tvdb_id,
                quality_profile_id,
                root_folder_path,
                monitored: args.monitored.unwrap_or(true),
                season_folder: args.season_folder.unwrap_or(true),
                search: args.search_for_missing_episodes.unwrap_or(true),
            };
            let series = sonarr.add_series(&request).await?;
            Ok(format!(
                "Added series '{}' with id {}\n{}",
                series.title,
                series.id,
                to_pretty(&series)?
            ))
        }
        "update_sonarr_series" => {
            let args: UpdateSeriesArgs = parse_args(name, args)?;
            let update = SeriesUpdate {
                monitored: args.monitored,
                quality_profile_id: args.quality_profile_id,
                season_folder: args.season_folder,
                tags: args.tags,
            };
            if update.is_empty() {
                return Err(anyhow!("Nothing to update for series {}", args.series_id));
            }
            let series = sonarr.update_series(args.series_id, &update).await?;
            Ok(format!("Updated series '{}'\n{}", series.title, to_pretty(&series)?))
        }
        "delete_sonarr_series" => {
            let args: DeleteSeriesArgs = parse_args(name, args)?;
            sonarr.delete_series(args.series_id, args.delete_files).await?;
            Ok(format!(
                "Deleted series {}{}",
                args.series_id,
                if args.delete_files { " and its files" } else { "" }
            ))
        }
        "monitor_sonarr_episodes" => {
            let args: MonitorEpisodesArgs = parse_args(name, args)?;
            if args.episode_ids.is_empty() {
                return Err(anyhow!("episodeIds must not be empty"));
            }
            let monitored = args.monitored.unwrap_or(true);
            sonarr.monitor_episodes(&args.episode_ids, monitored).await?;
            Ok(format!(
                "{} {} episode(s)",
                if monitored { "Monitored" } else { "Unmonitored" },
                args.episode_ids.len()
            ))
        }
        _ => Err(anyhow!("Unknown Sonarr tool: {}", name)),
    }
}

fn filter_series(series: Vec<Series>, args: &ListSeriesArgs) -> (usize, Vec<Series>) {
    let matched: Vec<Series> = series
        .into_iter()
        .filter(|s| title_matches(&s.title, args.title.as_deref()))
        .filter(|s| args.monitored.map_or(true, |want| s.monitored == want))
        .collect();
    let total = matched.len();
    let page = matched
        .into_iter()
        .take(args.limit.unwrap_or(DEFAULT_LIMIT))
        .map(|mut s| {
            s.overview = None;
            s.seasons.clear();
            s
        })
        .collect();
    (total, page)
}

fn summarize_seasons(episodes: &[Episode]) -> Vec<SeasonSummary> {
    let mut seasons: Vec<SeasonSummary> = Vec::new();
    for episode in episodes {
        let idx = match seasons
            .iter()
            .position(|s| s.season_number == episode.season_number)
        {
            Some(idx) => idx,
            None => {
                seasons.push(SeasonSummary {
                    season_number: episode.season_number,
                    episodes: 0,
                    with_file: 0,
                });
                seasons.len() - 1
            }
        };
        seasons[idx].episodes += 1;
        if episode.has_file {
            seasons[idx].with_file += 1;
        }
    }
    seasons.sort_by_key(|s| s.season_number);
    seasons
}
