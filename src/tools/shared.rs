//! Tools available for both services, selected by a `service` argument

use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{parse_args, to_pretty, ArrTools, ToolDef};
use crate::arr::{ArrClient, ImportMode, Service, REFRESH_MONITORED_COMMAND};

const DEFAULT_QUEUE_LIMIT: u32 = 50;
const DEFAULT_PAGE_LIMIT: u32 = 20;
const DEFAULT_CALENDAR_DAYS: i64 = 7;
const MAX_CALENDAR_DAYS: i64 = 366;

pub static TOOLS: &[ToolDef] = &[
    ToolDef {
        name: "get_queue",
        description: "Show the download queue of Radarr or Sonarr with status and progress.",
        input_schema: paged_schema,
    },
    ToolDef {
        name: "get_calendar",
        description: "Upcoming movie releases (Radarr) or episode air dates (Sonarr) between start and end dates. Defaults to the next 7 days.",
        input_schema: calendar_schema,
    },
    ToolDef {
        name: "get_history",
        description: "Most recent grab/import/delete events of Radarr or Sonarr.",
        input_schema: paged_schema,
    },
    ToolDef {
        name: "get_missing",
        description: "Monitored movies (Radarr) or aired episodes (Sonarr) that have no file yet.",
        input_schema: paged_schema,
    },
    ToolDef {
        name: "get_quality_profiles",
        description: "List quality profiles (id and name) of Radarr or Sonarr.",
        input_schema: service_schema,
    },
    ToolDef {
        name: "get_root_folders",
        description: "List root folders with free space of Radarr or Sonarr.",
        input_schema: service_schema,
    },
    ToolDef {
        name: "get_system_status",
        description: "Version and runtime information of Radarr or Sonarr; useful as a connectivity check.",
        input_schema: service_schema,
    },
    ToolDef {
        name: "remove_from_queue",
        description: "Remove an item from the download queue, optionally removing it from the download client and blocklisting the release.",
        input_schema: remove_from_queue_schema,
    },
    ToolDef {
        name: "manual_import",
        description: "Import the files found in a folder into Radarr or Sonarr. Files the service cannot match are reported and skipped.",
        input_schema: manual_import_schema,
    },
    ToolDef {
        name: "execute_command",
        description: "Queue a named Radarr or Sonarr command (e.g. RssSync, RefreshMovie, RescanSeries, MissingEpisodeSearch) with an optional body.",
        input_schema: execute_command_schema,
    },
    ToolDef {
        name: "refresh_monitored",
        description: "Ask Radarr or Sonarr to re-check download clients for finished downloads.",
        input_schema: service_schema,
    },
];

fn service_property() -> Value {
    json!({ "type": "string", "enum": ["radarr", "sonarr"], "description": "Target service" })
}

fn service_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "service": service_property() },
        "required": ["service"]
    })
}

fn paged_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "service": service_property(),
            "limit": { "type": "integer", "minimum": 1, "description": "Maximum records to return" }
        },
        "required": ["service"]
    })
}

fn calendar_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "service": service_property(),
            "start": { "type": "string", "description": "First day, YYYY-MM-DD (default today)" },
            "end": { "type": "string", "description": "Last day, YYYY-MM-DD (default start + days)" },
            "days": { "type": "integer", "minimum": 1, "description": "Range length when end is omitted (default 7)" }
        },
        "required": ["service"]
    })
}

fn remove_from_queue_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "service": service_property(),
            "id": { "type": "integer", "description": "Queue item id" },
            "removeFromClient": { "type": "boolean", "description": "Also remove from the download client (default true)" },
            "blocklist": { "type": "boolean", "description": "Blocklist the release (default false)" }
        },
        "required": ["service", "id"]
    })
}

fn manual_import_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "service": service_property(),
            "folder": { "type": "string", "description": "Folder as seen by the service" },
            "importMode": { "type": "string", "enum": ["move", "copy"], "description": "Default move" }
        },
        "required": ["service", "folder"]
    })
}

fn execute_command_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "service": service_property(),
            "name": { "type": "string", "description": "Command name" },
            "body": { "type": "object", "description": "Extra command fields, e.g. {\"movieIds\": [1]}" }
        },
        "required": ["service", "name"]
    })
}

#[derive(Debug, Deserialize)]
struct ServiceArgs {
    service: String,
}

#[derive(Debug, Deserialize)]
struct PagedArgs {
    service: String,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CalendarArgs {
    service: String,
    start: Option<String>,
    end: Option<String>,
    days: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveFromQueueArgs {
    service: String,
    id: i64,
    remove_from_client: Option<bool>,
    #[serde(default)]
    blocklist: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManualImportArgs {
    service: String,
    folder: String,
    import_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExecuteCommandArgs {
    service: String,
    name: String,
    body: Option<Map<String, Value>>,
}

fn client_for<'a>(tools: &'a ArrTools, service: &str) -> Result<&'a ArrClient> {
    Ok(match service.parse::<Service>()? {
        Service::Radarr => tools.radarr().client(),
        Service::Sonarr => tools.sonarr().client(),
    })
}

pub(crate) async fn execute(tools: &ArrTools, name: &str, args: Value) -> Result<String> {
    match name {
        "get_queue" => {
            let args: PagedArgs = parse_args(name, args)?;
            let client = client_for(tools, &args.service)?;
            let queue = client
                .queue(args.limit.unwrap_or(DEFAULT_QUEUE_LIMIT))
                .await?;
            let records: Vec<Value> = queue
                .records
                .iter()
                .map(|r| -> Result<Value> {
                    let mut item = serde_json::to_value(r)?;
                    item["progress"] = json!((r.progress() * 10.0).round() / 10.0);
                    Ok(item)
                })
                .collect::<Result<_>>()?;
            to_pretty(&json!({
                "totalRecords": queue.total_records,
                "records": records,
            }))
        }
        "get_calendar" => {
            let args: CalendarArgs = parse_args(name, args)?;
            let (start, end) = calendar_range(
                Local::now().date_naive(),
                args.start.as_deref(),
                args.end.as_deref(),
                args.days,
            )?;
            let (start, end) = (start.to_string(), end.to_string());
            match args.service.parse::<Service>()? {
                Service::Radarr => to_pretty(&tools.radarr().calendar(&start, &end).await?),
                Service::Sonarr => to_pretty(&tools.sonarr().calendar(&start, &end).await?),
            }
        }
        "get_history" => {
            let args: PagedArgs = parse_args(name, args)?;
            let client = client_for(tools, &args.service)?;
            to_pretty(&client.history(args.limit.unwrap_or(DEFAULT_PAGE_LIMIT)).await?)
        }
        "get_missing" => {
            let args: PagedArgs = parse_args(name, args)?;
            let limit = args.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
            match args.service.parse::<Service>()? {
                Service::Radarr => to_pretty(&tools.radarr().wanted_missing(limit).await?),
                Service::Sonarr => to_pretty(&tools.sonarr().wanted_missing(limit).await?),
            }
        }
        "get_quality_profiles" => {
            let args: ServiceArgs = parse_args(name, args)?;
            to_pretty(&client_for(tools, &args.service)?.quality_profiles().await?)
        }
        "get_root_folders" => {
            let args: ServiceArgs = parse_args(name, args)?;
            to_pretty(&client_for(tools, &args.service)?.root_folders().await?)
        }
        "get_system_status" => {
            let args: ServiceArgs = parse_args(name, args)?;
            to_pretty(&client_for(tools, &args.service)?.system_status().await?)
        }
        "remove_from_queue" => {
            let args: RemoveFromQueueArgs = parse_args(name, args)?;
            let client = client_for(tools, &args.service)?;
            client
                .remove_from_queue(
                    args.id,
                    args.remove_from_client.unwrap_or(true),
                    args.blocklist,
                )
                .await?;
            Ok(format!(
                "Removed queue item {} from {}{}",
                args.id,
                client.service(),
                if args.blocklist { " and blocklisted the release" } else { "" }
            ))
        }
        "manual_import" => {
            let args: ManualImportArgs = parse_args(name, args)?;
            let client = client_for(tools, &args.service)?;
            let folder = args.folder.trim();
            if folder.is_empty() {
                return Err(anyhow!("folder is required"));
            }
            let mode = match args.import_mode.as_deref() {
                Some(mode) => ImportMode::parse(mode)?,
                None => ImportMode::default(),
            };
            let outcome = client.manual_import(folder, mode).await?;
            Ok(format!(
                "Imported {} file(s), skipped {}\n{}",
                outcome.imported.len(),
                outcome.rejected.len(),
                to_pretty(&outcome)?
            ))
        }
        "execute_command" => {
            let args: ExecuteCommandArgs = parse_args(name, args)?;
            let client = client_for(tools, &args.service)?;
            let command_name = args.name.trim();
            if command_name.is_empty() {
                return Err(anyhow!("name is required"));
            }
            let command = client
                .command(command_name, args.body.unwrap_or_default())
                .await?;
            Ok(format!(
                "Queued {} command {} (id {})\n{}",
                client.service(),
                command.name,
                command.id,
                to_pretty(&command)?
            ))
        }
        "refresh_monitored" => {
            let args: ServiceArgs = parse_args(name, args)?;
            let client = client_for(tools, &args.service)?;
            let command = client
                .command(REFRESH_MONITORED_COMMAND, Map::new())
                .await?;
            Ok(format!(
                "Queued {} on {} (id {})",
                REFRESH_MONITORED_COMMAND,
                client.service(),
                command.id
            ))
        }
        _ => Err(anyhow!("Unknown tool: {}", name)),
    }
}

/// Quality profile and root folder for an add, defaulting to the first of each
pub(crate) async fn resolve_add_defaults(
    client: &ArrClient,
    quality_profile_id: Option<i64>,
    root_folder_path: Option<String>,
) -> Result<(i64, String)> {
    let quality_profile_id = match quality_profile_id {
        Some(id) => id,
        None => client
            .quality_profiles()
            .await?
            .first()
            .map(|p| p.id)
            .ok_or_else(|| anyhow!("No quality profiles configured in {}", client.service()))?,
    };

    let root_folder_path = match root_folder_path.filter(|p| !p.trim().is_empty()) {
        Some(path) => path,
        None => client
            .root_folders()
            .await?
            .into_iter()
            .find(|f| f.accessible)
            .map(|f| f.path)
            .ok_or_else(|| anyhow!("No root folders configured in {}", client.service()))?,
    };

    Ok((quality_profile_id, root_folder_path))
}

/// Resolve an inclusive date range from optional start/end/days
fn calendar_range(
    today: NaiveDate,
    start: Option<&str>,
    end: Option<&str>,
    days: Option<i64>,
) -> Result<(NaiveDate, NaiveDate)> {
    let parse = |label: &str, s: &str| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| anyhow!("Invalid {} date '{}', expected YYYY-MM-DD", label, s))
    };

    let start = match start {
        Some(s) => parse("start", s)?,
        None => today,
    };
    let end = match end {
        Some(s) => parse("end", s)?,
        None => {
            let days = days.unwrap_or(DEFAULT_CALENDAR_DAYS);
            if days < 1 {
                return Err(anyhow!("days must be at least 1"));
            }
            start
                .checked_add_signed(Duration::days(days.min(MAX_CALENDAR_DAYS)))
                .ok_or_else(|| anyhow!("date range starting {} is out of range", start))?
        }
    };

    if end < start {
        return Err(anyhow!("end date {} is before start date {}", end, start));
    }
    if (end - start).num_days() > MAX_CALENDAR_DAYS {
        return Err(anyhow!("date range exceeds {} days", MAX_CALENDAR_DAYS));
    }
    Ok((start, end))
}
