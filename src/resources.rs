//! MCP resources - read-only JSON snapshots of each service

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::arr::Service;
use crate::tools::ArrTools;

/// Static resource definition
pub struct ResourceDef {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const JSON_MIME_TYPE: &str = "application/json";

pub static RESOURCES: &[ResourceDef] = &[
    ResourceDef {
        uri: "radarr://movies",
        name: "Radarr movies",
        description: "All movies in the Radarr library",
    },
    ResourceDef {
        uri: "sonarr://series",
        name: "Sonarr series",
        description: "All series in the Sonarr library",
    },
    ResourceDef {
        uri: "radarr://queue",
        name: "Radarr queue",
        description: "Current Radarr download queue",
    },
    ResourceDef {
        uri: "sonarr://queue",
        name: "Sonarr queue",
        description: "Current Sonarr download queue",
    },
    ResourceDef {
        uri: "radarr://system/status",
        name: "Radarr status",
        description: "Radarr version and runtime information",
    },
    ResourceDef {
        uri: "sonarr://system/status",
        name: "Sonarr status",
        description: "Sonarr version and runtime information",
    },
];

pub fn find_resource(uri: &str) -> Option<&'static ResourceDef> {
    RESOURCES.iter().find(|r| r.uri == uri)
}

/// Read one resource as pretty JSON; unknown URIs are an error
pub async fn read_resource(tools: &ArrTools, uri: &str) -> Result<String> {
    if find_resource(uri).is_none() {
        return Err(anyhow!("Unknown resource: {}", uri));
    }

    let (scheme, path) = uri
        .split_once("://")
        .ok_or_else(|| anyhow!("Malformed resource URI: {}", uri))?;
    let service: Service = scheme.parse()?;
    let client = match service {
        Service::Radarr => tools.radarr().client(),
        Service::Sonarr => tools.sonarr().client(),
    };

    match (service, path) {
        (Service::Radarr, "movies") => pretty(&tools.radarr().movies().await?),
        (Service::Sonarr, "series") => pretty(&tools.sonarr().series().await?),
        (_, "queue") => pretty(&client.queue(100).await?),
        (_, "system/status") => pretty(&client.system_status().await?),
        _ => Err(anyhow!("Unknown resource: {}", uri)),
    }
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
