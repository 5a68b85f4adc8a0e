//! Radarr tools

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use super::shared::resolve_add_defaults;
use super::{parse_args, title_matches, to_pretty, truncate_text, ArrTools, ToolDef};
use crate::arr::models::Movie;
use crate::arr::{AddMovie, MovieUpdate};

/// Default number of movies returned by list/search tools
const DEFAULT_LIMIT: usize = 50;

/// Overview length kept in search results
const SEARCH_OVERVIEW_CHARS: usize = 200;

pub static TOOLS: &[ToolDef] = &[
    ToolDef {
        name: "get_radarr_movies",
        description: "List movies in the Radarr library. Optional filters: title substring, monitored, hasFile. Returns id, title, year, TMDb id, monitoring and file state.",
        input_schema: list_movies_schema,
    },
    ToolDef {
        name: "get_radarr_movie",
        description: "Get details of one Radarr movie by its Radarr id, including overview, path and quality profile.",
        input_schema: movie_id_schema,
    },
    ToolDef {
        name: "search_radarr_movies",
        description: "Search TMDb through Radarr for movies to add. Returns candidates with their tmdbId; movies already in the library have a non-zero id.",
        input_schema: search_schema,
    },
    ToolDef {
        name: "add_radarr_movie",
        description: "Add a movie to Radarr by TMDb id. Uses the first quality profile and root folder unless given, and starts a search unless searchForMovie is false.",
        input_schema: add_movie_schema,
    },
    ToolDef {
        name: "update_radarr_movie",
        description: "Change monitoring, quality profile, minimum availability or tags of a Radarr movie.",
        input_schema: update_movie_schema,
    },
    ToolDef {
        name: "delete_radarr_movie",
        description: "Remove a movie from Radarr, optionally deleting its files and excluding it from future imports.",
        input_schema: delete_movie_schema,
    },
];

fn list_movies_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "Case-insensitive title substring" },
            "monitored": { "type": "boolean", "description": "Only monitored (true) or unmonitored (false) movies" },
            "hasFile": { "type": "boolean", "description": "Only downloaded (true) or missing (false) movies" },
            "limit": { "type": "integer", "minimum": 1, "description": "Maximum movies to return (default 50)" }
        }
    })
}

fn movie_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "movieId": { "type": "integer", "description": "Radarr movie id" }
        },
        "required": ["movieId"]
    })
}

fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "term": { "type": "string", "description": "Title to search for, or tmdb:<id> / imdb:<id>" },
            "limit": { "type": "integer", "minimum": 1, "description": "Maximum results (default 50)" }
        },
        "required": ["term"]
    })
}

fn add_movie_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tmdbId": { "type": "integer", "description": "TMDb id of the movie" },
            "title": { "type": "string", "description": "Title, used only when TMDb lookup fails" },
            "year": { "type": "integer", "description": "Release year, used only when TMDb lookup fails" },
            "qualityProfileId": { "type": "integer", "description": "Quality profile id (default: first profile)" },
            "rootFolderPath": { "type": "string", "description": "Root folder (default: first root folder)" },
            "monitored": { "type": "boolean", "description": "Monitor the movie (default true)" },
            "minimumAvailability": {
                "type": "string",
                "enum": ["announced", "inCinemas", "released"],
                "description": "When the movie is considered available (default released)"
            },
            "searchForMovie": { "type": "boolean", "description": "Search for the movie after adding (default true)" }
        },
        "required": ["tmdbId"]
    })
}

fn update_movie_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "movieId": { "type": "integer", "description": "Radarr movie id" },
            "monitored": { "type": "boolean" },
            "qualityProfileId": { "type": "integer" },
            "minimumAvailability": { "type": "string", "enum": ["announced", "inCinemas", "released"] },
            "tags": { "type": "array", "items": { "type": "integer" }, "description": "Replaces the movie's tag ids" }
        },
        "required": ["movieId"]
    })
}

fn delete_movie_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "movieId": { "type": "integer", "description": "Radarr movie id" },
            "deleteFiles": { "type": "boolean", "description": "Delete the movie folder and files (default false)" },
            "addImportExclusion": { "type": "boolean", "description": "Prevent the movie from being re-added by lists (default false)" }
        },
        "required": ["movieId"]
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMoviesArgs {
    title: Option<String>,
    monitored: Option<bool>,
    has_file: Option<bool>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieIdArgs {
    movie_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    term: String,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMovieArgs {
    tmdb_id: i64,
    title: Option<String>,
    year: Option<i32>,
    quality_profile_id: Option<i64>,
    root_folder_path: Option<String>,
    monitored: Option<bool>,
    minimum_availability: Option<String>,
    search_for_movie: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMovieArgs {
    movie_id: i64,
    monitored: Option<bool>,
    quality_profile_id: Option<i64>,
    minimum_availability: Option<String>,
    tags: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteMovieArgs {
    movie_id: i64,
    #[serde(default)]
    delete_files: bool,
    #[serde(default)]
    add_import_exclusion: bool,
}

pub(crate) async fn execute(tools: &ArrTools, name: &str, args: Value) -> Result<String> {
    let radarr = tools.radarr();
    match name {
        "get_radarr_movies" => {
            let args: ListMoviesArgs = parse_args(name, args)?;
            let movies = radarr.movies().await?;
            let (total, movies) = filter_movies(movies, &args);
            to_pretty(&json!({
                "total": total,
                "returned": movies.len(),
                "movies": movies,
            }))
        }
        "get_radarr_movie" => {
            let args: MovieIdArgs = parse_args(name, args)?;
            to_pretty(&radarr.movie(args.movie_id).await?)
        }
        "search_radarr_movies" => {
            let args: SearchArgs = parse_args(name, args)?;
            let term = args.term.trim();
            if term.is_empty() {
                return Err(anyhow!("term is required"));
            }
            let results: Vec<Movie> = radarr
                .lookup(term)
                .await?
                .into_iter()
                .take(args.limit.unwrap_or(DEFAULT_LIMIT))
                .map(|mut m| {
                    m.overview = m
                        .overview
                        .map(|o| truncate_text(&o, SEARCH_OVERVIEW_CHARS));
                    m
                })
                .collect();
            to_pretty(&results)
        }
        "add_radarr_movie" => {
            let args: AddMovieArgs = parse_args(name, args)?;
            let (quality_profile_id, root_folder_path) = resolve_add_defaults(
                radarr.client(),
                args.quality_profile_id,
                args.root_folder_path,
            )
            .await?;
            let request = AddMovie {
                tmdb_id: args.tmdb_id,
                title: args.title,
                year: args.year,
                quality_profile_id,
                root_folder_path,
                monitored: args.monitored.unwrap_or(true),
                minimum_availability: args.minimum_availability,
                search: args.search_for_movie.unwrap_or(true),
            };
            let movie = radarr.add_movie(&request).await?;
            Ok(format!(
                "Added movie '{}' ({}) with id {}\n{}",
                movie.title,
                movie.year,
                movie.id,
                to_pretty(&movie)?
            ))
        }
        "update_radarr_movie" => {
            let args: UpdateMovieArgs = parse_args(name, args)?;
            let update = MovieUpdate {
                monitored: args.monitored,
                quality_profile_id: args.quality_profile_id,
                minimum_availability: args.minimum_availability,
                tags: args.tags,
            };
            if update.is_empty() {
                return Err(anyhow!("Nothing to update for movie {}", args.movie_id));
            }
            let movie = radarr.update_movie(args.movie_id, &update).await?;
            Ok(format!("Updated movie '{}'\n{}", movie.title, to_pretty(&movie)?))
        }
        "delete_radarr_movie" => {
            let args: DeleteMovieArgs = parse_args(name, args)?;
            radarr
                .delete_movie(args.movie_id, args.delete_files, args.add_import_exclusion)
                .await?;
            Ok(format!(
                "Deleted movie {}{}",
                args.movie_id,
                if args.delete_files { " and its files" } else { "" }
            ))
        }
        _ => Err(anyhow!("Unknown Radarr tool: {}", name)),
    }
}

/// Apply list filters; returns the match count before `limit` and the page
fn filter_movies(movies: Vec<Movie>, args: &ListMoviesArgs) -> (usize, Vec<Movie>) {
    let matched: Vec<Movie> = movies
        .into_iter()
        .filter(|m| title_matches(&m.title, args.title.as_deref()))
        .filter(|m| args.monitored.map_or(true, |want| m.monitored == want))
        .filter(|m| args.has_file.map_or(true, |want| m.has_file == want))
        .collect();
    let total = matched.len();
    let page = matched
        .into_iter()
        .take(args.limit.unwrap_or(DEFAULT_LIMIT))
        .map(|mut m| {
            m.overview = None;
            m
        })
        .collect();
    (total, page)
}
