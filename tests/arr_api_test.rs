//! Tests for the Radarr/Sonarr REST client against a mock server

use radarr_sonarr_mcp::arr::{
    AddMovie, AddSeries, ArrError, ImportMode, MovieUpdate, RadarrApi, Service, SonarrApi,
    REFRESH_MONITORED_COMMAND,
};
use radarr_sonarr_mcp::config::ServiceConfig;
use serde_json::{json, Map};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "secret-key";

fn radarr(server: &MockServer) -> RadarrApi {
    RadarrApi::from_config(&ServiceConfig::new(API_KEY, server.uri())).unwrap()
}

fn sonarr(server: &MockServer) -> SonarrApi {
    SonarrApi::from_config(&ServiceConfig::new(API_KEY, server.uri())).unwrap()
}

// Tests for the client core

#[tokio::test]
async fn test_requests_carry_api_key_and_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .and(header("X-Api-Key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Alien", "year": 1979, "monitored": true, "hasFile": true, "images": []}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let movies = radarr(&server).movies().await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title, "Alien");
    assert!(movies[0].has_file);
}

#[tokio::test]
async fn test_custom_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sonarr/api/v3/system/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"appName": "Sonarr", "version": "4.0.1"})),
        )
        .mount(&server)
        .await;

    let config = ServiceConfig::new(API_KEY, server.uri()).with_base_path("/sonarr/api/v3");
    let status = SonarrApi::from_config(&config)
        .unwrap()
        .client()
        .system_status()
        .await
        .unwrap();
    assert_eq!(status.app_name, "Sonarr");
    assert_eq!(status.version, "4.0.1");
}

#[tokio::test]
async fn test_status_errors_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/queue"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
        .mount(&server)
        .await;

    let api = radarr(&server);
    assert!(matches!(
        api.movie(99).await.unwrap_err(),
        ArrError::NotFound {
            service: Service::Radarr,
            ..
        }
    ));
    assert!(matches!(
        api.movies().await.unwrap_err(),
        ArrError::Unauthorized(Service::Radarr)
    ));
    let err = api.client().queue(20).await.unwrap_err();
    assert_eq!(err.to_string(), "Radarr API failed: 500 - database locked");
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = sonarr(&server).series().await.unwrap_err();
    assert!(matches!(err, ArrError::Decode { .. }));
}

// Tests for Radarr endpoints

#[tokio::test]
async fn test_add_movie_uses_tmdb_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie/lookup/tmdb"))
        .and(query_param("tmdbId", "348"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Alien", "year": 1979, "tmdbId": 348, "images": [{"coverType": "poster"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/movie"))
        .and(body_partial_json(json!({
            "tmdbId": 348,
            "images": [{"coverType": "poster"}],
            "qualityProfileId": 4,
            "rootFolderPath": "/movies",
            "monitored": true,
            "minimumAvailability": "released",
            "addOptions": {"searchForMovie": false}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 10, "title": "Alien", "year": 1979, "tmdbId": 348
        })))
        .expect(1)
        .mount(&server)
        .await;

    let movie = radarr(&server)
        .add_movie(&AddMovie {
            tmdb_id: 348,
            quality_profile_id: 4,
            root_folder_path: "/movies".to_string(),
            monitored: true,
            search: false,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(movie.id, 10);
}

#[tokio::test]
async fn test_add_movie_falls_back_to_title_when_lookup_misses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie/lookup/tmdb"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/movie"))
        .and(body_partial_json(json!({"title": "Obscure", "year": 2001, "tmdbId": 7})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 2, "title": "Obscure"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = radarr(&server);
    let request = AddMovie {
        tmdb_id: 7,
        title: Some("Obscure".to_string()),
        year: Some(2001),
        quality_profile_id: 1,
        root_folder_path: "/movies".to_string(),
        ..Default::default()
    };
    assert_eq!(api.add_movie(&request).await.unwrap().id, 2);

    let without_title = AddMovie {
        title: None,
        ..request
    };
    assert!(matches!(
        api.add_movie(&without_title).await.unwrap_err(),
        ArrError::Invalid(_)
    ));
}

#[tokio::test]
async fn test_update_movie_round_trips_full_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "title": "Heat", "monitored": true, "qualityProfileId": 1, "folderName": "/movies/Heat"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/movie/5"))
        .and(body_partial_json(json!({
            "monitored": false, "qualityProfileId": 1, "folderName": "/movies/Heat"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": 5, "title": "Heat", "monitored": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let movie = radarr(&server)
        .update_movie(
            5,
            &MovieUpdate {
                monitored: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!movie.monitored);
}

#[tokio::test]
async fn test_delete_movie_sends_flags() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/movie/5"))
        .and(query_param("deleteFiles", "true"))
        .and(query_param("addImportExclusion", "false"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    radarr(&server).delete_movie(5, true, false).await.unwrap();
}

// Tests for Sonarr endpoints

#[tokio::test]
async fn test_add_series_uses_tvdb_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series/lookup"))
        .and(query_param("term", "tvdb:280619"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"title": "The Expanse", "tvdbId": 280619, "seasons": [{"seasonNumber": 1}]}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/series"))
        .and(body_partial_json(json!({
            "tvdbId": 280619,
            "qualityProfileId": 2,
            "rootFolderPath": "/tv",
            "seasonFolder": true,
            "addOptions": {"monitor": "all", "searchForMissingEpisodes": true}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 8, "title": "The Expanse", "tvdbId": 280619
        })))
        .expect(1)
        .mount(&server)
        .await;

    let series = sonarr(&server)
        .add_series(&AddSeries {
            tvdb_id: 280619,
            quality_profile_id: 2,
            root_folder_path: "/tv".to_string(),
            monitored: true,
            season_folder: true,
            search: true,
        })
        .await
        .unwrap();
    assert_eq!(series.id, 8);
}

#[tokio::test]
async fn test_add_series_unknown_tvdb_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = sonarr(&server)
        .add_series(&AddSeries {
            tvdb_id: 1,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No series found for TVDB id 1"));
}

#[tokio::test]
async fn test_episodes_filtered_by_season() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/episode"))
        .and(query_param("seriesId", "8"))
        .and(query_param("seasonNumber", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 100, "seriesId": 8, "seasonNumber": 2, "episodeNumber": 1, "title": "Static", "hasFile": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let episodes = sonarr(&server).episodes(8, Some(2)).await.unwrap();
    assert_eq!(episodes[0].episode_number, 1);
}

#[tokio::test]
async fn test_monitor_episodes_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/episode/monitor"))
        .and(body_partial_json(json!({"episodeIds": [1, 2], "monitored": false})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    sonarr(&server).monitor_episodes(&[1, 2], false).await.unwrap();
}

// Tests for shared endpoints

#[tokio::test]
async fn test_queue_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/queue"))
        .and(query_param("pageSize", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "pageSize": 20, "totalRecords": 1,
            "records": [{"id": 3, "title": "Alien.1979", "size": 200.0, "sizeleft": 50.0}]
        })))
        .mount(&server)
        .await;

    let page = radarr(&server).client().queue(20).await.unwrap();
    assert_eq!(page.total_records, 1);
    assert!((page.records[0].progress() - 75.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_command_posts_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/command"))
        .and(body_partial_json(json!({"name": REFRESH_MONITORED_COMMAND})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 44, "name": REFRESH_MONITORED_COMMAND, "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let command = sonarr(&server)
        .client()
        .command(REFRESH_MONITORED_COMMAND, Map::new())
        .await
        .unwrap();
    assert_eq!(command.id, 44);
    assert_eq!(command.status.as_deref(), Some("queued"));
}

#[tokio::test]
async fn test_manual_import_skips_rejected_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/manualimport"))
        .and(query_param("folder", "/downloads/done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"path": "/downloads/done/Alien.mkv", "movie": {"id": 1}, "rejections": []},
            {"path": "/downloads/done/sample.mkv", "rejections": [{"reason": "Sample"}]}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/command"))
        .and(body_partial_json(json!({
            "name": "ManualImport",
            "importMode": "copy",
            "files": [{"path": "/downloads/done/Alien.mkv", "movieId": 1}]
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 9, "name": "ManualImport"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = radarr(&server)
        .client()
        .manual_import("/downloads/done", ImportMode::Copy)
        .await
        .unwrap();
    assert_eq!(outcome.imported, vec!["/downloads/done/Alien.mkv".to_string()]);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].reasons, vec!["Sample".to_string()]);
    assert_eq!(outcome.command.map(|c| c.id), Some(9));
}

#[tokio::test]
async fn test_manual_import_nothing_importable_sends_no_command() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/manualimport"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/command"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = sonarr(&server)
        .client()
        .manual_import("/downloads", ImportMode::Move)
        .await
        .unwrap();
    assert!(outcome.imported.is_empty());
    assert!(outcome.command.is_none());
}
