use reelboard::catalog::{Catalog, Movie};
use reelboard::settings::{TmdbSettings, TrmnlSettings, DEFAULT_TIMEOUT};
use reelboard::tmdb::{TmdbApi, TmdbClient};
use reelboard::trmnl::{DisplayView, TrmnlClient};
use serde_json::{json, Map};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE_BASE: &str = "https://image.test/t/p/w500";

fn tmdb(server: &MockServer) -> TmdbClient {
    TmdbClient::new(TmdbSettings {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        image_base: IMAGE_BASE.to_string(),
        timeout: DEFAULT_TIMEOUT,
    })
    .unwrap()
}

fn trmnl(server: &MockServer) -> TrmnlClient {
    TrmnlClient::new(TrmnlSettings {
        base_url: server.uri(),
        timeout: DEFAULT_TIMEOUT,
    })
    .unwrap()
}

fn view() -> DisplayView {
    let movie = |title: &str, date: &str| Movie {
        title: title.to_string(),
        date: date.parse().unwrap(),
        time: "20:00".to_string(),
        channel: "Hallmark Channel".to_string(),
        duration_minutes: Some(120),
        description: "A baker returns home.".to_string(),
        stars: "Jane Doe".to_string(),
        premiere: true,
        image: reelboard::slug::catalog_image_path(title),
        tmdb_id: None,
        imdb_id: None,
        extra: Map::new(),
    };
    let catalog = Catalog {
        season: "2025 Countdown to Christmas".to_string(),
        start_date: "2025-10-17".parse().unwrap(),
        end_date: "2025-12-25".parse().unwrap(),
        movies: vec![
            movie("Holiday Touchdown", "2025-12-06"),
            movie("Christmas on Duty", "2025-12-07"),
        ],
    };
    DisplayView::from_catalog(&catalog, "2025-12-01".parse().unwrap(), 4)
}

#[tokio::test]
async fn search_returns_first_hit_poster() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "A Newport Christmas"))
        .and(query_param("year", "2025"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": 1, "poster_path": "/first.jpg"},
                {"id": 2, "poster_path": "/second.jpg"}
            ]
        })))
        .mount(&server)
        .await;

    let poster = tmdb(&server)
        .search_poster("A Newport Christmas", 2025)
        .await
        .unwrap();
    assert_eq!(poster.as_deref(), Some("https://image.test/t/p/w500/first.jpg"));
}

#[tokio::test]
async fn search_without_poster_or_results_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("year", "2025"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 1, "poster_path": null}, {"id": 2, "poster_path": "/later.jpg"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("year", "2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let client = tmdb(&server);
    assert_eq!(client.search_poster("Tidings", 2025).await.unwrap(), None);
    assert_eq!(client.search_poster("Tidings", 2024).await.unwrap(), None);
}

#[tokio::test]
async fn search_error_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let err = tmdb(&server).search_poster("Anything", 2025).await.unwrap_err();
    assert!(format!("{err:#}").contains("401"));
}

#[tokio::test]
async fn id_lookups_resolve_posters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/1535223"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1535223, "poster_path": "/p.jpg"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/find/tt36364046"))
        .and(query_param("external_source", "imdb_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "movie_results": [{"id": 1535223}],
            "tv_results": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/find/tt0000001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"movie_results": []})))
        .mount(&server)
        .await;

    let client = tmdb(&server);
    assert_eq!(
        client.movie_poster(1535223).await.unwrap().as_deref(),
        Some("https://image.test/t/p/w500/p.jpg")
    );
    assert_eq!(client.find_imdb("TT36364046").await.unwrap(), Some(1535223));
    assert_eq!(client.find_imdb("tt0000001").await.unwrap(), None);
    assert!(client.find_imdb("not-an-id").await.is_err());
}

#[tokio::test]
async fn publish_posts_merge_variables() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/custom_plugins/plugin-uuid"))
        .and(body_partial_json(json!({
            "merge_variables": {
                "season": "2025 Countdown to Christmas",
                "movies": [{"title": "Holiday Touchdown", "date": "2025-12-06"}]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(trmnl(&server).publish("plugin-uuid", &view()).await);
}

#[tokio::test]
async fn publish_reports_rejection_as_false() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/custom_plugins/plugin-uuid"))
        .respond_with(ResponseTemplate::new(422).set_body_string("payload too large"))
        .mount(&server)
        .await;

    assert!(!trmnl(&server).publish("plugin-uuid", &view()).await);
}

#[tokio::test]
async fn publish_to_unreachable_host_is_false() {
    let server = MockServer::start().await;
    let client = trmnl(&server);
    drop(server);
    assert!(!client.publish("plugin-uuid", &view()).await);
}

#[tokio::test]
async fn current_screen_sends_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/current_screen"))
        .and(header("access-token", "device-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "refresh_rate": 900,
            "image_url": "https://trmnl.test/screen.bmp",
            "filename": "plugin-1"
        })))
        .mount(&server)
        .await;

    let screen = trmnl(&server).current_screen("device-key").await.unwrap();
    assert_eq!(screen.refresh_rate, Some(900));
    assert_eq!(screen.filename.as_deref(), Some("plugin-1"));
}
