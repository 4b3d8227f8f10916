//! FPL Tracker HTTP API
//!
//! HTTP layer built with Axum. Pages are static HTML files that fetch the
//! JSON API; admin pages post plain HTML forms back to the page routes.
//!
//! # Endpoints
//!
//! ## Pages
//! - `GET /`, `GET /players`, `GET /scores` - Static pages
//! - `GET /static/*` - Scripts and styles
//!
//! ## Form submissions (admin, 303 back to the page)
//! - `POST /players` - Add a player
//! - `POST /players/:id` - Rename a player
//! - `POST /players/:id/delete`, `DELETE /players/:id` - Remove a player
//! - `POST /scores` - Enter a gameweek for every player
//! - `POST /scores/:id` - Edit a score
//! - `POST /scores/:id/delete`, `DELETE /scores/:id` - Remove a score
//!
//! ## JSON
//! - `GET /api/players`, `POST /api/players` (admin)
//! - `GET /api/players/:id`, `PUT`/`DELETE /api/players/:id` (admin)
//! - `GET /api/scores`, `POST /api/scores/bulk` (admin)
//! - `GET /api/scores/:id`, `PUT`/`DELETE /api/scores/:id` (admin)
//! - `GET /api/dashboard`, `GET /api/standings`
//! - `GET /api/export/scores.csv`
//! - `GET /api/session`
//!
//! ## Auth
//! - `GET /login` - Prompt for credentials, then redirect home
//! - `GET /logout-clear` - Make the browser forget credentials
//!
//! ## Health
//! - `GET /health/live`, `GET /health/ready`, `GET /health`
//!
//! # Example
//!
//! ```rust,ignore
//! use fpl_tracker::api::{serve, AppState};
//! use fpl_tracker::config::Config;
//! use fpl_tracker::storage::Store;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(Store::open(&config.database)?);
//!
//!     let state = AppState::new(store, config.auth.clone(), config.server.clone());
//!     serve(state, &config.server).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, get_service, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::ServerConfig;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let static_dir = Path::new(&state.server.static_dir).to_path_buf();
    let page = |name: &str| get_service(ServeFile::new(static_dir.join(name)));

    let api_routes = Router::new()
        // Player routes
        .route(
            "/players",
            get(routes::players::list_players).post(routes::players::create_player),
        )
        .route(
            "/players/:id",
            get(routes::players::get_player)
                .put(routes::players::update_player)
                .delete(routes::players::delete_player),
        )
        // Score routes
        .route("/scores", get(routes::scores::list_scores))
        .route("/scores/bulk", post(routes::scores::bulk_scores))
        .route(
            "/scores/:id",
            get(routes::scores::get_score)
                .put(routes::scores::update_score)
                .delete(routes::scores::delete_score),
        )
        // Dashboard routes
        .route("/dashboard", get(routes::dashboard::dashboard))
        .route("/standings", get(routes::dashboard::standings))
        // Export routes
        .route("/export/scores.csv", get(routes::export::export_scores_csv))
        // Auth context for the pages
        .route("/session", get(auth::session));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.server.cors_origins);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        // Pages, with the admin forms posting back to them
        .route("/", page("index.html"))
        .route(
            "/players",
            page("players.html").post(routes::players::create_player_form),
        )
        .route(
            "/players/:id",
            post(routes::players::update_player_form)
                .delete(routes::players::delete_player_form),
        )
        .route(
            "/players/:id/delete",
            post(routes::players::delete_player_form),
        )
        .route(
            "/scores",
            page("scores.html").post(routes::scores::bulk_scores_form),
        )
        .route(
            "/scores/:id",
            post(routes::scores::update_score_form).delete(routes::scores::delete_score_form),
        )
        .route("/scores/:id/delete", post(routes::scores::delete_score_form))
        .route("/login", get(auth::login))
        .route("/logout-clear", get(auth::logout_clear))
        .nest_service("/static", ServeDir::new(&static_dir))
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS policy from the configured origins.
///
/// An empty list allows no cross-origin requests; `"*"` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

/// Start the HTTP server
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("FPL Tracker listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("FPL Tracker shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::storage::{Store, MAX_WEEK_POINTS};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    const USER: &str = "admin";
    const PASS: &str = "s3cret";

    fn create_test_app() -> (Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Dashboard</h1>").unwrap();
        std::fs::write(dir.path().join("players.html"), "<h1>Players</h1>").unwrap();
        std::fs::write(dir.path().join("scores.html"), "<h1>Scores</h1>").unwrap();
        std::fs::write(dir.path().join("app.css"), "body {}").unwrap();

        let server = ServerConfig {
            static_dir: dir.path().to_string_lossy().into_owned(),
            ..ServerConfig::default()
        };
        let store = Arc::new(Store::open_in_memory().unwrap());
        let state = AppState::new(store, AuthConfig::new(USER, PASS), server);

        (build_router(state), dir)
    }

    fn basic_auth() -> String {
        format!("Basic {}", BASE64.encode(format!("{}:{}", USER, PASS)))
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn admin_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", basic_auth())
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn admin_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", basic_auth())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn create_player(app: &Router, name: &str, team: &str) -> i64 {
        let response = send(
            app,
            admin_json("POST", "/api/players", json!({"name": name, "team": team})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (app, _dir) = create_test_app();

        assert_eq!(send(&app, get("/health/live")).await.status(), StatusCode::OK);
        assert_eq!(send(&app, get("/health/ready")).await.status(), StatusCode::OK);

        let response = send(&app, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_pages_and_assets_are_served() {
        let (app, _dir) = create_test_app();

        let response = send(&app, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<h1>Dashboard</h1>");

        let response = send(&app, get("/scores")).await;
        assert_eq!(body_text(response).await, "<h1>Scores</h1>");

        let response = send(&app, get("/static/app.css")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_writes_require_admin() {
        let (app, _dir) = create_test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/players")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"name": "Sam", "team": "Red Devils"}"#))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"FPL Tracker\""
        );

        let request = Request::builder()
            .method("POST")
            .uri("/players")
            .header("Authorization", format!("Basic {}", BASE64.encode("admin:wrong")))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from("name=Sam&team=Red+Devils"))
            .unwrap();
        assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);

        let players = body_json(send(&app, get("/api/players")).await).await;
        assert_eq!(players["total"], 0);
    }

    #[tokio::test]
    async fn test_player_form_flow() {
        let (app, _dir) = create_test_app();

        let response = send(&app, admin_form("/players", "name=Sam&team=Red+Devils")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/players");

        let players = body_json(send(&app, get("/api/players")).await).await;
        assert_eq!(players["total"], 1);
        assert_eq!(players["players"][0]["team"], "Red Devils");
        let id = players["players"][0]["id"].as_i64().unwrap();

        let response = send(
            &app,
            admin_form(&format!("/players/{}", id), "name=Samuel&team=Blues"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let player = body_json(send(&app, get(&format!("/api/players/{}", id))).await).await;
        assert_eq!(player["name"], "Samuel");

        let response = send(&app, admin_form(&format!("/players/{}/delete", id), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = send(&app, get(&format!("/api/players/{}", id))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_player_name_is_rejected() {
        let (app, _dir) = create_test_app();

        let response = send(
            &app,
            admin_json("POST", "/api/players", json!({"name": "  ", "team": "Blues"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_form_skips_blank_rows() {
        let (app, _dir) = create_test_app();
        let sam = create_player(&app, "Sam", "Red Devils").await;
        let alex = create_player(&app, "Alex", "Blues").await;

        let form = format!(
            "gameweek=3&week_points_{sam}=60&week_cost_{sam}=4&week_points_{alex}=&week_cost_{alex}=",
        );
        let response = send(&app, admin_form("/scores", &form)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/scores");

        let scores = body_json(send(&app, get("/api/scores?gameweek=3")).await).await;
        assert_eq!(scores["total"], 1);
        assert_eq!(scores["scores"][0]["net_points"], 56);
        assert_eq!(scores["max_gameweek"], 3);
        assert_eq!(scores["next_gameweek"], 4);

        // Resubmitting the same gameweek overwrites instead of duplicating
        let form = format!("gameweek=3&week_points_{sam}=70&week_cost_{sam}=0");
        send(&app, admin_form("/scores", &form)).await;

        let scores = body_json(send(&app, get("/api/scores")).await).await;
        assert_eq!(scores["total"], 1);
        assert_eq!(scores["scores"][0]["week_points"], 70);
    }

    #[tokio::test]
    async fn test_score_filters_are_lenient() {
        let (app, _dir) = create_test_app();
        let sam = create_player(&app, "Sam", "Red Devils").await;

        let response = send(
            &app,
            admin_json(
                "POST",
                "/api/scores/bulk",
                json!({"gameweek": 1, "entries": [{"player_id": sam, "week_points": 50}]}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"gameweek": 1, "created": 1, "updated": 0})
        );

        let scores = body_json(send(&app, get("/api/scores?player_id=&gameweek=abc")).await).await;
        assert_eq!(scores["total"], 1);
        assert!(scores["gameweek"].is_null());
    }

    #[tokio::test]
    async fn test_bulk_with_unknown_player_is_not_found() {
        let (app, _dir) = create_test_app();

        let response = send(
            &app,
            admin_json(
                "POST",
                "/api/scores/bulk",
                json!({"gameweek": 1, "entries": [{"player_id": 99, "week_points": 50}]}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_points_are_rejected() {
        let (app, _dir) = create_test_app();
        let sam = create_player(&app, "Sam", "T").await;
        let alex = create_player(&app, "Alex", "T").await;
        let huge = i64::MAX / 2 + 1;

        let response = send(
            &app,
            admin_json(
                "POST",
                "/api/scores/bulk",
                json!({
                    "gameweek": 1,
                    "entries": [
                        {"player_id": sam, "week_points": huge},
                        {"player_id": alex, "week_points": huge}
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");

        let response = send(
            &app,
            admin_json(
                "POST",
                "/api/scores/bulk",
                json!({
                    "gameweek": 1,
                    "entries": [{"player_id": sam, "week_points": 50, "week_cost": MAX_WEEK_POINTS + 1}]
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let scores = body_json(send(&app, get("/api/scores")).await).await;
        assert_eq!(scores["total"], 0);

        let response = send(&app, get("/api/dashboard")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_score_writes_require_admin() {
        let (app, _dir) = create_test_app();
        let sam = create_player(&app, "Sam", "Red Devils").await;

        send(
            &app,
            admin_json(
                "POST",
                "/api/scores/bulk",
                json!({"gameweek": 1, "entries": [{"player_id": sam, "week_points": 60}]}),
            ),
        )
        .await;
        let before = body_json(send(&app, get("/api/scores")).await).await;
        assert_eq!(before["total"], 1);
        let score_id = before["scores"][0]["id"].as_i64().unwrap();

        let bulk = Request::builder()
            .method("POST")
            .uri("/api/scores/bulk")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({"gameweek": 1, "entries": [{"player_id": sam, "week_points": 5}]})
                    .to_string(),
            ))
            .unwrap();
        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/api/scores/{}", score_id))
            .body(Body::empty())
            .unwrap();
        let form_delete = Request::builder()
            .method("POST")
            .uri(format!("/scores/{}/delete", score_id))
            .header("Authorization", format!("Basic {}", BASE64.encode("admin:wrong")))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::empty())
            .unwrap();

        for request in [bulk, delete, form_delete] {
            let uri = request.uri().to_string();
            let response = send(&app, request).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }

        let after = body_json(send(&app, get("/api/scores")).await).await;
        assert_eq!(after["scores"], before["scores"]);
        assert_eq!(after["scores"][0]["week_points"], 60);
    }

    #[tokio::test]
    async fn test_deleting_score_updates_dashboard() {
        let (app, _dir) = create_test_app();
        let sam = create_player(&app, "Sam", "Red Devils").await;

        for (gameweek, points) in [(1, 60), (2, 40)] {
            send(
                &app,
                admin_json(
                    "POST",
                    "/api/scores/bulk",
                    json!({
                        "gameweek": gameweek,
                        "entries": [{"player_id": sam, "week_points": points, "week_cost": 0}]
                    }),
                ),
            )
            .await;
        }

        let dashboard = body_json(send(&app, get("/api/dashboard")).await).await;
        assert_eq!(dashboard["overall"]["labels"], json!([1, 2]));
        assert_eq!(dashboard["overall"]["datasets"][0]["data"], json!([60, 100]));
        assert_eq!(dashboard["standings"][0]["net_points"], 100);

        let scores = body_json(send(&app, get("/api/scores?gameweek=2")).await).await;
        let score_id = scores["scores"][0]["id"].as_i64().unwrap();

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/scores/{}", score_id))
            .header("Authorization", basic_auth())
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, request).await.status(), StatusCode::NO_CONTENT);

        let dashboard = body_json(send(&app, get("/api/dashboard")).await).await;
        assert_eq!(dashboard["overall"]["labels"], json!([1]));
        assert_eq!(dashboard["standings"][0]["net_points"], 60);
    }

    #[tokio::test]
    async fn test_score_update_conflict() {
        let (app, _dir) = create_test_app();
        let sam = create_player(&app, "Sam", "Red Devils").await;

        for gameweek in [1, 2] {
            send(
                &app,
                admin_json(
                    "POST",
                    "/api/scores/bulk",
                    json!({"gameweek": gameweek, "entries": [{"player_id": sam, "week_points": 10}]}),
                ),
            )
            .await;
        }

        let scores = body_json(send(&app, get("/api/scores?gameweek=2")).await).await;
        let score_id = scores["scores"][0]["id"].as_i64().unwrap();

        let response = send(
            &app,
            admin_json(
                "PUT",
                &format!("/api/scores/{}", score_id),
                json!({"player_id": sam, "gameweek": 1, "week_points": 10, "week_cost": 0}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_session_and_login() {
        let (app, _dir) = create_test_app();

        let anonymous = body_json(send(&app, get("/api/session")).await).await;
        assert_eq!(anonymous["is_admin"], false);

        let request = Request::builder()
            .uri("/api/session")
            .header("Authorization", basic_auth())
            .body(Body::empty())
            .unwrap();
        let session = body_json(send(&app, request).await).await;
        assert_eq!(session["is_admin"], true);
        assert_eq!(session["current_user"], USER);

        assert_eq!(send(&app, get("/login")).await.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/login")
            .header("Authorization", basic_auth())
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        let response = send(&app, get("/logout-clear")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_csv_export() {
        let (app, _dir) = create_test_app();
        let sam = create_player(&app, "Sam", "Red Devils").await;
        send(
            &app,
            admin_json(
                "POST",
                "/api/scores/bulk",
                json!({"gameweek": 1, "entries": [{"player_id": sam, "week_points": 55, "week_cost": 4}]}),
            ),
        )
        .await;

        let response = send(&app, get("/api/export/scores.csv")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv; charset=utf-8"
        );

        let body = body_text(response).await;
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("Sam,Red Devils,1,55,4,51,51"));
    }

    #[test]
    fn test_cors_layer_accepts_config_shapes() {
        let _ = cors_layer(&[]);
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }
}
