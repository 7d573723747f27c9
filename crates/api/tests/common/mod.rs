#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tower::ServiceExt;

use trackval_api::config::ServerConfig;
use trackval_api::router::build_app_router;
use trackval_api::state::{AppState, Registry};
use trackval_core::ffmpeg::FfmpegChunkSource;
use trackval_core::segmentation::NoSegmentation;

pub const EXPERIMENT: &str = "FlyHostel1/5X/2023-05-23_14-00-00";
pub const EXPERIMENT_SLUG: &str = "FlyHostel1_5X_2023-05-23_14-00-00";

/// Build a test `ServerConfig` rooted at `videos_root`, with warm-up disabled.
pub fn test_config(videos_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        videos_root: videos_root.to_path_buf(),
        default_experiment: None,
        date_cutoff: "2023-05-23".to_string(),
        warm_chunk: None,
        chunk_extension: "mp4".to_string(),
        jpeg_quality: 50,
        db_max_connections: 2,
    }
}

/// Build the full application router over a registry rooted at `videos_root`.
pub fn build_test_app(videos_root: &Path) -> (Router, Arc<Registry>) {
    let config = test_config(videos_root);
    let registry = Arc::new(Registry::new(
        config.registry_config(),
        FfmpegChunkSource,
        Arc::new(NoSegmentation),
    ));
    let state = AppState {
        registry: Arc::clone(&registry),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), registry)
}

/// Seed an experiment without chunk files. Returns a writer pool.
pub async fn seed_experiment(videos_root: &Path, key: &str, with_config: bool) -> SqlitePool {
    let dir = videos_root.join(key);
    std::fs::create_dir_all(&dir).unwrap();
    let db_path = dir.join(format!("{}.db", key.replace('/', "_")));
    let options = SqliteConnectOptions::new().filename(&db_path).create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();

    for statement in [
        "CREATE TABLE METADATA (field TEXT PRIMARY KEY, value TEXT)",
        "CREATE TABLE ROI_0 (id INTEGER PRIMARY KEY, frame_number INTEGER, in_frame_index INTEGER, x INTEGER, y INTEGER, modified TEXT, area INTEGER)",
        "CREATE TABLE IDENTITY (id INTEGER PRIMARY KEY, frame_number INTEGER, in_frame_index INTEGER, local_identity INTEGER, identity INTEGER)",
        "CREATE TABLE CONCATENATION (id INTEGER PRIMARY KEY, chunk INTEGER, local_identity INTEGER, local_identity_after INTEGER, is_inferred INTEGER, is_broken INTEGER)",
        "CREATE TABLE AI (frame_number INTEGER PRIMARY KEY, ai TEXT)",
        "INSERT INTO METADATA (field, value) VALUES ('chunksize', '45000.0'), ('framerate', '150'), ('date_time', '1684850400')",
        "INSERT INTO ROI_0 (frame_number, in_frame_index, x, y, modified, area) VALUES (10, 0, 100, 200, 'False', 90), (10, 1, 300, 400, 'False', 95)",
        "INSERT INTO IDENTITY (frame_number, in_frame_index, local_identity, identity) VALUES (10, 0, 1, 2), (10, 1, 2, 0), (20, 0, 1, 1), (20, 1, 2, 2)",
        "INSERT INTO AI (frame_number, ai) VALUES (30, 'fight')",
    ] {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }

    if with_config {
        sqlx::query("INSERT INTO METADATA (field, value) VALUES ('idtrackerai_conf', $1)")
            .bind(r#"{"_number_of_animals": {"value": 2}, "_intensity": {"value": [0, 135]}, "_area": {"value": [80, 2000]}}"#)
            .execute(&pool)
            .await
            .unwrap();
    }
    pool
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
