//! Routes: the rendered page, forced refresh, JSON list and health.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use marquee_core::MovieRecord;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::error::AppResult;
use crate::page;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/refresh", get(refresh))
        .route("/api/movies", get(movies))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let movies = state.service.movies(false).await?;
    Ok(Html(page::render(&movies)))
}

async fn refresh(State(state): State<AppState>) -> AppResult<Html<String>> {
    tracing::info!("forced refresh requested");
    let movies = state.service.movies(true).await?;
    Ok(Html(page::render(&movies)))
}

#[derive(Debug, Default, Deserialize)]
struct MoviesQuery {
    #[serde(default)]
    refresh: bool,
}

async fn movies(
    State(state): State<AppState>,
    Query(query): Query<MoviesQuery>,
) -> AppResult<Json<Vec<MovieRecord>>> {
    let movies = state.service.movies(query.refresh).await?;
    Ok(Json(movies))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use marquee_core::{AppConfig, save_snapshot};
    use marquee_enrich::{FileListing, RepertoireService};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    const PAGE: &str = r#"<html><body>
        <div class="filmlist__info--inverted"><span rv-text="item.title">Z listy</span></div>
    </body></html>"#;

    /// Sources point at a closed port, so every lookup fails fast.
    fn state(dir: &Path, cached: &[MovieRecord]) -> AppState {
        let mut config = AppConfig::default();
        config.omdb.api_key = Some("test-key".to_string());
        config.omdb.base_url = "http://127.0.0.1:1".to_string();
        config.filmweb.search_url = "http://127.0.0.1:1/search/live".to_string();
        config.filmweb.api_url = "http://127.0.0.1:1/api".to_string();
        config.http.timeout_secs = 2;
        config.cache.snapshot_path = dir.join("movies.json").to_string_lossy().into_owned();

        if !cached.is_empty() {
            save_snapshot(&config.snapshot_path(), cached).unwrap();
        }

        let page_path = dir.join("page.html");
        std::fs::write(&page_path, PAGE).unwrap();
        let service =
            RepertoireService::with_listing(&config, Box::new(FileListing::new(page_path))).unwrap();
        AppState {
            service: Arc::new(service),
        }
    }

    fn cached_movie() -> MovieRecord {
        let mut movie = MovieRecord::new("Z cache");
        movie.rating.set_imdb(7.7);
        movie
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_body(router(state(dir.path(), &[])), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn test_index_serves_fresh_snapshot() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_body(router(state(dir.path(), &[cached_movie()])), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Z cache"));
        assert!(!body.contains("Z listy"));
    }

    #[tokio::test]
    async fn test_refresh_ignores_snapshot() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_body(router(state(dir.path(), &[cached_movie()])), "/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Z listy"));
        assert!(!body.contains("Z cache"));
    }

    #[tokio::test]
    async fn test_api_movies_json() {
        let dir = TempDir::new().unwrap();
        let app = router(state(dir.path(), &[cached_movie()]));

        let (status, body) = get_body(app.clone(), "/api/movies").await;
        assert_eq!(status, StatusCode::OK);
        let movies: Vec<MovieRecord> = serde_json::from_str(&body).unwrap();
        assert_eq!(movies[0].title, "Z cache");
        assert_eq!(movies[0].rating.imdb(), 7.7);

        let (_, body) = get_body(app, "/api/movies?refresh=true").await;
        let movies: Vec<MovieRecord> = serde_json::from_str(&body).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Z listy");
    }

    #[tokio::test]
    async fn test_listing_failure_is_500() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.omdb.api_key = Some("test-key".to_string());
        config.cache.snapshot_path = dir.path().join("movies.json").to_string_lossy().into_owned();
        let service = RepertoireService::with_listing(
            &config,
            Box::new(FileListing::new(dir.path().join("missing.html"))),
        )
        .unwrap();
        let app = router(AppState {
            service: Arc::new(service),
        });

        let (status, body) = get_body(app, "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("listing error"));
    }
}
