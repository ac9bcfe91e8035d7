//! Prometheus scrape endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::metrics::{collect_process_metrics, PROMETHEUS_CONTENT_TYPE};

pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => {
            collect_process_metrics();
            (
                [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
                handle.render(),
            )
                .into_response()
        }
        None => {
            tracing::error!("Error generating metrics: recorder not installed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate metrics" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_missing_registry_is_500() {
        let mut state = AppState::local(AppConfig::default()).unwrap();
        state.prometheus = None;

        let response = get_metrics(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_renders_text_format() {
        let state = AppState::local(AppConfig::default()).unwrap();
        let response = get_metrics(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            PROMETHEUS_CONTENT_TYPE
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.lines().any(|line| line.starts_with("process_")));
    }
}
