//! Route definitions for the Pinegate web server

use crate::{handlers, AppState};
use axum::{
    routing::get,
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health_check))
}

/// Create the access-management routes
pub fn access_routes() -> Router<AppState> {
    Router::new()
        .route("/validate/{username}", get(handlers::validate_username))
        .route(
            "/access/{username}",
            get(handlers::get_access)
                .post(handlers::grant_access)
                .delete(handlers::revoke_access),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_app, WebConfig};
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use pinegate_core::PinegateConfig;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        AppState::with_platform_config(WebConfig::default(), PinegateConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check_route() {
        let app = create_app(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_grant_rejects_unrecognized_duration_unit() {
        let app = create_app(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/access/alice")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"pine_ids":["PUB;1"],"duration":"3X"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_grant_rejects_missing_duration() {
        let app = create_app(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/access/alice")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"pine_ids":["PUB;1"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = create_app(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
