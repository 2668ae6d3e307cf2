//! Origin guard middleware.
//!
//! Requests whose `Origin` header is outside the allow list are refused
//! before any handler runs. Requests without `Origin` (curl, same-origin
//! navigation) pass.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CorsConfig;

pub async fn origin_guard(
    State(cors): State<Arc<CorsConfig>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let allowed = match req.headers().get(header::ORIGIN) {
        None => true,
        Some(origin) => origin.to_str().is_ok_and(|o| cors.is_allowed(o)),
    };
    if allowed {
        return next.run(req).await;
    }

    tracing::warn!(
        origin = ?req.headers().get(header::ORIGIN),
        path = %req.uri().path(),
        "Origin not allowed"
    );
    StatusCode::FORBIDDEN.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                Arc::new(CorsConfig::default()),
                origin_guard,
            ))
    }

    async fn status_for(origin: Option<&str>) -> (StatusCode, usize) {
        let mut builder = Request::builder().uri("/");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (status, body.len())
    }

    #[tokio::test]
    async fn test_allowed_and_absent_origins_pass() {
        assert_eq!(status_for(None).await.0, StatusCode::OK);
        assert_eq!(
            status_for(Some("http://localhost:3000")).await.0,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_foreign_origin_gets_empty_403() {
        assert_eq!(
            status_for(Some("https://evil.example")).await,
            (StatusCode::FORBIDDEN, 0)
        );
    }

    #[tokio::test]
    async fn test_origin_case_must_match_exactly() {
        assert_eq!(
            status_for(Some("http://LocalHost:3000")).await,
            (StatusCode::FORBIDDEN, 0)
        );
    }
}
