//! HTTP route table.
//!
//! Only `GET /healthz` is served; every other method or path falls through to
//! a 404. The router is wrapped so that every request runs inside a
//! request-id span and a panicking handler becomes a 500 instead of tearing
//! down the connection task.

pub mod health;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::HEALTH_PATH;
use crate::error::{not_found, panic_response};
use crate::middleware::request_id_layer;

/// Liveness probe responses must never be served from a cache
const CACHE_CONTROL_HEALTH: &str = "no-store";

fn health_routes() -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health::healthz).fallback(not_found))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ))
}

/// Creates the router serving only the health endpoint.
pub fn create_router() -> Router {
    build_router(Router::new())
}

/// Creates the router with `extra` routes merged next to the health endpoint.
///
/// `extra` must not define its own fallback; unmatched requests get the 404.
pub fn build_router(extra: Router) -> Router {
    health_routes()
        .merge(extra)
        .fallback(not_found)
        // Panic recovery sits inside the request span so the 500 is logged with its request_id
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_id_layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, http::HeaderMap, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    #[tokio::test]
    async fn test_healthz_returns_ok_json() {
        let (status, headers, body) = send(create_router(), Method::GET, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"ok":true}"#);
        assert_eq!(headers[http::header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[CACHE_CONTROL], "no-store");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_paths_return_404() {
        for path in ["/", "/foo", "/healthz/extra", "/health", "/HEALTHZ"] {
            let (status, _, _) = send(create_router(), Method::GET, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn test_other_methods_on_healthz_return_404() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let (status, _, body) = send(create_router(), method.clone(), "/healthz").await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
            assert_eq!(body, br#"{"error":"not found"}"#);
        }
    }

    #[tokio::test]
    async fn test_panicking_handler_returns_500() {
        async fn explode() -> &'static str {
            panic!("handler exploded")
        }

        let router = build_router(Router::new().route("/explode", get(explode)));
        let (status, headers, _) = send(router.clone(), Method::GET, "/explode").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[http::header::CONNECTION], "close");

        let (status, _, _) = send(router, Method::GET, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_ids_are_unique() {
        let (_, first, _) = send(create_router(), Method::GET, "/healthz").await;
        let (_, second, _) = send(create_router(), Method::GET, "/nope").await;
        assert_ne!(first["x-request-id"], second["x-request-id"]);
    }
}
