//! Request handler module
//!
//! Entry point for HTTP request processing, responsible for method
//! validation, route dispatch, and access logging.

pub mod endpoints;

pub use endpoints::{build_routes, Envelope};

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::RouteOutcome;

/// Request context passed to endpoint handlers
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub state: &'a AppState,
}

/// Main entry point for HTTP request handling.
///
/// Generic over the body type: the body itself is never read, only its
/// declared length is checked.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let mut entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&req, peer_addr));

    let response = dispatch(&req, &state);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0) as usize;
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Select and run the handler for a request
fn dispatch<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    let method = req.method();
    let path = req.uri().path();

    // 1. CORS preflight: answered only when CORS is enabled and the
    //    path is registered; otherwise OPTIONS falls through to the
    //    route table and gets the usual 405/404
    if *method == Method::OPTIONS && state.config.http.enable_cors {
        let methods = state.routes.methods_for(path);
        if !methods.is_empty() {
            let allow = format!("{}, OPTIONS", methods.join(", "));
            return http::build_options_response(&allow);
        }
    }

    // 2. Reject declared bodies above the configured bound
    if let Some(resp) = check_body_size(req, state.config.http.max_body_size) {
        return resp;
    }

    // 3. Route lookup and handler execution
    match state.routes.lookup(method, path) {
        RouteOutcome::Matched(route) => {
            let ctx = RequestContext { path, state };
            (route.handler)(&ctx)
        }
        RouteOutcome::MethodNotAllowed { allow } => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            http::build_405_response(&allow)
        }
        RouteOutcome::NotFound => http::build_404_response(path),
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Build the access log entry from request data; status and body size
/// are filled in once the response is built
fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0".to_string(),
        Version::HTTP_2 => "2".to_string(),
        _ => "1.1".to_string(),
    };
    entry.referer = header_string(req, "referer");
    entry.user_agent = header_string(req, "user-agent");
    entry
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, HttpConfig, LoggingConfig, ServerConfig};
    use crate::handler::endpoints::{HealthPayload, WELCOME_MESSAGE};
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn test_state() -> Arc<AppState> {
        test_state_with_cors(false)
    }

    fn test_state_with_cors(enable_cors: bool) -> Arc<AppState> {
        Arc::new(AppState::new(Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            http: HttpConfig {
                enable_cors,
                max_body_size: 1024,
            },
        }))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:41234".parse().unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_get_root_returns_success_envelope() {
        let resp = handle_request(request(Method::GET, "/"), test_state(), peer())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );

        let body = body_bytes(resp).await;
        let envelope: Envelope = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope.status, "success");
        assert_eq!(envelope.message, WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn test_get_root_is_idempotent() {
        let state = test_state();
        let first = handle_request(request(Method::GET, "/"), Arc::clone(&state), peer())
            .await
            .unwrap();
        let second = handle_request(request(Method::GET, "/"), state, peer())
            .await
            .unwrap();

        assert_eq!(first.status(), second.status());
        assert_eq!(body_bytes(first).await, body_bytes(second).await);
    }

    #[tokio::test]
    async fn test_non_get_on_root_is_405() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let resp = handle_request(request(method.clone(), "/"), test_state(), peer())
                .await
                .unwrap();

            assert_eq!(
                resp.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "unexpected status for {method}"
            );
            assert_eq!(resp.headers().get("Allow").unwrap(), "GET");

            let body = body_bytes(resp).await;
            let envelope: Envelope = serde_json::from_slice(&body).unwrap();
            assert_eq!(envelope.status, "error");
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let resp = handle_request(request(Method::GET, "/api/cities"), test_state(), peer())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = body_bytes(resp).await;
        let envelope: Envelope = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope.status, "error");
        assert_eq!(envelope.message, "Route /api/cities not found");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let resp = handle_request(request(Method::GET, "/health"), test_state(), peer())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_bytes(resp).await;
        let payload: HealthPayload = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.status, "OK");
        assert_eq!(payload.message, "City Price Planner API is running");
    }

    #[tokio::test]
    async fn test_options_without_cors_falls_through_to_routing() {
        let resp = handle_request(request(Method::OPTIONS, "/"), test_state(), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get("Allow").unwrap(), "GET");

        let resp = handle_request(request(Method::OPTIONS, "/nonexistent"), test_state(), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_options_preflight_with_cors() {
        let state = test_state_with_cors(true);

        let resp = handle_request(request(Method::OPTIONS, "/"), Arc::clone(&state), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers().get("Allow").unwrap(), "GET, OPTIONS");
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );

        // Preflight for an unregistered path still gets a 404
        let resp = handle_request(request(Method::OPTIONS, "/nonexistent"), state, peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_identical_envelope() {
        let state = test_state();
        let expected =
            serde_json::to_vec(&Envelope::success(WELCOME_MESSAGE)).unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..100 {
            let state = Arc::clone(&state);
            tasks.spawn(async move {
                let resp = handle_request(request(Method::GET, "/"), state, peer())
                    .await
                    .unwrap();
                (resp.status(), body_bytes(resp).await)
            });
        }

        while let Some(result) = tasks.join_next().await {
            let (status, body) = result.unwrap();
            assert_eq!(status, StatusCode::OK);
            assert_eq!(&body[..], &expected[..]);
        }
    }

    #[tokio::test]
    async fn test_oversized_content_length_is_413() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-length", "2048")
            .body(())
            .unwrap();
        let resp = handle_request(req, test_state(), peer()).await.unwrap();

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
