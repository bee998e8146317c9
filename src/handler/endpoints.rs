//! Endpoint handlers
//!
//! The registered JSON endpoints and their payload types.

use chrono::Utc;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::RequestContext;
use crate::http;
use crate::routing::RouteTable;

/// Greeting returned by `GET /`
pub const WELCOME_MESSAGE: &str = "Welcome to the City Price Planner API!";

/// Two-field response envelope used by the greeting and error bodies.
///
/// Created fresh per request and discarded after serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: String,
    pub message: String,
}

impl Envelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Payload reported by `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthPayload {
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub uptime_secs: u64,
}

/// Register all endpoints; called once while building `AppState`
pub fn build_routes() -> RouteTable {
    RouteTable::new()
        .register(Method::GET, "/", greeting)
        .register(Method::GET, "/health", health)
}

fn greeting(_ctx: &RequestContext) -> Response<Full<Bytes>> {
    http::json_response(StatusCode::OK, &Envelope::success(WELCOME_MESSAGE))
}

fn health(ctx: &RequestContext) -> Response<Full<Bytes>> {
    let payload = HealthPayload {
        status: "OK".to_string(),
        message: "City Price Planner API is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        uptime_secs: ctx.state.uptime_secs(),
    };
    http::json_response(StatusCode::OK, &payload)
}
