//! Route table module
//!
//! Implements the immutable (method, path) -> handler registry and its
//! lookup semantics.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};

use crate::handler::RequestContext;

/// Handler function: produces the full response for a matched route
pub type HandlerFn = fn(&RequestContext) -> Response<Full<Bytes>>;

/// A single registered endpoint
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    pub handler: HandlerFn,
}

/// Immutable route registry, built once at startup
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

/// Result of a route lookup
pub enum RouteOutcome<'a> {
    /// Method and path both matched
    Matched(&'a Route),
    /// Path is registered but not for this method; `allow` lists the
    /// methods registered for the path
    MethodNotAllowed { allow: String },
    /// No route registered for this path
    NotFound,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a (method, path) pair; chainable during initialization
    #[must_use]
    pub fn register(mut self, method: Method, path: &'static str, handler: HandlerFn) -> Self {
        self.routes.push(Route {
            method,
            path,
            handler,
        });
        self
    }

    /// Select the handler for a request by exact method+path equality
    pub fn lookup(&self, method: &Method, path: &str) -> RouteOutcome<'_> {
        if let Some(route) = self
            .routes
            .iter()
            .find(|r| r.path == path && r.method == *method)
        {
            return RouteOutcome::Matched(route);
        }

        // Path known under a different method -> 405 with Allow header
        let allowed = self.methods_for(path);

        if allowed.is_empty() {
            RouteOutcome::NotFound
        } else {
            RouteOutcome::MethodNotAllowed {
                allow: allowed.join(", "),
            }
        }
    }

    /// Methods registered for a path, in registration order.
    /// Feeds the Allow header and the CORS preflight method list.
    pub fn methods_for(&self, path: &str) -> Vec<&str> {
        self.routes
            .iter()
            .filter(|r| r.path == path)
            .map(|r| r.method.as_str())
            .collect()
    }
}
