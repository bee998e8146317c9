// Routing module entry point
// Exact-match dispatch from (method, path) to registered handlers

mod matcher;

pub use matcher::{HandlerFn, Route, RouteOutcome, RouteTable};
