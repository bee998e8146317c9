// Server module entry point
// Accept loop and per-connection serving

mod listener;

pub use listener::create_reusable_listener;

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept connections forever, one spawned task per connection.
///
/// Accept errors are logged and the loop continues; nothing here can
/// take the process down once the listener is bound.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                handle_connection(stream, peer_addr, Arc::clone(&state));
            }
            Err(e) => logger::log_accept_error(&e),
        }
    }
}

/// Serve a single connection in a spawned task.
///
/// Malformed HTTP is rejected by hyper at the connection level; the
/// resulting error is logged and only that task ends.
fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let state = Arc::clone(&state);
            async move { handler::handle_request(req, state, peer_addr).await }
        });

        let conn = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(io, service);

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
