use std::sync::Arc;

mod config;
mod handler;
mod http;
mod logger;
mod routing;
mod server;

fn main() {
    let cfg = match config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[FATAL] Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logger::init(&cfg) {
        eprintln!("[FATAL] Failed to initialize logger: {e}");
        std::process::exit(1);
    }

    // Worker thread count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = match runtime_builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("[FATAL] Failed to build runtime: {e}");
            std::process::exit(1);
        }
    };

    // Bind failure is the one fatal runtime error: log and terminate
    if let Err(e) = runtime.block_on(run(cfg)) {
        logger::log_error(&format!("Server failed to start: {e}"));
        std::process::exit(1);
    }
}

async fn run(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let listener = server::create_reusable_listener(addr).map_err(|e| {
        logger::log_bind_failed(&addr, &e);
        e
    })?;

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(config::AppState::new(cfg));
    server::serve(listener, state).await;

    Ok(())
}
