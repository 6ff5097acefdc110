//! voltrek-server binary: wires the session manager, command service,
//! broadcast hub, and background tasks into an axum HTTP/WebSocket
//! server, grounded on the teacher's `main.rs`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use voltrek_core::ConfigRegistry;

use voltrek_server::command::CommandService;
use voltrek_server::config::ServerConfig;
use voltrek_server::http::{self, AppState};
use voltrek_server::hub::BroadcastHub;
use voltrek_server::session::{FsPersistence, SessionManager};
use voltrek_server::tasks::{run_cleanup_loop, run_reconcile_loop};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("voltrek_server=info".parse().unwrap())
                .add_directive("tower_http=info".parse().unwrap()),
        )
        .init();

    tracing::info!("starting voltrek-server");

    let config = ServerConfig::from_env();

    let registry = Arc::new(ConfigRegistry::new(config.configs_dir.clone()));
    let persistence = Arc::new(FsPersistence::new(config.sessions_dir.clone()));
    let sessions = Arc::new(SessionManager::load(persistence, registry.clone()).await);
    let hub = Arc::new(BroadcastHub::new(config.hub_queue_cap));
    let commands = Arc::new(CommandService::new(
        sessions.clone(),
        hub.clone(),
        registry.clone(),
        config.max_bulk_moves,
    ));

    let cancel = CancellationToken::new();
    tokio::spawn(run_cleanup_loop(
        sessions.clone(),
        config.cleanup_tick,
        config.retention,
        cancel.clone(),
    ));
    tokio::spawn(run_reconcile_loop(sessions.clone(), config.reconcile_tick, cancel.clone()));

    let state = AppState {
        commands,
        registry,
        hub,
        ws_idle_timeout: config.http_idle_timeout,
    };
    let app = http::build_router(state, config.http_read_timeout, config.http_write_timeout);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
    cancel.cancel();
}
