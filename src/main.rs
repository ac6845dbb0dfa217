use fitness_tracker::{activate_live_dashboard, load_data, router, AppState, Config, SyncBus};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let data = load_data(&config.data_path).await;
    let bus = SyncBus::new();
    let state = AppState::new(config.data_path.clone(), data, bus.clone(), config.window_days);

    let live = activate_live_dashboard(
        &bus,
        Arc::clone(&state.data),
        config.refresh_interval,
        config.window_days,
    );
    let app = router(state.with_live_dashboard(live.watch()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        refresh_secs = config.refresh_interval.as_secs(),
        data_path = %config.data_path.display(),
        "listening on http://{addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    live.deactivate();
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
