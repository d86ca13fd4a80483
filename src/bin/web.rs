//! fitcoach HTTP 服务
//!
//! 启动: cargo run --bin fitcoach-web --features web

use anyhow::Context;
use fitcoach::config::load_config;
use fitcoach::core::create_runner;
use fitcoach::integrations::http::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fitcoach::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let runner = create_runner(&cfg).context("Failed to build runner")?;
    let app = router(AppState::new(runner));

    let addr = cfg.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("{} listening on http://{}", cfg.app.name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("Server error")?;
    Ok(())
}
