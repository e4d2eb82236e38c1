use std::sync::Arc;

use anyhow::Result;
use reporting_service::{
    api::{self, AppState},
    config::AppConfig,
    db,
    lookup::IdentityLookup,
    metrics_server,
    observability,
    shutdown,
    store::ReportStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let db_path = cfg.database.path.display().to_string();
    let pool = db::connect(&cfg.database).await.inspect_err(|e| {
        tracing::error!(error = %e, path = %db_path, "failed to open SQLite database");
    })?;
    tracing::info!(path = %db_path, "SQLite connected");

    // Schema check runs once here, never per request.
    let store = ReportStore::new(pool.clone());
    store.init().await?;

    let state = AppState {
        store: store.clone(),
        lookup: IdentityLookup::new(pool),
        rules: cfg.validation,
        werk_label: Arc::from(cfg.werk.label.as_str()),
    };
    let app = api::create_router(state);

    let bind_addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "API ready");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    store.close().await;
    tracing::info!("database closed");

    Ok(())
}
