use anyhow::{bail, Result};
use energy_client::{db::jahresmessung_queries, domain::PlantMeteringIdentity};
use reporting_service::{
    config::AppConfig,
    db,
    observability,
    pipeline::Pipeline,
    sinks::SqliteJahresmessungSink,
    sources::JahresmessungCsvFileSource,
    transform,
};
use std::{env, sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: import_jahresmessung <csv_file_path>");
    }
    let file_path = &args[1];

    // Same config as the API server, so DB_PATH points both at one file.
    let cfg = AppConfig::load()?;

    let pool = db::connect(&cfg.database).await?;
    jahresmessung_queries::ensure_jahresmessung_table(&pool).await?;

    let import_cfg = &cfg.import;
    let sink = SqliteJahresmessungSink::new(
        pool.clone(),
        import_cfg.batch_size,
        import_cfg.max_retries,
        Duration::from_millis(import_cfg.retry_backoff_ms),
    );

    let source = JahresmessungCsvFileSource::new(file_path);

    let pipeline: Pipeline<_, PlantMeteringIdentity, _> = Pipeline {
        source,
        transforms: vec![Arc::new(transform::JahresmessungValidation)],
        sink,
    };

    let summary = pipeline.run().await?;
    tracing::info!(
        imported_rows = summary.written,
        skipped_rows = summary.skipped,
        file = %file_path,
        "jahresmessung import finished"
    );

    pool.close().await;
    Ok(())
}
