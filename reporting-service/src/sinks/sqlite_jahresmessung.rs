use std::time::Duration;

use energy_client::{db::jahresmessung_queries, domain::PlantMeteringIdentity};
use futures::StreamExt;
use sqlx::SqlitePool;

use crate::pipeline::{EnvelopeStream, ImportSummary, PipelineError, Sink};

/// Batched writer of imported identity rows into `Jahresmessung`.
pub struct SqliteJahresmessungSink {
    pool: SqlitePool,
    batch_size: usize,
    max_retries: u32,
    retry_backoff: Duration,
}

impl SqliteJahresmessungSink {
    pub fn new(
        pool: SqlitePool,
        batch_size: usize,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
            max_retries,
            retry_backoff,
        }
    }

    async fn flush_batch(&self, batch: &[PlantMeteringIdentity]) -> Result<u64, PipelineError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut attempt: u32 = 0;
        loop {
            match jahresmessung_queries::insert_identities(&self.pool, batch).await {
                Ok(inserted) => {
                    metrics::counter!("jahresmessung_imported_records_total").increment(inserted);
                    return Ok(inserted);
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let sleep_for = self.retry_backoff * attempt;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        "jahresmessung batch insert failed, retrying with backoff"
                    );
                    tokio::time::sleep(sleep_for).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "jahresmessung batch insert failed, giving up");
                    metrics::counter!("jahresmessung_sink_errors_total").increment(1);
                    return Err(PipelineError::Sink(e.to_string()));
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Sink<PlantMeteringIdentity> for SqliteJahresmessungSink {
    async fn run(
        &self,
        mut input: EnvelopeStream<PlantMeteringIdentity>,
    ) -> Result<ImportSummary, PipelineError> {
        let mut buffer: Vec<PlantMeteringIdentity> = Vec::with_capacity(self.batch_size);
        let mut summary = ImportSummary::default();

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, "jahresmessung import aborted");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping jahresmessung record");
                    summary.skipped += 1;
                    continue;
                }
            };

            buffer.push(env.payload);
            if buffer.len() >= self.batch_size {
                summary.written += self.flush_batch(&buffer).await?;
                buffer.clear();
            }
        }

        summary.written += self.flush_batch(&buffer).await?;
        Ok(summary)
    }
}
