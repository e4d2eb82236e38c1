use energy_client::{
    db::report_queries,
    domain::{DecodeError, NewQuarterlyReport, QuarterlyReport, WerkId},
};
use sqlx::SqlitePool;
use time::{Duration, OffsetDateTime};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to format submission timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Persistence of quarterly reports, keyed by Werk.
#[derive(Clone)]
pub struct ReportStore {
    pool: SqlitePool,
}

impl ReportStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensure the backing table exists. Safe to call repeatedly; existing
    /// rows are left untouched.
    pub async fn init(&self) -> Result<(), StoreError> {
        report_queries::ensure_quarterly_report_table(&self.pool).await?;
        Ok(())
    }

    /// Persist a validated report, stamping it with the current UTC second.
    pub async fn create(
        &self,
        werk_id: WerkId,
        report: &NewQuarterlyReport,
    ) -> Result<QuarterlyReport, StoreError> {
        let now = OffsetDateTime::now_utc();
        let submitted_at = now - Duration::nanoseconds(i64::from(now.nanosecond()));

        let mut persisted = QuarterlyReport {
            id: 0,
            werk_id,
            quarter: report.quarter,
            year: report.year,
            electricity: report.electricity,
            gas: report.gas,
            gas_supplier: report.gas_supplier.clone().unwrap_or_default(),
            submitted_at,
        };
        let submission_iso = persisted.submission_iso()?;

        persisted.id =
            report_queries::insert_quarterly_report(&self.pool, werk_id, report, &submission_iso)
                .await?;

        tracing::debug!(
            werk_id = %werk_id,
            report_id = persisted.id,
            quarter = persisted.quarter,
            year = persisted.year,
            "quarterly report stored"
        );

        Ok(persisted)
    }

    /// All reports of a Werk ordered by (year, quarter, id), newest first.
    pub async fn list_by_werk(&self, werk_id: WerkId) -> Result<Vec<QuarterlyReport>, StoreError> {
        let rows = report_queries::reports_for_werk(&self.pool, werk_id).await?;

        rows.into_iter()
            .map(|row| QuarterlyReport::try_from(row).map_err(StoreError::from))
            .collect()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
