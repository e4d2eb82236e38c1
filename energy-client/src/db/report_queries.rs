use sqlx::SqlitePool;

use crate::domain::{NewQuarterlyReport, QuarterlyReportRow, WerkId};

/// Create the `QuarterlyReport` table if it does not exist yet.
pub async fn ensure_quarterly_report_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS QuarterlyReport (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            werkId        INTEGER NOT NULL,
            quarter       INTEGER NOT NULL,
            year          INTEGER NOT NULL,
            electricity   REAL    NOT NULL,
            gas           REAL    NOT NULL,
            submissionIso TEXT    NOT NULL,
            gasSupplier   TEXT    NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert one report and return its generated id.
pub async fn insert_quarterly_report(
    pool: &SqlitePool,
    werk_id: WerkId,
    report: &NewQuarterlyReport,
    submission_iso: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO QuarterlyReport
            (werkId, quarter, year, electricity, gas, submissionIso, gasSupplier)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(werk_id.get())
    .bind(report.quarter)
    .bind(report.year)
    .bind(report.electricity)
    .bind(report.gas)
    .bind(submission_iso)
    .bind(report.gas_supplier.as_deref().unwrap_or(""))
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All reports of one Werk, most recent period first.
pub async fn reports_for_werk(
    pool: &SqlitePool,
    werk_id: WerkId,
) -> Result<Vec<QuarterlyReportRow>, sqlx::Error> {
    sqlx::query_as::<_, QuarterlyReportRow>(
        r#"
        SELECT
            id,
            werkId        AS werk_id,
            quarter,
            year,
            electricity,
            gas,
            submissionIso AS submission_iso,
            gasSupplier   AS gas_supplier
        FROM QuarterlyReport
        WHERE werkId = ?
        ORDER BY year DESC, quarter DESC, id DESC
        "#,
    )
    .bind(werk_id.get())
    .fetch_all(pool)
    .await
}
