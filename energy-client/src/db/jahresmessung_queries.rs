use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::domain::{PlantMeteringIdentity, WerkId};

/// Create a minimal `Jahresmessung` table if none exists.
///
/// The table is normally maintained outside this workspace; only the import
/// tooling calls this.
pub async fn ensure_jahresmessung_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS Jahresmessung (
            Jahr               INTEGER NOT NULL,
            Institut           TEXT,
            "Messstellen-ID"   INTEGER NOT NULL,
            "Rech.Empf.-ID"    INTEGER,
            Letztverbraucher   TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// The `Jahresmessung` row with the highest `Jahr` for a Werk, if any.
///
/// Columns are cast explicitly: externally loaded tables (e.g. via the
/// sqlite3 `.import` command) store every value as TEXT.
pub async fn latest_identity(
    pool: &SqlitePool,
    werk_id: WerkId,
) -> Result<Option<PlantMeteringIdentity>, sqlx::Error> {
    sqlx::query_as::<_, PlantMeteringIdentity>(
        r#"
        SELECT
            CAST("Messstellen-ID" AS INTEGER)                   AS metering_station_id,
            CAST(Institut AS TEXT)                              AS institute,
            CAST(NULLIF(TRIM("Rech.Empf.-ID"), '') AS INTEGER)  AS billing_recipient_id,
            CAST(Letztverbraucher AS TEXT)                      AS end_consumer,
            CAST(Jahr AS INTEGER)                               AS year
        FROM Jahresmessung
        WHERE CAST("Messstellen-ID" AS INTEGER) = ?
        ORDER BY CAST(Jahr AS INTEGER) DESC
        LIMIT 1
        "#,
    )
    .bind(werk_id.get())
    .fetch_optional(pool)
    .await
}

/// Insert a batch of identity rows with a single statement.
pub async fn insert_identities(
    pool: &SqlitePool,
    rows: &[PlantMeteringIdentity],
) -> Result<u64, sqlx::Error> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"INSERT INTO Jahresmessung (Jahr, Institut, "Messstellen-ID", "Rech.Empf.-ID", Letztverbraucher) "#,
    );

    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.year)
            .push_bind(row.institute.clone())
            .push_bind(row.metering_station_id)
            .push_bind(row.billing_recipient_id)
            .push_bind(row.end_consumer.clone());
    });

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    fn identity(station: i64, year: i64, institute: &str) -> PlantMeteringIdentity {
        PlantMeteringIdentity {
            metering_station_id: station,
            institute: Some(institute.to_string()),
            billing_recipient_id: Some(4711),
            end_consumer: Some("Werk Nord".to_string()),
            year,
        }
    }

    #[tokio::test]
    async fn latest_identity_picks_highest_year() {
        let pool = memory_pool().await;
        ensure_jahresmessung_table(&pool).await.unwrap();

        let rows = vec![
            identity(1, 2021, "Institut A"),
            identity(1, 2023, "Institut C"),
            identity(1, 2022, "Institut B"),
            identity(2, 2024, "Institut X"),
        ];
        assert_eq!(insert_identities(&pool, &rows).await.unwrap(), 4);

        let latest = latest_identity(&pool, WerkId(1)).await.unwrap().unwrap();
        assert_eq!(latest.year, 2023);
        assert_eq!(latest.institute.as_deref(), Some("Institut C"));
        assert_eq!(latest.werk_id(), WerkId(1));
    }

    #[tokio::test]
    async fn latest_identity_is_none_for_unknown_werk() {
        let pool = memory_pool().await;
        ensure_jahresmessung_table(&pool).await.unwrap();

        assert!(latest_identity(&pool, WerkId(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_identity_reads_text_typed_columns() {
        let pool = memory_pool().await;
        sqlx::query(
            r#"CREATE TABLE Jahresmessung (
                   Jahr TEXT, Institut TEXT, "Messstellen-ID" TEXT,
                   "Rech.Empf.-ID" TEXT, Letztverbraucher TEXT
               )"#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            r#"INSERT INTO Jahresmessung VALUES
                   ('2023', 'Netz', '1', '4711', 'Werk'),
                   ('999', 'Netz Alt', '1', '', 'Werk'),
                   ('2024', 'Netz Neu', '1', '', 'Werk')"#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let latest = latest_identity(&pool, WerkId(1)).await.unwrap().unwrap();

        assert_eq!(latest.year, 2024);
        assert_eq!(latest.metering_station_id, 1);
        assert_eq!(latest.institute.as_deref(), Some("Netz Neu"));
        assert_eq!(latest.billing_recipient_id, None);
    }
}
