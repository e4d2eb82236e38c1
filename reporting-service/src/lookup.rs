use energy_client::{
    db::jahresmessung_queries,
    domain::{PlantMeteringIdentity, WerkId},
};
use sqlx::SqlitePool;

#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("Werk not found")]
    NotFound(WerkId),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Read-only resolution of Werk identity metadata from `Jahresmessung`.
#[derive(Clone)]
pub struct IdentityLookup {
    pool: SqlitePool,
}

impl IdentityLookup {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The most recent (highest `Jahr`) identity row for the Werk.
    pub async fn resolve(&self, werk_id: WerkId) -> Result<PlantMeteringIdentity, LookupError> {
        jahresmessung_queries::latest_identity(&self.pool, werk_id)
            .await?
            .ok_or(LookupError::NotFound(werk_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn resolves_latest_year() {
        let pool = memory_pool().await;
        jahresmessung_queries::ensure_jahresmessung_table(&pool).await.unwrap();
        sqlx::query(
            r#"INSERT INTO Jahresmessung (Jahr, Institut, "Messstellen-ID", "Rech.Empf.-ID", Letztverbraucher)
               VALUES (2022, 'Stadtwerke Alt', 1, 100, 'Werk 1'),
                      (2024, 'Stadtwerke Neu', 1, 200, 'Werk 1'),
                      (2023, 'Stadtwerke Mitte', 1, 150, 'Werk 1')"#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let identity = IdentityLookup::new(pool).resolve(WerkId(1)).await.unwrap();

        assert_eq!(identity.year, 2024);
        assert_eq!(identity.institute.as_deref(), Some("Stadtwerke Neu"));
        assert_eq!(identity.billing_recipient_id, Some(200));
    }

    #[tokio::test]
    async fn unknown_werk_is_not_found() {
        let pool = memory_pool().await;
        jahresmessung_queries::ensure_jahresmessung_table(&pool).await.unwrap();

        let res = IdentityLookup::new(pool).resolve(WerkId(3)).await;
        assert!(matches!(res, Err(LookupError::NotFound(WerkId(3)))));
    }
}
