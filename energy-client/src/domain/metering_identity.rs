use super::WerkId;

/// Latest identity metadata for a Werk, taken from one `Jahresmessung` row.
///
/// The Werk is keyed by its metering-station id (`"Messstellen-ID"`), so
/// `metering_station_id` doubles as the Werk reference.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PlantMeteringIdentity {
    pub metering_station_id: i64,
    pub institute: Option<String>,
    pub billing_recipient_id: Option<i64>,
    pub end_consumer: Option<String>,
    pub year: i64,
}

impl PlantMeteringIdentity {
    pub fn werk_id(&self) -> WerkId {
        WerkId(self.metering_station_id)
    }
}
