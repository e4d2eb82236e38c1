use crate::pipeline::{Envelope, PipelineError, Transform};
use energy_client::domain::PlantMeteringIdentity;

const MIN_YEAR: i64 = 1990;
const MAX_YEAR: i64 = 2100;

/// Pure validation of an imported `Jahresmessung` row.
///
/// Rules:
/// - Jahr must be within [1990, 2100].
/// - Messstellen-ID must be positive.
pub fn validate_identity(
    env: Envelope<PlantMeteringIdentity>,
) -> Result<Envelope<PlantMeteringIdentity>, PipelineError> {
    let m = &env.payload;

    if !(MIN_YEAR..=MAX_YEAR).contains(&m.year) {
        return Err(PipelineError::Rejected(format!(
            "Jahr {} out of allowed range for Messstelle {}",
            m.year, m.metering_station_id
        )));
    }

    if m.metering_station_id <= 0 {
        return Err(PipelineError::Rejected(
            "Messstellen-ID must be positive".to_string(),
        ));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct JahresmessungValidation;

#[async_trait::async_trait]
impl Transform<PlantMeteringIdentity> for JahresmessungValidation {
    async fn apply(
        &self,
        input: Envelope<PlantMeteringIdentity>,
    ) -> Result<Envelope<PlantMeteringIdentity>, PipelineError> {
        validate_identity(input).inspect_err(|_| {
            metrics::counter!("validation_jahresmessung_rejected_total").increment(1);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(station: i64, year: i64) -> Envelope<PlantMeteringIdentity> {
        Envelope::new(PlantMeteringIdentity {
            metering_station_id: station,
            institute: Some("Stadtwerke".to_string()),
            billing_recipient_id: None,
            end_consumer: None,
            year,
        })
    }

    #[test]
    fn accepts_valid_row() {
        assert!(validate_identity(identity(1, 2024)).is_ok());
    }

    #[test]
    fn rejects_implausible_year() {
        let res = validate_identity(identity(1, 1850));
        assert!(matches!(res, Err(PipelineError::Rejected(_))));
    }

    #[test]
    fn rejects_non_positive_station() {
        let res = validate_identity(identity(0, 2024));
        assert!(matches!(res, Err(PipelineError::Rejected(_))));
    }
}
