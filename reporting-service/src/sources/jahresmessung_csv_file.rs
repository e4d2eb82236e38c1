use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use energy_client::domain::PlantMeteringIdentity;

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// CSV export of the annual-measurement dataset.
///
/// Expected header columns (by name):
/// - Jahr
/// - Messstellen-ID
/// - Institut (optional)
/// - Rech.Empf.-ID (optional)
/// - Letztverbraucher (optional)
///
/// Other columns are ignored.
pub struct JahresmessungCsvFileSource {
    path: PathBuf,
}

impl JahresmessungCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_optional_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_required_i64(name: &str, s: &str) -> Result<i64, PipelineError> {
    s.trim()
        .parse()
        .map_err(|e| PipelineError::Record(format!("invalid {name} '{s}': {e}")))
}

pub(crate) fn record_to_identity(
    record: &StringRecord,
    headers: &StringRecord,
) -> Result<PlantMeteringIdentity, PipelineError> {
    let get = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
            .and_then(|idx| record.get(idx))
    };
    let require = |name: &str| -> Result<&str, PipelineError> {
        get(name)
            .ok_or_else(|| PipelineError::Record(format!("missing column '{name}' in CSV record")))
    };

    let year = parse_required_i64("Jahr", require("Jahr")?)?;
    let metering_station_id = parse_required_i64("Messstellen-ID", require("Messstellen-ID")?)?;

    let billing_recipient_id = match get("Rech.Empf.-ID").and_then(parse_optional_string) {
        Some(raw) => Some(parse_required_i64("Rech.Empf.-ID", &raw)?),
        None => None,
    };

    Ok(PlantMeteringIdentity {
        metering_station_id,
        institute: get("Institut").and_then(parse_optional_string),
        billing_recipient_id,
        end_consumer: get("Letztverbraucher").and_then(parse_optional_string),
        year,
    })
}

#[async_trait::async_trait]
impl Source<PlantMeteringIdentity> for JahresmessungCsvFileSource {
    async fn stream(&self) -> EnvelopeStream<PlantMeteringIdentity> {
        // Blocking CSV reads inside one task; exports are small.
        let path = self.path.clone();
        let s = async_stream::stream! {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::SourceUnavailable(format!(
                        "failed to open CSV file {}: {e}",
                        path.display()
                    )));
                    return;
                }
            };
            let mut rdr = csv::Reader::from_reader(file);
            let headers = match rdr.headers() {
                Ok(h) => h.clone(),
                Err(e) => {
                    yield Err(PipelineError::SourceUnavailable(format!(
                        "failed to read CSV headers: {e}"
                    )));
                    return;
                }
            };

            for result in rdr.records() {
                let item = result
                    .map_err(|e| PipelineError::Record(format!("failed to read CSV record: {e}")))
                    .and_then(|record| record_to_identity(&record, &headers));

                if item.is_err() {
                    metrics::counter!("jahresmessung_csv_parse_errors_total").increment(1);
                }

                yield item.map(Envelope::new);
            }
        };

        Box::pin(s)
    }
}
