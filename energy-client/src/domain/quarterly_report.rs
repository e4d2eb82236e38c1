use std::fmt;

use time::{
    format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};

/// `YYYY-MM-DDTHH:MM:SS`, the layout of `submissionIso` on disk and
/// `submissionDate` on the wire.
pub const SUBMISSION_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Identifier of a Werk (plant / metering point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WerkId(pub i64);

impl WerkId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for WerkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated submission that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuarterlyReport {
    pub quarter: i64,
    pub year: i64,
    /// MWh
    pub electricity: f64,
    /// MWh
    pub gas: f64,
    pub gas_supplier: Option<String>,
}

/// A persisted quarterly consumption report.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlyReport {
    pub id: i64,
    pub werk_id: WerkId,
    pub quarter: i64,
    pub year: i64,
    pub electricity: f64,
    pub gas: f64,
    pub gas_supplier: String,
    pub submitted_at: OffsetDateTime,
}

impl QuarterlyReport {
    /// Submission time rendered in [`SUBMISSION_FORMAT`].
    pub fn submission_iso(&self) -> Result<String, time::error::Format> {
        self.submitted_at.format(SUBMISSION_FORMAT)
    }
}

/// Raw `QuarterlyReport` row as stored in SQLite.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuarterlyReportRow {
    pub id: i64,
    pub werk_id: i64,
    pub quarter: i64,
    pub year: i64,
    pub electricity: f64,
    pub gas: f64,
    pub submission_iso: String,
    pub gas_supplier: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("report {id}: invalid submission timestamp '{value}': {source}")]
    Timestamp {
        id: i64,
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

impl TryFrom<QuarterlyReportRow> for QuarterlyReport {
    type Error = DecodeError;

    fn try_from(row: QuarterlyReportRow) -> Result<Self, Self::Error> {
        let submitted_at = PrimitiveDateTime::parse(&row.submission_iso, SUBMISSION_FORMAT)
            .map_err(|source| DecodeError::Timestamp {
                id: row.id,
                value: row.submission_iso.clone(),
                source,
            })?
            .assume_utc();

        Ok(QuarterlyReport {
            id: row.id,
            werk_id: WerkId(row.werk_id),
            quarter: row.quarter,
            year: row.year,
            electricity: row.electricity,
            gas: row.gas,
            gas_supplier: row.gas_supplier.unwrap_or_default(),
            submitted_at,
        })
    }
}
