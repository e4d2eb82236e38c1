pub mod metering_identity;
pub mod quarterly_report;

pub use metering_identity::PlantMeteringIdentity;
pub use quarterly_report::{
    DecodeError, NewQuarterlyReport, QuarterlyReport, QuarterlyReportRow, WerkId, SUBMISSION_FORMAT,
};
