use energy_client::domain::NewQuarterlyReport;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Range checks applied on top of presence and type checks.
///
/// Off by default: submissions with a quarter outside 1..=4 or negative
/// consumption are accepted unless `strict_ranges` is set.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub strict_ranges: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing fields in body")]
    MissingField { field: &'static str },
    #[error("quarter, year, electricity, gas must be numbers")]
    InvalidNumber { field: &'static str },
    #[error("{reason}")]
    OutOfRange { reason: &'static str },
}

const REQUIRED: [&str; 4] = ["quarter", "year", "electricity", "gas"];

/// Pure validation of a raw report submission.
///
/// Rules:
/// - quarter, year, electricity and gas must be present and non-null.
/// - each must coerce to a finite number; quarter and year must be integral.
/// - a body that is not a JSON object counts as empty.
pub fn validate_submission(
    body: &Value,
    rules: &ValidationRules,
) -> Result<NewQuarterlyReport, ValidationError> {
    let empty = Map::new();
    let fields = body.as_object().unwrap_or(&empty);

    // Presence is checked for all fields before any coercion.
    for name in REQUIRED {
        if matches!(fields.get(name), None | Some(Value::Null)) {
            return Err(ValidationError::MissingField { field: name });
        }
    }

    let quarter = integer_field(fields, "quarter")?;
    let year = integer_field(fields, "year")?;
    let electricity = number_field(fields, "electricity")?;
    let gas = number_field(fields, "gas")?;

    if rules.strict_ranges {
        if !(1..=4).contains(&quarter) {
            return Err(ValidationError::OutOfRange {
                reason: "quarter must be between 1 and 4",
            });
        }
        if electricity < 0.0 || gas < 0.0 {
            return Err(ValidationError::OutOfRange {
                reason: "electricity and gas must be non-negative",
            });
        }
    }

    let gas_supplier = match fields.get("gasSupplier") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    Ok(NewQuarterlyReport {
        quarter,
        year,
        electricity,
        gas,
        gas_supplier,
    })
}

fn number_field(fields: &Map<String, Value>, name: &'static str) -> Result<f64, ValidationError> {
    fields
        .get(name)
        .and_then(coerce_number)
        .ok_or(ValidationError::InvalidNumber { field: name })
}

fn integer_field(fields: &Map<String, Value>, name: &'static str) -> Result<i64, ValidationError> {
    let n = number_field(fields, name)?;
    if n.fract() != 0.0 || n < i64::MIN as f64 || n > i64::MAX as f64 {
        return Err(ValidationError::InvalidNumber { field: name });
    }
    Ok(n as i64)
}

/// Numbers pass through, strings are trimmed and parsed as decimals.
/// Everything else, including empty strings, is not a number.
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        // Stricter than loose JS-style coercion: `true`/`false` are not read
        // as 1/0, and arrays or objects never unwrap to a number.
        _ => return None,
    };

    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lenient() -> ValidationRules {
        ValidationRules::default()
    }

    fn strict() -> ValidationRules {
        ValidationRules { strict_ranges: true }
    }

    #[test]
    fn accepts_valid_submission() {
        let body = json!({
            "quarter": 2,
            "year": 2024,
            "electricity": 1500.5,
            "gas": 800,
            "gasSupplier": "GasNetz GmbH"
        });

        let report = validate_submission(&body, &lenient()).unwrap();
        assert_eq!(
            report,
            NewQuarterlyReport {
                quarter: 2,
                year: 2024,
                electricity: 1500.5,
                gas: 800.0,
                gas_supplier: Some("GasNetz GmbH".to_string()),
            }
        );
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let body = json!({ "quarter": "3", "year": " 2023 ", "electricity": "12.25", "gas": "0" });

        let report = validate_submission(&body, &lenient()).unwrap();
        assert_eq!(report.quarter, 3);
        assert_eq!(report.year, 2023);
        assert_eq!(report.electricity, 12.25);
        assert_eq!(report.gas, 0.0);
        assert_eq!(report.gas_supplier, None);
    }

    #[test]
    fn each_missing_field_is_reported() {
        for name in REQUIRED {
            let mut body = json!({ "quarter": 1, "year": 2024, "electricity": 1.0, "gas": 1.0 });
            body.as_object_mut().unwrap().remove(name);

            let res = validate_submission(&body, &lenient());
            assert_eq!(res, Err(ValidationError::MissingField { field: name }));
        }
    }

    #[test]
    fn null_counts_as_missing() {
        let body = json!({ "quarter": 1, "year": null, "electricity": 1.0, "gas": 1.0 });
        let res = validate_submission(&body, &lenient());
        assert_eq!(res, Err(ValidationError::MissingField { field: "year" }));
    }

    #[test]
    fn missing_wins_over_invalid() {
        let body = json!({ "quarter": "abc", "year": 2024, "electricity": 1.0 });
        let res = validate_submission(&body, &lenient());
        assert_eq!(res, Err(ValidationError::MissingField { field: "gas" }));
    }

    #[test]
    fn non_object_body_is_all_missing() {
        let res = validate_submission(&json!([1, 2, 3]), &lenient());
        assert!(matches!(res, Err(ValidationError::MissingField { .. })));
    }

    #[test]
    fn non_numeric_text_is_invalid() {
        let body = json!({ "quarter": 1, "year": 2024, "electricity": "abc", "gas": 1.0 });
        let res = validate_submission(&body, &lenient());
        assert_eq!(res, Err(ValidationError::InvalidNumber { field: "electricity" }));
    }

    #[test]
    fn empty_string_is_invalid_not_missing() {
        let body = json!({ "quarter": "", "year": 2024, "electricity": 1.0, "gas": 1.0 });
        let res = validate_submission(&body, &lenient());
        assert_eq!(res, Err(ValidationError::InvalidNumber { field: "quarter" }));
    }

    #[test]
    fn booleans_and_non_finite_text_are_invalid() {
        let body = json!({ "quarter": 1, "year": 2024, "electricity": true, "gas": 1.0 });
        assert!(matches!(
            validate_submission(&body, &lenient()),
            Err(ValidationError::InvalidNumber { field: "electricity" })
        ));

        let body = json!({ "quarter": 1, "year": 2024, "electricity": 1.0, "gas": "inf" });
        assert!(matches!(
            validate_submission(&body, &lenient()),
            Err(ValidationError::InvalidNumber { field: "gas" })
        ));
    }

    #[test]
    fn fractional_quarter_is_invalid() {
        let body = json!({ "quarter": 1.5, "year": 2024, "electricity": 1.0, "gas": 1.0 });
        let res = validate_submission(&body, &lenient());
        assert_eq!(res, Err(ValidationError::InvalidNumber { field: "quarter" }));
    }

    #[test]
    fn lenient_mode_accepts_out_of_range_values() {
        let body = json!({ "quarter": 7, "year": -3, "electricity": -10.0, "gas": -0.5 });

        let report = validate_submission(&body, &lenient()).unwrap();
        assert_eq!(report.quarter, 7);
        assert_eq!(report.electricity, -10.0);
    }

    #[test]
    fn strict_mode_rejects_quarter_outside_year() {
        let body = json!({ "quarter": 5, "year": 2024, "electricity": 1.0, "gas": 1.0 });
        let res = validate_submission(&body, &strict());
        assert!(matches!(res, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn strict_mode_rejects_negative_consumption() {
        let body = json!({ "quarter": 1, "year": 2024, "electricity": 1.0, "gas": -1.0 });
        let res = validate_submission(&body, &strict());
        assert!(matches!(res, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn non_string_supplier_is_rendered_as_text() {
        let body = json!({ "quarter": 1, "year": 2024, "electricity": 1.0, "gas": 1.0, "gasSupplier": 42 });
        let report = validate_submission(&body, &lenient()).unwrap();
        assert_eq!(report.gas_supplier.as_deref(), Some("42"));
    }
}
