use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use energy_client::domain::{PlantMeteringIdentity, QuarterlyReport, WerkId};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    lookup::{IdentityLookup, LookupError},
    store::{ReportStore, StoreError},
    validation::{validate_submission, ValidationError, ValidationRules},
};

/// Shared, explicitly owned request context.
#[derive(Clone)]
pub struct AppState {
    pub store: ReportStore,
    pub lookup: IdentityLookup,
    pub rules: ValidationRules,
    pub werk_label: Arc<str>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/werk/:id", get(get_werk))
        .route("/api/werk/:id/reports", get(list_reports))
        .route("/api/werk/:id/report", post(submit_report))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Legacy path-id handling: anything that is not a non-zero integer falls
/// back to Werk 1 instead of being rejected.
pub fn coerce_werk_id(raw: &str) -> WerkId {
    let trimmed = raw.trim();
    let parsed = trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64)
            .map(|n| n as i64)
    });

    match parsed {
        Some(id) if id != 0 => WerkId(id),
        _ => {
            tracing::debug!(raw, "unusable werk id in path, falling back to 1");
            WerkId(1)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WerkResponse {
    pub werk: String,
    pub institut: Option<String>,
    pub messstellen_id: i64,
    pub rechnungsempfaenger_id: Option<i64>,
    pub end_consumer: Option<String>,
}

impl WerkResponse {
    fn new(label: &str, identity: PlantMeteringIdentity) -> Self {
        Self {
            werk: label.to_string(),
            messstellen_id: identity.werk_id().get(),
            institut: identity.institute,
            rechnungsempfaenger_id: identity.billing_recipient_id,
            end_consumer: identity.end_consumer,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: i64,
    pub quarter: i64,
    pub year: i64,
    pub electricity: f64,
    pub gas: f64,
    pub submission_date: String,
    pub gas_supplier: String,
}

impl TryFrom<QuarterlyReport> for ReportResponse {
    type Error = StoreError;

    fn try_from(r: QuarterlyReport) -> Result<Self, Self::Error> {
        Ok(Self {
            submission_date: r.submission_iso()?,
            id: r.id,
            quarter: r.quarter,
            year: r.year,
            electricity: r.electricity,
            gas: r.gas,
            gas_supplier: r.gas_supplier,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Werk not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<LookupError> for ApiError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::NotFound(_) => ApiError::NotFound,
            LookupError::Database(e) => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(e) => {
                tracing::debug!(error = ?e, "report submission rejected");
                metrics::counter!("report_submissions_rejected_total").increment(1);
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => {
                metrics::counter!("werk_lookup_not_found_total").increment(1);
                StatusCode::NOT_FOUND
            }
            ApiError::Storage(_) | ApiError::Database(_) => {
                tracing::error!(error = %self, "storage fault while handling request");
                metrics::counter!("report_storage_errors_total").increment(1);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn get_werk(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WerkResponse>, ApiError> {
    let werk_id = coerce_werk_id(&raw_id);
    let identity = state.lookup.resolve(werk_id).await?;

    Ok(Json(WerkResponse::new(&state.werk_label, identity)))
}

async fn list_reports(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportResponse>>, ApiError> {
    let werk_id = coerce_werk_id(&raw_id);
    let reports = state.store.list_by_werk(werk_id).await?;

    let body = reports
        .into_iter()
        .map(ReportResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(body))
}

async fn submit_report(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ReportResponse>), ApiError> {
    metrics::counter!("report_submissions_total").increment(1);

    let werk_id = coerce_werk_id(&raw_id);
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable report body, treating as empty");
            Value::Null
        }
    };

    let report = validate_submission(&body, &state.rules)?;
    let created = state.store.create(werk_id, &report).await?;

    tracing::info!(
        werk_id = %werk_id,
        report_id = created.id,
        quarter = created.quarter,
        year = created.year,
        "quarterly report submitted"
    );

    Ok((StatusCode::CREATED, Json(ReportResponse::try_from(created)?)))
}
