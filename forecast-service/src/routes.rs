use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use meter_client::domain::{ForecastPoint, Reading, SignalType};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{error::ForecastError, pipeline::ForecastPipeline};

pub fn router(pipeline: ForecastPipeline) -> Router {
    Router::new()
        .route("/current-data", get(current_data))
        .route("/voltage-data", get(voltage_data))
        .route("/kilowatt-data", get(kilowatt_data))
        .route("/forecast", get(forecast))
        .route("/healthz", get(healthz))
        .with_state(pipeline)
}

/// Query string of the reading endpoints. A `type` parameter is accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "meter_ID")]
    pub meter_id: i64,
    pub time_period: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "meterID")]
    pub meter_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub time_period: String,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct ReadingRecord {
    pub meter: i64,
    pub data: ReadingData,
}

#[derive(Debug, Serialize)]
pub struct ReadingData {
    pub value: f64,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Reading> for ReadingRecord {
    fn from(r: Reading) -> Self {
        ReadingRecord {
            meter: r.meter,
            data: ReadingData {
                value: r.value,
                created_at: r.ts,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastRecord {
    pub meter: i64,
    pub data: ForecastData,
}

/// `value` is the carried actual, `yhat` the forecast; `createdAt` and `ds`
/// both hold the forecast timestamp.
#[derive(Debug, Serialize)]
pub struct ForecastData {
    pub value: f64,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub yhat: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub ds: OffsetDateTime,
}

impl From<ForecastPoint> for ForecastRecord {
    fn from(p: ForecastPoint) -> Self {
        ForecastRecord {
            meter: p.meter,
            data: ForecastData {
                value: p.actual_value,
                created_at: p.ts,
                yhat: p.forecast_value,
                ds: p.ts,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

pub fn status_for(e: &ForecastError) -> StatusCode {
    match e {
        ForecastError::InvalidPeriod(_)
        | ForecastError::InvalidSignal(_)
        | ForecastError::InvalidTimestamp { .. } => StatusCode::BAD_REQUEST,
        ForecastError::NoDataFound { .. } => StatusCode::NOT_FOUND,
        ForecastError::ForecastUnavailable(_) | ForecastError::StorageUnavailable(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ForecastError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<DataResponse<T>>, ForecastError>;

async fn readings(
    pipeline: &ForecastPipeline,
    signal: SignalType,
    q: ReadingsQuery,
) -> ApiResult<ReadingRecord> {
    let records = pipeline
        .run_windowed_fetch(signal, q.meter_id, &q.start_time, &q.end_time, &q.time_period)
        .await?;

    Ok(Json(DataResponse {
        data: records.into_iter().map(ReadingRecord::from).collect(),
    }))
}

async fn current_data(
    State(pipeline): State<ForecastPipeline>,
    Query(q): Query<ReadingsQuery>,
) -> ApiResult<ReadingRecord> {
    readings(&pipeline, SignalType::Current, q).await
}

async fn voltage_data(
    State(pipeline): State<ForecastPipeline>,
    Query(q): Query<ReadingsQuery>,
) -> ApiResult<ReadingRecord> {
    readings(&pipeline, SignalType::Voltage, q).await
}

async fn kilowatt_data(
    State(pipeline): State<ForecastPipeline>,
    Query(q): Query<ReadingsQuery>,
) -> ApiResult<ReadingRecord> {
    readings(&pipeline, SignalType::Power, q).await
}

async fn forecast(
    State(pipeline): State<ForecastPipeline>,
    Query(q): Query<ForecastQuery>,
) -> ApiResult<ForecastRecord> {
    let points = pipeline
        .run_forecast_by_type(&q.kind, q.meter_id, &q.start_date, &q.end_date, &q.time_period)
        .await?;

    Ok(Json(DataResponse {
        data: points.into_iter().map(ForecastRecord::from).collect(),
    }))
}

async fn healthz() -> &'static str {
    "ok"
}
