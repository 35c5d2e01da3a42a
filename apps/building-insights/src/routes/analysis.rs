use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{internal_error, AppError, AppResult};
use crate::services::analysis::air_quality::analyze_co2;
use crate::services::analysis::comfort::analyze_comfort;
use crate::services::analysis::compare::compare_periods;
use crate::services::analysis::occupancy::analyze_occupancy;
use crate::services::analysis::summary::summarize_data;
use crate::services::analysis::AnalysisOutcome;
use crate::services::document::MetricDocument;
use crate::services::store::{DateWindow, MetricStore, SensorTable};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WindowQuery {
    /// Inclusive lower bound (`YYYY-MM-DD` or a full timestamp).
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive upper bound; a bare date covers the whole day.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl WindowQuery {
    fn window(&self) -> AppResult<DateWindow> {
        DateWindow::parse(self.start_date.as_deref(), self.end_date.as_deref())
            .map_err(AppError::bad_request)
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompareQuery {
    #[serde(default)]
    pub period1_start: Option<String>,
    #[serde(default)]
    pub period1_end: Option<String>,
    #[serde(default)]
    pub period2_start: Option<String>,
    #[serde(default)]
    pub period2_end: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AnalysisResponse {
    /// Always `"success"`.
    pub status: String,
    pub data: MetricDocument,
}

/// Runs `f` against the store's table on the blocking pool; the first call may load the dataset.
pub(crate) async fn with_table<T, F>(store: Arc<MetricStore>, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&SensorTable) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(store.table()))
        .await
        .map_err(internal_error)
}

pub(crate) fn respond(outcome: AnalysisOutcome<MetricDocument>) -> AppResult<Json<AnalysisResponse>> {
    match outcome {
        AnalysisOutcome::Ready(data) => Ok(Json(AnalysisResponse {
            status: "success".to_string(),
            data,
        })),
        AnalysisOutcome::NoData(reason) => Err(AppError::not_found(reason)),
        AnalysisOutcome::Failed(reason) => Err(internal_error(reason)),
    }
}

#[utoipa::path(
    get,
    path = "/api/data-summary",
    tag = "analysis",
    params(WindowQuery),
    responses(
        (status = 200, description = "Dataset coverage summary", body = AnalysisResponse),
        (status = 400, description = "Invalid date bound", body = crate::error::ErrorBody),
        (status = 404, description = "No data available", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn data_summary(
    State(store): State<Arc<MetricStore>>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<AnalysisResponse>> {
    let window = query.window()?;
    let outcome = with_table(store, move |table| summarize_data(table, &window).into_document()).await?;
    respond(outcome)
}

#[utoipa::path(
    get,
    path = "/api/analysis/co2",
    tag = "analysis",
    params(WindowQuery),
    responses(
        (status = 200, description = "CO2 statistics, bands and insights", body = AnalysisResponse),
        (status = 400, description = "Invalid date bound", body = crate::error::ErrorBody),
        (status = 404, description = "No data available", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn co2_analysis(
    State(store): State<Arc<MetricStore>>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<AnalysisResponse>> {
    let window = query.window()?;
    let outcome = with_table(store, move |table| analyze_co2(table, &window).into_document()).await?;
    respond(outcome)
}

#[utoipa::path(
    get,
    path = "/api/analysis/occupancy",
    tag = "analysis",
    params(WindowQuery),
    responses(
        (status = 200, description = "Motion-derived occupancy patterns", body = AnalysisResponse),
        (status = 400, description = "Invalid date bound", body = crate::error::ErrorBody),
        (status = 404, description = "No data available", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn occupancy_analysis(
    State(store): State<Arc<MetricStore>>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<AnalysisResponse>> {
    let window = query.window()?;
    let outcome =
        with_table(store, move |table| analyze_occupancy(table, &window).into_document()).await?;
    respond(outcome)
}

#[utoipa::path(
    get,
    path = "/api/analysis/comfort",
    tag = "analysis",
    params(WindowQuery),
    responses(
        (status = 200, description = "Temperature and humidity comfort analysis", body = AnalysisResponse),
        (status = 400, description = "Invalid date bound", body = crate::error::ErrorBody),
        (status = 404, description = "No data available", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn comfort_analysis(
    State(store): State<Arc<MetricStore>>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<AnalysisResponse>> {
    let window = query.window()?;
    let outcome =
        with_table(store, move |table| analyze_comfort(table, &window).into_document()).await?;
    respond(outcome)
}

#[utoipa::path(
    get,
    path = "/api/analysis/compare",
    tag = "analysis",
    params(CompareQuery),
    responses(
        (status = 200, description = "Headline metrics for two periods and their deltas", body = AnalysisResponse),
        (status = 400, description = "Invalid date bound", body = crate::error::ErrorBody),
        (status = 404, description = "No data in either period", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn compare(
    State(store): State<Arc<MetricStore>>,
    Query(query): Query<CompareQuery>,
) -> AppResult<Json<AnalysisResponse>> {
    let first = DateWindow::parse(query.period1_start.as_deref(), query.period1_end.as_deref())
        .map_err(|err| AppError::bad_request(format!("period1 {err}")))?;
    let second = DateWindow::parse(query.period2_start.as_deref(), query.period2_end.as_deref())
        .map_err(|err| AppError::bad_request(format!("period2 {err}")))?;
    let outcome = with_table(store, move |table| {
        compare_periods(table, &first, &second).into_document()
    })
    .await?;
    respond(outcome)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data-summary", get(data_summary))
        .route("/analysis/co2", get(co2_analysis))
        .route("/analysis/occupancy", get(occupancy_analysis))
        .route("/analysis/comfort", get(comfort_analysis))
        .route("/analysis/compare", get(compare))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{state_with, test_state, CannedGenerator};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app() -> Router {
        router().with_state(test_state())
    }

    #[tokio::test]
    async fn co2_endpoint_returns_statistics() {
        let (status, body) = get_json(app(), "/analysis/co2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["co2_statistics"]["average_ppm"], 833.33);
        assert_eq!(
            body["data"]["sustainability_insights"]["overall_rating"],
            "acceptable"
        );
    }

    #[tokio::test]
    async fn window_query_narrows_the_analysis() {
        let (status, body) = get_json(
            app(),
            "/analysis/co2?start_date=2024-01-01&end_date=2024-01-01",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["period"]["total_readings"], 4);
    }

    #[tokio::test]
    async fn empty_window_is_404_with_json_error() {
        let (status, body) = get_json(app(), "/analysis/comfort?start_date=2031-01-01").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("No data"));
    }

    #[tokio::test]
    async fn malformed_date_is_400() {
        let (status, body) = get_json(app(), "/analysis/occupancy?end_date=tomorrow").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("end_date"));
    }

    #[tokio::test]
    async fn data_summary_over_empty_store_is_404() {
        let state = state_with(
            SensorTable::default(),
            Arc::new(CannedGenerator::replying("unused")),
        );
        let (status, _) = get_json(router().with_state(state), "/data-summary").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn compare_returns_deltas() {
        let (status, body) = get_json(
            app(),
            "/analysis/compare?period1_start=2024-01-01&period1_end=2024-01-01&period2_start=2024-01-02&period2_end=2024-01-02",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deltas"]["co2_average_ppm"], 302.5);
    }
}
