use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{internal_error, AppError, AppResult};
use crate::routes::analysis::with_table;
use crate::services::analysis::AnalysisOutcome;
use crate::services::document::MetricDocument;
use crate::services::report::{
    narrate_report, prepare_report, NarrationSettings, ReportSummary, ReportType,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ReportRequest {
    /// Free-form question the narrative should answer.
    #[serde(default)]
    pub query: Option<String>,
    /// `comprehensive`, `co2-focused` or `energy-efficiency`.
    #[serde(default, rename = "type")]
    pub report_type: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReportResponse {
    pub status: String,
    pub generated_at: String,
    pub report_type: ReportType,
    pub user_query: String,
    pub llm_analysis: String,
    /// `"success"` when the narrative came from the backend, `"error"` otherwise.
    pub llm_status: String,
    pub structured_data: MetricDocument,
    pub summary: ReportSummary,
}

#[utoipa::path(
    post,
    path = "/api/report",
    tag = "report",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Structured report with generated narrative", body = ReportResponse),
        (status = 400, description = "Unknown report type", body = crate::error::ErrorBody),
        (status = 404, description = "No data available for report generation", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn generate_report(
    State(state): State<AppState>,
    Json(body): Json<ReportRequest>,
) -> AppResult<Json<ReportResponse>> {
    let report_type: ReportType = body
        .report_type
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::bad_request)?;

    let query = body.query;
    let outcome = with_table(state.store.clone(), move |table| {
        prepare_report(table, report_type, query.as_deref())
    })
    .await?;
    let prepared = match outcome {
        AnalysisOutcome::Ready(prepared) => prepared,
        AnalysisOutcome::NoData(reason) => return Err(AppError::not_found(reason)),
        AnalysisOutcome::Failed(reason) => return Err(internal_error(reason)),
    };

    let settings = NarrationSettings {
        model: &state.config.model_name,
        timeout: state.config.llm_timeout,
    };
    let report = narrate_report(prepared, state.generator.as_ref(), settings).await;

    Ok(Json(ReportResponse {
        status: "success".to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        report_type: report.report_type,
        user_query: report.user_query,
        llm_status: if report.narrative.ok { "success" } else { "error" }.to_string(),
        llm_analysis: report.narrative.text,
        structured_data: report.structured,
        summary: report.summary,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/report", post(generate_report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generator::GENERATION_FAILED_TEXT;
    use crate::services::store::{MetricStore, SensorTable};
    use crate::test_support::{state_with, test_state, CannedGenerator};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn post_json(state: AppState, payload: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let resp = router()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/report")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn report_carries_narrative_and_summary() {
        let (status, body) = post_json(
            test_state(),
            serde_json::json!({ "query": "How is the air?", "type": "co2-focused" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["report_type"], "co2_focused");
        assert_eq!(body["user_query"], "How is the air?");
        assert_eq!(body["llm_status"], "success");
        assert_eq!(body["llm_analysis"], "Average CO2 levels: 833.33 ppm.");
        assert_eq!(body["summary"]["data_points_analyzed"], 7);
        assert_eq!(body["summary"]["key_recommendations"].as_array().unwrap().len(), 3);
        assert_eq!(
            body["structured_data"]["detailed_analysis"]["air_quality"]["co2_statistics"]["average_ppm"],
            833.33
        );
        assert!(body["generated_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn empty_body_defaults_to_comprehensive() {
        let (status, body) = post_json(test_state(), serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report_type"], "comprehensive");
        assert_eq!(body["user_query"], crate::services::report::DEFAULT_USER_QUERY);
    }

    #[tokio::test]
    async fn backend_failure_keeps_structured_data() {
        let state = state_with(
            crate::test_support::sample_table(),
            Arc::new(CannedGenerator::failing()),
        );
        let (status, body) = post_json(state, serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["llm_status"], "error");
        assert_eq!(body["llm_analysis"], GENERATION_FAILED_TEXT);
        assert!(body["structured_data"].is_object());
    }

    #[tokio::test]
    async fn unknown_type_is_400() {
        let (status, body) = post_json(test_state(), serde_json::json!({ "type": "weekly" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn empty_store_is_404() {
        let state = state_with(
            SensorTable::default(),
            Arc::new(CannedGenerator::replying("unused")),
        );
        let (status, body) = post_json(state, serde_json::json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No data available for report generation");
    }

    #[tokio::test]
    async fn first_request_loads_the_dataset_before_narrating() {
        let generator = Arc::new(CannedGenerator::replying("unused"));
        let mut state = state_with(SensorTable::default(), generator.clone());
        state.store = Arc::new(MetricStore::lazy(PathBuf::from("/definitely/not/here.csv")));
        let store = state.store.clone();

        let (status, _) = post_json(state, serde_json::json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(store.is_loaded());
        assert!(generator.prompts().is_empty());
    }
}
