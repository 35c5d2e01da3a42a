use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Building Insights API",
        description = "Sensor analytics, narrated sustainability reports and numeric fact checking."
    ),
    paths(
        crate::routes::health::health_handler,
        crate::routes::analysis::data_summary,
        crate::routes::analysis::co2_analysis,
        crate::routes::analysis::occupancy_analysis,
        crate::routes::analysis::comfort_analysis,
        crate::routes::analysis::compare,
        crate::routes::report::generate_report,
        crate::routes::validate::validate_text,
        crate::routes::chat::chat,
        crate::routes::chat::list_models,
        openapi_handler,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::routes::health::HealthResponse,
        crate::routes::analysis::AnalysisResponse,
        crate::routes::report::ReportRequest,
        crate::routes::report::ReportResponse,
        crate::routes::validate::ValidateRequest,
        crate::routes::validate::ValidateResponse,
        crate::routes::chat::ChatRequest,
        crate::routes::chat::ChatResponse,
        crate::services::document::MetricDocument,
        crate::services::report::ReportType,
        crate::services::report::ReportSummary,
        crate::services::facts::ValidationVerdict,
        crate::services::facts::Discrepancy,
    )),
    tags(
        (name = "health"),
        (name = "analysis", description = "Windowed sensor analyses"),
        (name = "report", description = "Report generation and validation"),
        (name = "chat", description = "Conversational access to the text generation backend"),
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or(serde_json::Value::Null)
}

#[utoipa::path(
    get,
    path = "/api/openapi.json",
    tag = "health",
    responses((status = 200, description = "OpenAPI document for this service"))
)]
pub(crate) async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = openapi_json();
        let paths = doc["paths"].as_object().expect("paths");
        for path in [
            "/health",
            "/api/data-summary",
            "/api/analysis/co2",
            "/api/analysis/occupancy",
            "/api/analysis/comfort",
            "/api/analysis/compare",
            "/api/report",
            "/api/validate",
            "/api/chat",
            "/api/models",
            "/api/openapi.json",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert!(doc["components"]["schemas"]["ValidationVerdict"].is_object());
    }
}
