use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::routes::analysis::with_table;
use crate::services::analysis::AnalysisOutcome;
use crate::services::document::MetricDocument;
use crate::services::generator::GenerateError;
use crate::services::report::{assemble_report, ReportType};
use crate::services::store::DateWindow;
use crate::state::AppState;

const SUSTAINABILITY_KEYWORDS: &[&str] = &[
    "energy",
    "consumption",
    "sustainability",
    "carbon",
    "footprint",
    "water",
    "usage",
    "building",
    "metrics",
    "eco",
    "environmental",
    "recommend",
    "analyze",
    "report",
    "statistics",
];

/// Case-insensitive substring match against the sustainability vocabulary.
pub fn is_sustainability_query(message: &str) -> bool {
    let lowered = message.to_lowercase();
    SUSTAINABILITY_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

fn contextual_prompt(message: &str, context: &MetricDocument) -> String {
    let data = serde_json::to_string_pretty(&context.0).unwrap_or_else(|_| "{}".to_string());
    format!(
        "You are a building sustainability analyst. Answer the question using the \
         measured building data below and quote figures exactly as given.\n\n\
         Building data:\n{data}\n\n\
         Question: {message}"
    )
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChatResponse {
    pub message: String,
    pub model: String,
    pub status: String,
    /// Whether the answer was grounded on the assembled building report.
    pub report_context: bool,
}

fn backend_error(err: GenerateError) -> AppError {
    let status = match err {
        GenerateError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        GenerateError::Status(_) | GenerateError::Malformed(_) => StatusCode::BAD_GATEWAY,
    };
    tracing::warn!(error = %err, "text generation backend request failed");
    AppError::new(status, "Failed to reach the text generation backend").with_details(err.to_string())
}

#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Generated answer", body = ChatResponse),
        (status = 400, description = "Message is missing", body = crate::error::ErrorBody),
        (status = 502, description = "Backend returned an error", body = crate::error::ErrorBody),
        (status = 503, description = "Backend unreachable", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let message = body
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::bad_request("Message is required"))?;

    let context = if is_sustainability_query(&message) {
        let outcome = with_table(state.store.clone(), |table| {
            assemble_report(table, &DateWindow::all(), ReportType::Comprehensive)
        })
        .await?;
        match outcome {
            AnalysisOutcome::Ready(doc) => Some(doc),
            AnalysisOutcome::NoData(reason) | AnalysisOutcome::Failed(reason) => {
                tracing::info!(reason = %reason, "answering without report context");
                None
            }
        }
    } else {
        None
    };

    let prompt = match &context {
        Some(doc) => contextual_prompt(&message, doc),
        None => message.clone(),
    };
    let reply = state
        .generator
        .generate(&prompt, &state.config.model_name, state.config.chat_timeout)
        .await
        .map_err(backend_error)?;

    Ok(Json(ChatResponse {
        message: reply,
        model: state.config.model_name.clone(),
        status: "success".to_string(),
        report_context: context.is_some(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/models",
    tag = "chat",
    responses(
        (status = 200, description = "Model list reported by the backend", body = MetricDocument),
        (status = 502, description = "Backend returned an error", body = crate::error::ErrorBody),
        (status = 503, description = "Backend unreachable", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn list_models(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let models = state.generator.list_models().await.map_err(backend_error)?;
    Ok(Json(models))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/models", get(list_models))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_table, state_with, CannedGenerator};
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router().with_state(state).oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn chat_request(payload: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    #[test]
    fn keyword_routing_is_case_insensitive() {
        assert!(is_sustainability_query("What is our CARBON footprint?"));
        assert!(is_sustainability_query("Please analyze the week"));
        assert!(!is_sustainability_query("Tell me a joke"));
    }

    #[tokio::test]
    async fn sustainability_question_embeds_report() {
        let generator = Arc::new(CannedGenerator::replying("CO2 averaged 833.33 ppm."));
        let state = state_with(sample_table(), generator.clone());
        let (status, body) = send(
            state,
            chat_request(serde_json::json!({ "message": "How is our energy usage?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "CO2 averaged 833.33 ppm.");
        assert_eq!(body["model"], "llama3.1");
        assert_eq!(body["report_context"], true);

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"average_ppm\": 833.33"));
        assert!(prompts[0].ends_with("Question: How is our energy usage?"));
    }

    #[tokio::test]
    async fn other_questions_pass_through() {
        let generator = Arc::new(CannedGenerator::replying("Hello!"));
        let state = state_with(sample_table(), generator.clone());
        let (status, body) = send(state, chat_request(serde_json::json!({ "message": "hi there" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report_context"], false);
        assert_eq!(generator.prompts(), vec!["hi there".to_string()]);
    }

    #[tokio::test]
    async fn missing_message_is_400() {
        let state = state_with(sample_table(), Arc::new(CannedGenerator::replying("unused")));
        let (status, body) = send(state, chat_request(serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn backend_error_is_502_with_details() {
        let state = state_with(sample_table(), Arc::new(CannedGenerator::failing()));
        let (status, body) = send(state, chat_request(serde_json::json!({ "message": "hi" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "error");
        assert!(body["details"].as_str().is_some());
    }

    #[tokio::test]
    async fn models_are_proxied() {
        let state = state_with(sample_table(), Arc::new(CannedGenerator::replying("unused")));
        let request = Request::builder().uri("/models").body(Body::empty()).unwrap();
        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models"][0]["name"], "llama3.1:latest");
    }
}
