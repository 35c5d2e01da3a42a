use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::routes::analysis::with_table;
use crate::services::facts::{validate_report, ValidationVerdict};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ValidateRequest {
    #[serde(default)]
    pub report_text: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ValidateResponse {
    pub status: String,
    pub validation_result: ValidationVerdict,
    #[serde(flatten)]
    pub verdict: ValidationVerdict,
}

#[utoipa::path(
    post,
    path = "/api/validate",
    tag = "report",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Numeric claims checked against recomputed metrics", body = ValidateResponse),
        (status = 400, description = "Report text is missing", body = crate::error::ErrorBody)
    )
)]
pub(crate) async fn validate_text(
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> AppResult<Json<ValidateResponse>> {
    let text = body
        .report_text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Report text is required"))?;

    let claims = state.claims;
    let verdict = with_table(state.store, move |table| validate_report(claims, table, &text)).await?;

    Ok(Json(ValidateResponse {
        status: "success".to_string(),
        validation_result: verdict.clone(),
        verdict,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_text))
}
