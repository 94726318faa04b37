//! Axum route handlers for the Refinement API.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{InputType, ProcessedInput};
use crate::pipeline::{RunOutcome, Stage};
use crate::refinement::relevance::{self, RelevanceVerdict};
use crate::refinement::render::to_markdown;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub content: String,
    #[serde(default = "default_input_type")]
    pub input_type: String,
}

fn default_input_type() -> String {
    InputType::Text.as_str().to_string()
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub text: String,
    pub output_name: Option<String>,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    #[serde(flatten)]
    pub outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
}

impl RefineResponse {
    fn from_outcome(outcome: RunOutcome) -> (StatusCode, Json<Self>) {
        let status = match &outcome {
            RunOutcome::Success { .. } => StatusCode::OK,
            RunOutcome::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RunOutcome::Failed {
                stage: Stage::InputProcessing,
                ..
            } => StatusCode::UNPROCESSABLE_ENTITY,
            RunOutcome::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let markdown = outcome.prompt().map(to_markdown);
        (status, Json(Self { outcome, markdown }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/validate
///
/// Runs the relevance gate only. Never refines or writes anything.
pub async fn handle_validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<RelevanceVerdict>, AppError> {
    let input_type: InputType = request.input_type.parse()?;
    Ok(Json(relevance::validate(
        &request.content,
        input_type,
        &state.rules,
    )))
}

/// POST /api/v1/refine
///
/// Refines literal text. Files are written only when `persist` is set.
pub async fn handle_refine(
    State(state): State<AppState>,
    Json(request): Json<RefineRequest>,
) -> Result<(StatusCode, Json<RefineResponse>), AppError> {
    let input = ProcessedInput::new(request.text, InputType::Text, None);
    let outcome = state
        .pipeline
        .refine_content(
            &input.content,
            &input.metadata,
            request.output_name.as_deref(),
            request.persist,
        )
        .await;

    Ok(RefineResponse::from_outcome(outcome))
}

/// POST /api/v1/refine/upload
///
/// Multipart form: any number of file fields, optional `text` fields,
/// optional `output_name` and `persist` fields. All inputs are merged.
pub async fn handle_refine_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RefineResponse>), AppError> {
    let mut inputs = Vec::new();
    let mut output_name: Option<String> = None;
    let mut persist = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::adapter(&filename, format!("upload interrupted: {e}")))?;
            inputs.push(
                state
                    .pipeline
                    .processor()
                    .decode_bytes(&filename, bytes.to_vec())
                    .await?,
            );
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("unreadable field '{name}': {e}")))?;
        match name.as_str() {
            "text" => inputs.push(ProcessedInput::new(value, InputType::Text, None)),
            "output_name" => output_name = Some(value).filter(|v| !v.trim().is_empty()),
            "persist" => persist = matches!(value.trim(), "true" | "1" | "yes"),
            other => {
                return Err(AppError::Validation(format!("unexpected field '{other}'")));
            }
        }
    }

    if inputs.is_empty() {
        return Err(AppError::Validation(
            "upload must contain at least one file or text field".to_string(),
        ));
    }

    let merged = ProcessedInput::merge(inputs);
    let outcome = state
        .pipeline
        .refine_content(
            &merged.content,
            &merged.metadata,
            output_name.as_deref(),
            persist,
        )
        .await;

    Ok(RefineResponse::from_outcome(outcome))
}
