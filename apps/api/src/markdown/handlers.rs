//! Axum route handlers for the markdown render API.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::markdown::{render, to_html, tokenize, RenderNode, Segment};

/// Upper bound on accepted feedback text, in bytes.
const MAX_TEXT_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub segments: Vec<Segment>,
    pub nodes: Vec<RenderNode>,
    pub html: String,
}

/// POST /api/v1/markdown/render
pub async fn handle_render(
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    if request.text.len() > MAX_TEXT_BYTES {
        return Err(AppError::Validation(format!(
            "text exceeds {MAX_TEXT_BYTES} bytes"
        )));
    }

    let segments = tokenize(&request.text);
    let nodes = render(&segments);
    let html = to_html(&nodes);

    Ok(Json(RenderResponse {
        segments,
        nodes,
        html,
    }))
}
