use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::asset::{AcquireMode, ProcessRequest, UploadedFile};
use crate::services::pipeline::PipelineError;

/// Success body: the pipeline always answers with insight text, possibly
/// the degraded synthesis sentinel.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub message: String,
    pub success: bool,
    pub insights: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match self {
            PipelineError::MissingInput(_) => StatusCode::BAD_REQUEST,
            PipelineError::ResolutionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
            PipelineError::StorageFailed(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Cancelled => StatusCode::REQUEST_TIMEOUT,
        };

        let body = ErrorResponse {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// POST /api/v1/process — run the media pipeline on an upload or a link.
///
/// Multipart fields: `type` (`upload` or `link`), plus `file` (binary with
/// its declared content type) or `link` (the post URL).
pub async fn process_media(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, Response> {
    let request = read_request(multipart).await?;
    let request_id = Uuid::new_v4();

    tracing::info!(request_id = %request_id, mode = %request.mode, "processing request received");

    let cancel = state.shutdown.child_token();
    let insights = state
        .pipeline
        .run(request, cancel)
        .await
        .map_err(|e| {
            tracing::warn!(request_id = %request_id, error = %e, "pipeline aborted");
            metrics::counter!("pipeline_requests_failed_total").increment(1);
            e.into_response()
        })?;

    Ok(Json(ProcessResponse {
        message: "File uploaded and processed successfully".to_string(),
        success: true,
        insights,
    }))
}

/// Pull the pipeline input out of the multipart body. Pairing validation
/// (upload needs a file, link needs a URL) belongs to the acquirer; only
/// the mode itself is rejected here.
async fn read_request(mut multipart: Multipart) -> Result<ProcessRequest, Response> {
    let mut mode: Option<String> = None;
    let mut file: Option<UploadedFile> = None;
    let mut link: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Malformed multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Malformed multipart body"))?;
                mode = Some(value);
            }
            "file" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let original_name = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("Malformed multipart body"))?;
                file = Some(UploadedFile {
                    bytes: bytes.to_vec(),
                    mime_type,
                    original_name,
                });
            }
            "link" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Malformed multipart body"))?;
                link = Some(value);
            }
            _ => {}
        }
    }

    let mode = mode
        .as_deref()
        .map(AcquireMode::from_str)
        .transpose()
        .map_err(|_| bad_request("Invalid type value"))?
        .ok_or_else(|| bad_request("Invalid type value"))?;

    Ok(ProcessRequest { mode, file, link })
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: message.to_string(),
        }),
    )
        .into_response()
}
