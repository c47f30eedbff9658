use crate::{model_service::InferenceError, state::SharedState};
use axum::{
    body::{Body, Bytes},
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

const IMAGE_FIELD: &str = "image";

pub const PROCESSING_TIME_HEADER: &str = "X-Processing-Time-Ms";
pub const INPUT_SIZE_HEADER: &str = "X-Input-Size-Kb";
pub const OUTPUT_SIZE_HEADER: &str = "X-Output-Size-Kb";

#[derive(Error, Debug)]
pub enum RemovalError {
    #[error("No image provided")]
    NoImage,
    #[error("{0}")]
    Read(#[from] MultipartError),
    #[error("{0}")]
    Inference(#[from] InferenceError),
    #[error("inference task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("HTTP builder failed: {0}")]
    HttpBuilder(String),
}

impl RemovalError {
    fn status(&self) -> StatusCode {
        match self {
            RemovalError::NoImage => StatusCode::BAD_REQUEST,
            RemovalError::Read(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for RemovalError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn size_kb(len: usize) -> usize {
    len / 1024
}

/// Returns the content of the first file part named `image`, if any.
async fn read_image_field(mut multipart: Multipart) -> Result<Option<Bytes>, RemovalError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) && field.file_name().is_some() {
            return Ok(Some(field.bytes().await?));
        }
    }
    Ok(None)
}

async fn process(
    state: SharedState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RemovalError> {
    let image_data = match multipart {
        Ok(multipart) => read_image_field(multipart).await?,
        Err(rejection) => {
            tracing::debug!("Request has no multipart body: {}", rejection);
            None
        }
    }
    .ok_or(RemovalError::NoImage)?;

    let input_size = image_data.len();
    tracing::info!("Processing image: {:.1} KB", input_size as f64 / 1024.0);

    let start = Instant::now();
    let model_service = state.model_service.clone();
    let output_data =
        tokio::task::spawn_blocking(move || model_service.remove_background(&image_data))
            .await??;

    let duration_ms = start.elapsed().as_millis();
    let output_size = output_data.len();
    tracing::info!(
        "Done: {}ms, output: {:.1} KB",
        duration_ms,
        output_size as f64 / 1024.0
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(PROCESSING_TIME_HEADER, duration_ms.to_string())
        .header(INPUT_SIZE_HEADER, size_kb(input_size).to_string())
        .header(OUTPUT_SIZE_HEADER, size_kb(output_size).to_string())
        .body(Body::from(output_data))
        .map_err(|e| RemovalError::HttpBuilder(e.to_string()))
}

#[instrument(skip(state, multipart))]
pub async fn remove_background(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RemovalError> {
    process(state, multipart).await.inspect_err(|e| {
        if !matches!(e, RemovalError::NoImage) {
            tracing::error!("Error processing image: {}", e);
        }
    })
}
