use super::{page, AppState};
use crate::core::{decoder, encoder};
use crate::utils::error::{AppError, Result};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct MarksResponse {
    pub marks: Vec<Option<u8>>,
}

#[derive(Debug, Serialize)]
pub struct BlobResponse {
    pub blob: String,
}

/// Every `name` value in a query string, in order, repeats included.
pub fn query_names(query: Option<&str>) -> Vec<String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(key, _)| key == "name")
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default()
}

pub async fn home(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page::render(state.public_url.as_deref()))
}

pub async fn lookup_marks(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<MarksResponse>> {
    let names = query_names(query.as_deref());

    let marks = state.roster.lookup(&names).inspect_err(|e| {
        tracing::warn!("Rejected marks lookup: {}", e);
    })?;

    Ok(Json(MarksResponse { marks }))
}

/// Body-limit hits answer 413; any other broken multipart stream is a 400.
fn upload_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected: {}", err.body_text());
        AppError::PayloadTooLarge
    } else {
        tracing::warn!("Upload rejected: {}", err.body_text());
        AppError::MalformedUpload {
            message: err.body_text(),
        }
    }
}

pub async fn upload(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<BlobResponse>> {
    // A body that is not multipart at all carries no file part either
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("Upload rejected: {}", e.body_text());
        AppError::MissingUploadFile
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() != Some("file") {
            continue;
        }

        // A part without a filename is a plain form field, not a file upload
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if file_name.is_empty() {
            tracing::warn!("Upload rejected: empty filename");
            return Err(AppError::EmptyFilename);
        }

        let bytes = field
            .bytes()
            .await
            .map_err(upload_error)?;

        let blob = encoder::encode_json(&bytes).inspect_err(|e| {
            tracing::warn!("Upload {} could not be encoded: {}", file_name, e);
        })?;

        tracing::info!(
            "Encoded {} ({} bytes) into a {} character token",
            file_name,
            bytes.len(),
            blob.len()
        );
        return Ok(Json(BlobResponse { blob }));
    }

    tracing::warn!("Upload rejected: no file part");
    Err(AppError::MissingUploadFile)
}

pub async fn check_token(
    State(state): State<Arc<AppState>>,
    token: std::result::Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>> {
    // A segment that does not percent-decode to UTF-8 cannot be a token
    let Path(token) = token.map_err(|e| {
        tracing::warn!("Token check rejected: {}", e.body_text());
        AppError::corrupt_token(e.body_text())
    })?;
    let names = query_names(query.as_deref());

    let result = decoder::decode_with_limit(&token, &names, state.max_decoded_bytes)
        .inspect_err(|e| {
            tracing::warn!("Token check failed: {}", e);
        })?;

    Ok(Json(result.to_json()))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html("404 - Not Found"))
}
