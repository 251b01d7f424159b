//! API request handlers for the registry gateway

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use provenance_common::{Account, Cid, ContentRecord, ContentType, Error};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::gallery::Gallery;
use crate::ledger::Ledger;
use crate::workflow::{DuplicateStatus, RegistrationRequest, RegistrationWorkflow};

/// Shared application state
pub struct AppState {
    pub workflow: Arc<RegistrationWorkflow>,
    pub gallery: Gallery,
    pub ledger: Arc<dyn Ledger>,
}

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "code": self.code,
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            Error::DuplicateCid(_) => (StatusCode::CONFLICT, "duplicate"),
            Error::StorageUnavailable(_) => (StatusCode::BAD_GATEWAY, "storage_unavailable"),
            Error::ContentRejected(_) => (StatusCode::BAD_REQUEST, "content_rejected"),
            Error::WalletRejected => (StatusCode::BAD_REQUEST, "wallet_rejected"),
            Error::Busy => (StatusCode::TOO_MANY_REQUESTS, "busy"),
            Error::Ledger(_) => (StatusCode::BAD_GATEWAY, "ledger"),
            Error::InvalidCid(_) | Error::InvalidContentType(_) => {
                (StatusCode::BAD_REQUEST, "invalid_input")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        ApiError::new(status, code, err.to_string())
    }
}

/// Response from a confirmed registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub cid: Cid,
    pub tx_hash: String,
    pub message: String,
}

/// Record lookup response
#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: ContentRecord,
}

/// Duplicate pre-check response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub cid: Cid,
    pub status: &'static str,
}

/// Gallery listing
#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub contents: Vec<ContentRecord>,
    pub total: usize,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "registry-gateway"
    }))
}

/// Register uploaded content: multipart form with `file`, `title`,
/// `description` and `content_type` parts.
pub async fn register_content_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let mut file_name = String::new();
    let mut bytes: Vec<u8> = Vec::new();
    let mut title = String::new();
    let mut description = String::new();
    let mut content_type: Option<ContentType> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().unwrap_or("upload").to_string();
                bytes = field.bytes().await.map_err(bad_multipart)?.to_vec();
            }
            "title" => title = field.text().await.map_err(bad_multipart)?,
            "description" => description = field.text().await.map_err(bad_multipart)?,
            "content_type" => {
                let text = field.text().await.map_err(bad_multipart)?;
                content_type = Some(text.parse::<ContentType>()?);
            }
            other => {
                return Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_input",
                    format!("Unexpected form field: {}", other),
                ));
            }
        }
    }

    let content_type = content_type.ok_or(Error::Validation("content_type"))?;

    info!("Registration requested: {:?} ({})", title, content_type);

    let outcome = state
        .workflow
        .submit(RegistrationRequest {
            file_name,
            bytes,
            title,
            description,
            content_type,
        })
        .await?;

    let response = RegisterResponse {
        success: true,
        message: format!("Content registered successfully, CID: {}", outcome.cid),
        cid: outcome.cid,
        tx_hash: outcome.receipt.tx_hash,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Look up the ledger record for a CID
pub async fn get_content_handler(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
) -> Result<Json<ContentResponse>, ApiError> {
    let cid = Cid::new(cid).map_err(ApiError::from)?;

    match state.ledger.get_content(&cid).await {
        provenance_common::RecordQuery::Found(content) => Ok(Json(ContentResponse { content })),
        provenance_common::RecordQuery::NotFound => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No record for CID: {}", cid),
        )),
        // A failed lookup is not a miss; report it so an unreachable ledger
        // stays visible at this surface.
        provenance_common::RecordQuery::QueryFailed(reason) => Err(ApiError::new(
            StatusCode::BAD_GATEWAY,
            "query_failed",
            format!("Ledger lookup failed: {}", reason),
        )),
    }
}

/// Duplicate pre-check projection for a CID
pub async fn content_status_handler(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let cid = Cid::new(cid).map_err(ApiError::from)?;

    let status = match state.workflow.cid_status(&cid).await {
        DuplicateStatus::New => "new",
        DuplicateStatus::AlreadyRegisteredByYou => "registered_by_you",
        DuplicateStatus::AlreadyRegisteredByOther => "registered_by_other",
    };

    Ok(Json(StatusResponse { cid, status }))
}

/// List the records registered by an account
pub async fn gallery_handler(
    State(state): State<Arc<AppState>>,
    Path(account): Path<String>,
) -> Result<Json<GalleryResponse>, ApiError> {
    let account = Account::new(account);

    let contents = state.gallery.contents_of(&account).await;
    let total = contents.len();

    Ok(Json(GalleryResponse { contents, total }))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "invalid_input",
        format!("Malformed multipart body: {}", err),
    )
}
