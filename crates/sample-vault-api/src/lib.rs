//! HTTP front end: upload, download, search and tagging over the shared vault.
//!
//! Routes are stateless; none of them touch a console session. Catalog and
//! repository work runs on the blocking pool.

pub mod error;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use sample_vault_core::hasher::FileInfo;
use sample_vault_core::storage::{Sample, TagCount};
use sample_vault_core::{Error, Vault};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::task::spawn_blocking;
use tokio_util::io::ReaderStream;
use tracing::info;

pub use error::ApiError;

/// Search fields accepted by the form endpoints, in priority order.
pub const SEARCH_KEYS: [&str; 6] = ["md5", "sha256", "ssdeep", "tag", "name", "all"];

const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Vault>,
}

impl AppState {
    pub fn new(vault: Vault) -> Self {
        Self {
            vault: Arc::new(vault),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/test", get(test))
        .route("/file/add", post(add_file))
        .route("/file/get/:hash", get(get_file))
        .route("/file/find", post(find_file))
        .route("/tags/list", get(list_tags))
        .route("/file/tags/add", post(add_tags))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// First non-empty search field of the form.
fn search_term(form: &HashMap<String, String>) -> Option<(String, String)> {
    SEARCH_KEYS.iter().find_map(|key| {
        form.get(*key)
            .filter(|value| !value.trim().is_empty())
            .map(|value| (key.to_string(), value.clone()))
    })
}

async fn test() -> Json<Value> {
    Json(json!({ "message": "test" }))
}

async fn add_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut tags: Option<String> = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await?;
                upload = Some((file_name, data));
            }
            Some("tags") => tags = Some(field.text().await?),
            _ => {}
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("The uploaded file is empty".to_string()));
    }

    let vault = state.vault.clone();
    let ingest = spawn_blocking(move || {
        let info = FileInfo::from_bytes(file_name, &data);
        vault.ingest_bytes(&info, &data, tags.as_deref())
    })
    .await??;

    let message = if ingest.is_new() {
        info!("Added {} via API", ingest.sha256);
        "added"
    } else {
        "already stored"
    };
    Ok(Json(json!({ "message": message, "sha256": ingest.sha256 })))
}

/// Streams the stored bytes; nothing is buffered beyond the reader's chunk.
async fn get_file(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    let vault = state.vault.clone();
    let path = spawn_blocking(move || -> sample_vault_core::Result<PathBuf> {
        let sample = vault
            .catalog
            .find_by_hash(&hash)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound("File not found in the database".to_string()))?;
        vault.repository.retrieve(&sample.sha256)
    })
    .await??;

    let file = File::open(&path)
        .await
        .map_err(|e| Error::storage_io(&path, e))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| Error::storage_io(&path, e))?
        .len();

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

async fn find_file(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<Vec<Sample>>, ApiError> {
    let (key, value) =
        search_term(&form).ok_or_else(|| ApiError::BadRequest("Invalid search term".to_string()))?;

    let vault = state.vault.clone();
    let samples = spawn_blocking(move || vault.catalog.find(&key, &value)).await??;
    Ok(Json(samples))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagCount>>, ApiError> {
    let vault = state.vault.clone();
    let tags = spawn_blocking(move || vault.catalog.list_tags()).await??;
    Ok(Json(tags))
}

async fn add_tags(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let tags = form
        .get("tags")
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .ok_or_else(|| ApiError::BadRequest("Missing tags".to_string()))?;
    let (key, value) =
        search_term(&form).ok_or_else(|| ApiError::BadRequest("Invalid search term".to_string()))?;

    let vault = state.vault.clone();
    let tagged = spawn_blocking(move || -> sample_vault_core::Result<usize> {
        let samples = vault.catalog.find(&key, &value)?;
        if samples.is_empty() {
            return Err(Error::NotFound("File not found in the database".to_string()));
        }
        for sample in &samples {
            vault.catalog.add_tags(&sample.sha256, &tags)?;
        }
        Ok(samples.len())
    })
    .await??;

    Ok(Json(json!({ "message": "added", "samples": tagged })))
}
