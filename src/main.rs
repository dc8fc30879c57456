use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Multipart},
    response::Html,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use imgbed::config::AppConfig;
use imgbed::errors::ApiError;
use imgbed::storage::{ImageEntry, ImageStorage};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_max_level(if config.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let storage = Arc::new(ImageStorage::new(config.storage()));

    let app = Router::new()
        .route("/", get(index))
        .route("/api/upload", post(upload))
        .route("/api/images", get(list_images))
        .layer(DefaultBodyLimit::max(config.max_file_size as usize))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage));

    let addr = config.socket_addr();
    tracing::info!("Upload app running on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

#[derive(Serialize)]
struct UploadResponse {
    filename: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compressed_bytes: Option<u64>,
}

async fn upload(
    Extension(storage): Extension<Arc<ImageStorage>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut compress = false;
    let mut quality: Option<u8> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                file = Some((filename, data.to_vec()));
            }
            Some("compress") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                compress = value.eq_ignore_ascii_case("true");
            }
            Some("quality") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                quality = Some(value.trim().parse().map_err(|_| {
                    ApiError::BadRequest("quality must be a number between 1 and 100".to_string())
                })?);
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;
    let saved = storage.save(&filename, data, compress, quality).await?;

    tracing::info!(filename = %saved.filename, compressed = compress, "stored upload");

    let (original_bytes, compressed_bytes) = match saved.size_info {
        Some(info) => (Some(info.original_bytes), Some(info.compressed_bytes)),
        None => (None, None),
    };

    Ok(Json(UploadResponse {
        filename: saved.filename,
        url: saved.url,
        original_bytes,
        compressed_bytes,
    }))
}

async fn list_images(
    Extension(storage): Extension<Arc<ImageStorage>>,
) -> Result<Json<Vec<ImageEntry>>, ApiError> {
    Ok(Json(storage.list().await?))
}
