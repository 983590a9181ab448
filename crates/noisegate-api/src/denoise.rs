use axum::body::Bytes;
use axum::extract::{Multipart, Query};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::session::SessionUser;
use crate::{archive, filter, pages};

const ZIP_FILENAME: &str = "denoised_sequence.zip";

#[derive(Debug, Deserialize)]
pub struct StrengthQuery {
    #[serde(default = "default_strength")]
    pub strength: f32,
}

fn default_strength() -> f32 {
    1.0
}

pub async fn control_page(_user: SessionUser) -> Html<&'static str> {
    Html(pages::DENOISE_PAGE)
}

/// POST /denoise/image — one uploaded file in, one PNG out.
pub async fn denoise_image(
    user: SessionUser,
    Query(query): Query<StrengthQuery>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let Some(field) = multipart.next_field().await? else {
        return Err(ApiError::EmptyUpload);
    };
    let filename = field.file_name().unwrap_or("upload").to_string();
    let data = field.bytes().await?;

    let png = process_one(&filename, &data, query.strength)?;

    info!("Denoised '{}' for '{}'", filename, user.username);
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// POST /denoise/sequence.zip — uploaded PNGs in, one zip out.
///
/// Only files named `*.png` (case-insensitive) qualify. The first
/// undecodable qualifying file aborts the whole batch; no partial
/// archive is ever returned.
pub async fn denoise_sequence(
    user: SessionUser,
    Query(query): Query<StrengthQuery>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut uploads: Vec<(String, Bytes)> = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let filename = field.file_name().unwrap_or("").to_string();
        let data = field.bytes().await?;
        uploads.push((filename, data));
    }
    if uploads.is_empty() {
        return Err(ApiError::EmptyUpload);
    }

    let qualifying: Vec<_> = uploads
        .into_iter()
        .filter(|(name, _)| name.to_ascii_lowercase().ends_with(".png"))
        .collect();
    if qualifying.is_empty() {
        return Err(ApiError::NoQualifyingFiles);
    }

    let mut entries = Vec::with_capacity(qualifying.len());
    for (filename, data) in &qualifying {
        let png = process_one(filename, data, query.strength)?;
        entries.push((filename.clone(), png));
    }

    let (bytes, count) = archive::build(&entries)?;
    info!(
        "Denoised {} file(s) into a {}-byte archive for '{}'",
        count,
        bytes.len(),
        user.username
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ZIP_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn process_one(filename: &str, data: &[u8], strength: f32) -> Result<Vec<u8>, ApiError> {
    let img = image::load_from_memory(data).map_err(|e| {
        warn!("Undecodable upload '{}': {}", filename, e);
        ApiError::BadImage(filename.to_string())
    })?;
    let out = filter::denoise(&img, strength);
    filter::encode_png(&out).map_err(anyhow::Error::from).map_err(ApiError::from)
}
