//! Image CRUD route handlers.
//!
//! Each handler is a thin adapter from an HTTP verb and path to one
//! `iv_db::queries::images` call. Every outcome (success, rejection, or
//! fault) is logged exactly once, here, with the operation and image ID.

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use iv_core::{Error, ImageId};
use iv_db::models::ImageSummary;
use iv_db::queries::images;

use crate::context::AppContext;
use crate::error::AppError;

/// Content type recorded when the client does not send one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Response to a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: ImageId,
    pub name: String,
    pub message: String,
}

/// Response to a successful update.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub id: ImageId,
    pub name: String,
}

/// Response to a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// One entry of the image listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummaryResponse {
    pub id: ImageId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub thumbnail_url: String,
}

impl ImageSummaryResponse {
    fn from_model(summary: ImageSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            created_at: summary.created_at,
            modified_at: summary.modified_at,
            thumbnail_url: summary.thumbnail_url,
        }
    }
}

/// A file part pulled out of a multipart body.
#[derive(Debug)]
struct UploadedFile {
    name: String,
    content_type: String,
    data: Vec<u8>,
}

/// Log a failed operation and wrap it for the response.
///
/// Client errors are warnings; faults are errors and carry the full cause.
fn fail(
    op: &'static str,
    id: Option<ImageId>,
    err: Error,
    fault_message: &'static str,
) -> AppError {
    match (&err, id) {
        (e, Some(id)) if e.is_fault() => {
            tracing::error!(op, image_id = %id, error = %e, "Image operation failed");
        }
        (e, None) if e.is_fault() => {
            tracing::error!(op, error = %e, "Image operation failed");
        }
        (e, Some(id)) => {
            tracing::warn!(op, image_id = %id, reason = %e, "Image operation rejected");
        }
        (e, None) => {
            tracing::warn!(op, reason = %e, "Image operation rejected");
        }
    }
    AppError::new(err).with_fault_message(fault_message)
}

fn parse_id(raw: &str) -> Result<ImageId, Error> {
    raw.parse()
        .map_err(|_| Error::Validation(format!("Invalid image ID: {raw}")))
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge("Uploaded file exceeds the size limit".into())
    } else {
        Error::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// Read the first file part (a part carrying a filename) from the body.
///
/// A missing or empty file is a validation error, as is a body that is not
/// valid multipart.
async fn read_file(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadedFile, Error> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Request body is not multipart");
        Error::Validation("No file uploaded".into())
    })?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.file_name().filter(|n| !n.is_empty()).map(String::from) else {
            continue;
        };
        let content_type = field
            .content_type()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        if data.is_empty() {
            break;
        }

        return Ok(UploadedFile {
            name,
            content_type,
            data: data.to_vec(),
        });
    }

    Err(Error::Validation("No file uploaded".into()))
}

/// Build a `Content-Disposition` value that survives non-ASCII filenames.
fn content_disposition(name: &str) -> HeaderValue {
    let ascii: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(name.len());
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// POST /images/upload
pub async fn upload_image(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    const FAULT: &str = "Error uploading image";

    let file = read_file(multipart)
        .await
        .map_err(|e| fail("upload", None, e, FAULT))?;

    let image = ctx
        .with_conn(move |conn| {
            images::create_image(conn, &file.name, &file.content_type, &file.data)
        })
        .await
        .map_err(|e| fail("upload", None, e, FAULT))?;

    tracing::info!(
        op = "upload",
        image_id = %image.id,
        name = %image.name,
        bytes = image.data.len(),
        "Image uploaded"
    );

    Ok(Json(UploadResponse {
        id: image.id,
        name: image.name,
        message: "Image uploaded successfully".into(),
    }))
}

/// GET /images/{id}
pub async fn get_image(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    const FAULT: &str = "Error retrieving image";

    let id = parse_id(&id).map_err(|e| fail("fetch", None, e, FAULT))?;

    let image = ctx
        .with_conn(move |conn| {
            images::get_image(conn, id)?.ok_or_else(|| Error::not_found("Image", id))
        })
        .await
        .map_err(|e| fail("fetch", Some(id), e, FAULT))?;

    tracing::info!(op = "fetch", image_id = %image.id, name = %image.name, "Image retrieved");

    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition(&image.name)),
        ],
        image.data,
    )
        .into_response())
}

/// PUT /images/{id}
pub async fn update_image(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    const FAULT: &str = "Error updating image";

    let id = parse_id(&id).map_err(|e| fail("update", None, e, FAULT))?;
    let file = read_file(multipart)
        .await
        .map_err(|e| fail("update", Some(id), e, FAULT))?;

    let image = ctx
        .with_conn(move |conn| {
            images::replace_image(conn, id, &file.name, &file.content_type, &file.data)?
                .ok_or_else(|| Error::not_found("Image", id))
        })
        .await
        .map_err(|e| fail("update", Some(id), e, FAULT))?;

    tracing::info!(op = "update", image_id = %image.id, name = %image.name, "Image updated");

    Ok(Json(UpdateResponse {
        id: image.id,
        name: image.name,
    }))
}

/// DELETE /images/{id}
pub async fn delete_image(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    const FAULT: &str = "Error deleting image";

    let id = parse_id(&id).map_err(|e| fail("delete", None, e, FAULT))?;

    let name = ctx
        .with_conn(move |conn| {
            images::delete_image(conn, id)?.ok_or_else(|| Error::not_found("Image", id))
        })
        .await
        .map_err(|e| fail("delete", Some(id), e, FAULT))?;

    tracing::info!(op = "delete", image_id = %id, name = %name, "Image deleted");

    Ok(Json(DeleteResponse {
        message: format!("Image {name} deleted successfully"),
    }))
}

/// GET /images
pub async fn list_images(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<ImageSummaryResponse>>, AppError> {
    let summaries = ctx
        .with_conn(|conn| images::list_images(conn))
        .await
        .map_err(|e| fail("list", None, e, "Error retrieving images"))?;

    tracing::info!(op = "list", count = summaries.len(), "Images listed");

    Ok(Json(
        summaries
            .into_iter()
            .map(ImageSummaryResponse::from_model)
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_non_numeric() {
        let err = parse_id("abc").unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(parse_id("12").unwrap(), ImageId::from(12));
    }

    #[test]
    fn content_disposition_plain_name() {
        let v = content_disposition("a.png");
        assert_eq!(
            v.to_str().unwrap(),
            "attachment; filename=\"a.png\"; filename*=UTF-8''a.png"
        );
    }

    #[test]
    fn content_disposition_escapes_quotes_and_unicode() {
        let v = content_disposition("my \"cat\" é.png");
        let s = v.to_str().unwrap();
        assert!(s.contains("filename=\"my _cat_ _.png\""));
        assert!(s.contains("filename*=UTF-8''my%20%22cat%22%20%C3%A9.png"));
    }

    #[test]
    fn summary_serializes_camel_case_without_payload() {
        let created_at = Utc::now();
        let response = ImageSummaryResponse {
            id: ImageId::from(1),
            name: "a.png".into(),
            created_at,
            modified_at: None,
            thumbnail_url: "/images/1".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["thumbnailUrl"], "/images/1");
        assert!(json["modifiedAt"].is_null());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("data").is_none());
    }
}
