// src/handlers/upload_handlers.rs - multi-image post submission endpoint
use actix_web::{post, web, HttpResponse};
use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDate;
use serde::Serialize;

use crate::dtos::upload_dtos::{CreatePostRequest, CreatePostResponse, UploadImageDTO};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::services::upload_orchestrator::{ImageAsset, UploadError, UploadRequest};
use crate::AppState;

#[derive(Serialize)]
struct ApiResponse<T: serde::Serialize> {
    status: String,
    message: String,
    data: Option<T>,
}

const ALLOWED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

#[post("/posts")]
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreatePostRequest>,
) -> HttpResponse {
    println!("=== CREATE POST DEBUG ===");
    println!("Owner: {}", user.user_id);
    println!("Title: {}", body.title);
    println!("Image count: {}", body.images.len());

    let body = body.into_inner();

    let capture_date_override = match parse_capture_date(body.captured_at.as_deref()) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };

    let mut images = Vec::with_capacity(body.images.len());
    for (position, dto) in body.images.iter().enumerate() {
        match decode_image(position, dto) {
            Ok(asset) => images.push(asset),
            Err(message) => return bad_request(message),
        }
    }

    let request = UploadRequest {
        title: body.title,
        description: body.description,
        capture_date_override,
        selected_location: body.selected_location,
        images,
    };

    match state.orchestrator().submit(&user.user_id, request).await {
        Ok(post) => {
            println!("Post created: {}", post.id);
            HttpResponse::Ok().json(ApiResponse {
                status: "success".to_string(),
                message: "Post created successfully".to_string(),
                data: Some(CreatePostResponse { post }),
            })
        }
        Err(e) => {
            println!("Submission failed: {}", e);
            submission_error_response(&e)
        }
    }
}

fn submission_error_response(e: &UploadError) -> HttpResponse {
    match e {
        UploadError::InvalidInput(_) | UploadError::MissingLocation | UploadError::Extraction(_) => {
            bad_request(e.to_string())
        }
        // Store-side failures are the upstream's fault, not the client's.
        UploadError::AssetWrite { .. } | UploadError::RecordWrite(_) => {
            HttpResponse::BadGateway().json(ApiResponse::<()> {
                status: "error".to_string(),
                message: format!("Failed to create post: {}", e),
                data: None,
            })
        }
    }
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()> {
        status: "error".to_string(),
        message,
        data: None,
    })
}

fn parse_capture_date(raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("Invalid capture date: {}", value)),
    }
}

/// The upload form sends images as base64 payloads in the JSON body,
/// sometimes with a data-URL prefix.
fn decode_image(position: usize, dto: &UploadImageDTO) -> Result<ImageAsset, String> {
    if !ALLOWED_TYPES.contains(&dto.content_type.as_str()) {
        return Err(format!(
            "Invalid file type {}. Only JPEG, PNG, GIF, and WEBP are allowed.",
            dto.content_type
        ));
    }

    let base64_data = match dto.image_data.split_once(',') {
        Some((_, data)) => data,
        None => dto.image_data.as_str(),
    };

    let bytes = general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|_| format!("Invalid base64 image data in {}", dto.file_name))?;
    if bytes.is_empty() {
        return Err(format!("Empty image payload in {}", dto.file_name));
    }

    Ok(ImageAsset::new(
        position,
        bytes,
        dto.file_name.clone(),
        dto.content_type.clone(),
    ))
}
