// src/dtos/upload_dtos.rs
use serde::{Deserialize, Serialize};

use crate::models::geo::GeoPoint;
use crate::models::post::Post;

#[derive(Deserialize)]
pub struct UploadImageDTO {
    /// base64 payload; a `data:image/...;base64,` prefix is tolerated.
    pub image_data: String,
    pub file_name: String,
    /// "image/jpeg", "image/png", etc.
    pub content_type: String,
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Explicit capture date from the form, YYYY-MM-DD. Overrides EXIF.
    pub captured_at: Option<String>,
    /// Explicit map pick. Overrides every other location source.
    pub selected_location: Option<GeoPoint>,
    /// Input order is slot order; the first image becomes the thumbnail.
    pub images: Vec<UploadImageDTO>,
}

#[derive(Serialize)]
pub struct CreatePostResponse {
    pub post: Post,
}
