// src/handlers/post_handlers.rs - raw post reads (list + detail)
use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::AppState;

#[derive(Serialize)]
struct ApiResponse<T: serde::Serialize> {
    status: String,
    message: String,
    data: Option<T>,
}

#[get("/posts")]
pub async fn list_posts(state: web::Data<AppState>, user: AuthenticatedUser) -> HttpResponse {
    match state.post_store.list_by_owner(&user.user_id).await {
        Ok(posts) => {
            println!("Posts retrieved: {} items", posts.len());
            HttpResponse::Ok().json(ApiResponse {
                status: "success".to_string(),
                message: "Posts retrieved successfully".to_string(),
                data: Some(posts),
            })
        }
        Err(e) => {
            println!("Failed to list posts: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()> {
                status: "error".to_string(),
                message: "Failed to retrieve posts".to_string(),
                data: None,
            })
        }
    }
}

#[get("/posts/{post_id}")]
pub async fn get_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> HttpResponse {
    let post_id = path.into_inner();

    match state.post_store.get(&user.user_id, &post_id).await {
        Ok(Some(post)) => HttpResponse::Ok().json(ApiResponse {
            status: "success".to_string(),
            message: "Post retrieved".to_string(),
            data: Some(post),
        }),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()> {
            status: "error".to_string(),
            message: "Post not found".to_string(),
            data: None,
        }),
        Err(e) => {
            println!("Failed to get post {}: {}", post_id, e);
            HttpResponse::InternalServerError().json(ApiResponse::<()> {
                status: "error".to_string(),
                message: "Failed to retrieve post".to_string(),
                data: None,
            })
        }
    }
}
