// src/handlers/board_handlers.rs - filtered board views and marker sync
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

use crate::dtos::board_dtos::{
    BoardQueryParams, BoardViewResponse, MarkerSyncRequest, MarkerSyncResponse, RegionView,
};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::geo::{find_region, Region, ALL_REGION, REGIONS};
use crate::services::board_query::{self, QueryError};
use crate::services::marker_lifecycle::{MarkerLifecycleController, RecordingMapRender};
use crate::AppState;

#[derive(Serialize)]
struct ApiResponse<T: serde::Serialize> {
    status: String,
    message: String,
    data: Option<T>,
}

fn resolve_region(name: Option<&str>) -> Result<&'static Region, HttpResponse> {
    let name = name.unwrap_or(ALL_REGION);
    find_region(name).ok_or_else(|| {
        HttpResponse::BadRequest().json(ApiResponse::<()> {
            status: "error".to_string(),
            message: format!("Unknown region: {}", name),
            data: None,
        })
    })
}

/// The invalid-range signal gets its own message so the client can tell it
/// apart from "no posts matched".
fn invalid_range_response() -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()> {
        status: "error".to_string(),
        message: "Invalid date range: start must not be after end".to_string(),
        data: None,
    })
}

#[get("/board")]
pub async fn board_view(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<BoardQueryParams>,
) -> HttpResponse {
    println!("=== BOARD VIEW DEBUG ===");
    println!(
        "Owner: {}, region: {:?}, range: {} ~ {}",
        user.user_id, query.region, query.start, query.end
    );

    let region = match resolve_region(query.region.as_deref()) {
        Ok(region) => region,
        Err(response) => return response,
    };

    let range = match board_query::parse_range(&query.start, &query.end) {
        Ok(range) => range,
        Err(QueryError::InvalidRange) => return invalid_range_response(),
    };

    let posts = match state.post_store.list_by_owner(&user.user_id).await {
        Ok(posts) => posts,
        Err(e) => {
            println!("Failed to list posts: {}", e);
            return HttpResponse::InternalServerError().json(ApiResponse::<()> {
                status: "error".to_string(),
                message: "Failed to retrieve posts".to_string(),
                data: None,
            });
        }
    };

    match board_query::query(&posts, region, &range) {
        Ok(filtered) => HttpResponse::Ok().json(ApiResponse {
            status: "success".to_string(),
            message: "Board view computed".to_string(),
            data: Some(BoardViewResponse {
                region: RegionView::from(region),
                posts: filtered,
            }),
        }),
        Err(QueryError::InvalidRange) => invalid_range_response(),
    }
}

/// A controller's state only matters within one reconciliation sequence, so
/// a poisoned lock recovers with whatever state the sessions held; the next
/// reconcile recomputes the set whole anyway.
fn lock_sessions(
    sessions: &Mutex<HashMap<String, MarkerLifecycleController>>,
) -> MutexGuard<'_, HashMap<String, MarkerLifecycleController>> {
    sessions.lock().unwrap_or_else(|e| e.into_inner())
}

/// Reconciles this owner's marker session against the current filter and
/// returns the map operations to apply, removals first.
#[post("/board/markers")]
pub async fn sync_markers(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<MarkerSyncRequest>,
) -> HttpResponse {
    let region = match resolve_region(body.region.as_deref()) {
        Ok(region) => region,
        Err(response) => return response,
    };

    let range = match board_query::parse_range(&body.start, &body.end) {
        Ok(range) => range,
        Err(QueryError::InvalidRange) => return invalid_range_response(),
    };

    let posts = match state.post_store.list_by_owner(&user.user_id).await {
        Ok(posts) => posts,
        Err(e) => {
            println!("Failed to list posts: {}", e);
            return HttpResponse::InternalServerError().json(ApiResponse::<()> {
                status: "error".to_string(),
                message: "Failed to retrieve posts".to_string(),
                data: None,
            });
        }
    };

    let view_set = match board_query::query(&posts, region, &range) {
        Ok(filtered) => filtered,
        Err(QueryError::InvalidRange) => return invalid_range_response(),
    };

    // The marker set is owned per board session (one per owner here) and
    // recomputed whole on every filter change.
    let mut sessions = lock_sessions(&state.marker_sessions);
    let controller = sessions.entry(user.user_id.clone()).or_default();
    let mut map = RecordingMapRender::default();
    let diff = controller.reconcile(&view_set, &mut map);

    HttpResponse::Ok().json(ApiResponse {
        status: "success".to_string(),
        message: "Markers reconciled".to_string(),
        data: Some(MarkerSyncResponse {
            region: RegionView::from(region),
            ops: map.ops,
            diff,
        }),
    })
}

/// Region table for the board's dropdown.
#[get("/regions")]
pub async fn list_regions() -> HttpResponse {
    let regions: Vec<RegionView> = REGIONS.iter().map(RegionView::from).collect();
    HttpResponse::Ok().json(ApiResponse {
        status: "success".to_string(),
        message: "Regions retrieved".to_string(),
        data: Some(regions),
    })
}
