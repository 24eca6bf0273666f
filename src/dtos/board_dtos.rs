// src/dtos/board_dtos.rs
use serde::{Deserialize, Serialize};

use crate::models::geo::{GeoPoint, Region};
use crate::models::post::Post;
use crate::services::marker_lifecycle::{MapOp, MarkerDiff};

#[derive(Deserialize)]
pub struct BoardQueryParams {
    /// Region dropdown label; defaults to the nationwide sentinel.
    pub region: Option<String>,
    /// Inclusive range bounds, YYYY-MM-DD.
    pub start: String,
    pub end: String,
}

/// Map viewport for the selected region.
#[derive(Serialize)]
pub struct RegionView {
    pub name: &'static str,
    pub center: GeoPoint,
    pub zoom: u8,
}

impl From<&'static Region> for RegionView {
    fn from(region: &'static Region) -> Self {
        RegionView {
            name: region.name,
            center: region.center,
            zoom: region.zoom,
        }
    }
}

#[derive(Serialize)]
pub struct BoardViewResponse {
    pub region: RegionView,
    pub posts: Vec<Post>,
}

#[derive(Deserialize)]
pub struct MarkerSyncRequest {
    pub region: Option<String>,
    pub start: String,
    pub end: String,
}

/// Marker plan for the client's map widget: apply `ops` in order.
#[derive(Serialize)]
pub struct MarkerSyncResponse {
    pub region: RegionView,
    pub ops: Vec<MapOp>,
    pub diff: MarkerDiff,
}
