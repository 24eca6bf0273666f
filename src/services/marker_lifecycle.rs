// src/services/marker_lifecycle.rs - marker/info-window set reconciliation
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::geo::GeoPoint;
use crate::models::post::Post;

/// What the map widget needs to render in one info window: thumbnail,
/// title, upload date and (when known) capture date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoOverlay {
    pub thumbnail_url: String,
    pub title: String,
    pub created_date: String,
    /// Empty when the post carries no capture date.
    pub captured_date: String,
}

/// One rendered marker. A marker is tied to exactly one post id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub post_id: String,
    pub owner_id: String,
    pub position: GeoPoint,
    pub title: String,
    pub overlay: InfoOverlay,
}

impl Marker {
    pub fn for_post(post: &Post) -> Self {
        Marker {
            post_id: post.id.clone(),
            owner_id: post.owner_id.clone(),
            position: post.record.location(),
            title: post.record.title.clone(),
            overlay: InfoOverlay {
                thumbnail_url: post.record.thumbnail_url().unwrap_or_default().to_string(),
                title: post.record.title.clone(),
                created_date: post.record.created_date_label(),
                captured_date: post.record.captured_at.clone(),
            },
        }
    }
}

/// Render-side collaborator: the map widget's add/remove marker and
/// open/close info-window API, keyed by post id.
pub trait MapRenderService {
    fn add_marker(&mut self, marker: &Marker);
    fn remove_marker(&mut self, post_id: &str);
    fn open_info_window(&mut self, post_id: &str, overlay: &InfoOverlay);
    fn close_info_window(&mut self, post_id: &str);
}

/// Summary of one reconciliation pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MarkerDiff {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub kept: Vec<String>,
}

/// Owns the currently rendered marker set for one board session. The set is
/// recomputed as a whole whenever the filter or the post collection changes;
/// there is no incremental patching besides this reconciliation.
#[derive(Default)]
pub struct MarkerLifecycleController {
    markers: HashMap<String, Marker>,
    /// Post id of the info window currently open from hover, if any.
    open_overlay: Option<String>,
}

impl MarkerLifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker(&self, post_id: &str) -> Option<&Marker> {
        self.markers.get(post_id)
    }

    /// Bring the rendered set in line with the filtered view set. Whatever
    /// info window is open closes first (a recomputation never carries an
    /// overlay across, even for a surviving post), then departed markers are
    /// removed before any new marker is added, so a post present in both
    /// sets keeps its marker untouched.
    pub fn reconcile(&mut self, view_set: &[Post], map: &mut dyn MapRenderService) -> MarkerDiff {
        let mut diff = MarkerDiff::default();

        if let Some(open) = self.open_overlay.take() {
            map.close_info_window(&open);
        }

        let next_ids: HashSet<&str> = view_set.iter().map(|post| post.id.as_str()).collect();
        let departed: Vec<String> = self
            .markers
            .keys()
            .filter(|id| !next_ids.contains(id.as_str()))
            .cloned()
            .collect();
        for post_id in departed {
            map.remove_marker(&post_id);
            self.markers.remove(&post_id);
            diff.removed.push(post_id);
        }

        for post in view_set {
            if self.markers.contains_key(&post.id) {
                diff.kept.push(post.id.clone());
                continue;
            }
            let marker = Marker::for_post(post);
            map.add_marker(&marker);
            self.markers.insert(post.id.clone(), marker);
            diff.added.push(post.id.clone());
        }

        diff
    }

    /// Hover opens the marker's info window; any previously open one goes
    /// away first so a single overlay is on screen at a time.
    pub fn hover_enter(&mut self, post_id: &str, map: &mut dyn MapRenderService) {
        let Some(marker) = self.markers.get(post_id) else {
            return;
        };
        if let Some(open) = self.open_overlay.take() {
            if open != post_id {
                map.close_info_window(&open);
            }
        }
        map.open_info_window(post_id, &marker.overlay);
        self.open_overlay = Some(post_id.to_string());
    }

    pub fn hover_exit(&mut self, post_id: &str, map: &mut dyn MapRenderService) {
        if self.open_overlay.as_deref() == Some(post_id) {
            map.close_info_window(post_id);
            self.open_overlay = None;
        }
    }

    /// Marker click is the only way to navigate to a post's detail view.
    pub fn click_target(&self, post_id: &str) -> Option<String> {
        self.markers
            .get(post_id)
            .map(|marker| format!("/detail/{}/{}", marker.owner_id, marker.post_id))
    }
}

/// MapRenderService that records the operations instead of driving a real
/// widget. Handlers serialize the recorded ops for the client to apply; tests
/// assert on them.
#[derive(Debug, Default)]
pub struct RecordingMapRender {
    pub ops: Vec<MapOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MapOp {
    AddMarker { marker: Marker },
    RemoveMarker { post_id: String },
    OpenInfoWindow { post_id: String, overlay: InfoOverlay },
    CloseInfoWindow { post_id: String },
}

impl MapRenderService for RecordingMapRender {
    fn add_marker(&mut self, marker: &Marker) {
        self.ops.push(MapOp::AddMarker {
            marker: marker.clone(),
        });
    }

    fn remove_marker(&mut self, post_id: &str) {
        self.ops.push(MapOp::RemoveMarker {
            post_id: post_id.to_string(),
        });
    }

    fn open_info_window(&mut self, post_id: &str, overlay: &InfoOverlay) {
        self.ops.push(MapOp::OpenInfoWindow {
            post_id: post_id.to_string(),
            overlay: overlay.clone(),
        });
    }

    fn close_info_window(&mut self, post_id: &str) {
        self.ops.push(MapOp::CloseInfoWindow {
            post_id: post_id.to_string(),
        });
    }
}
