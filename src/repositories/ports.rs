// src/repositories/ports.rs - contracts the pipeline depends on
//
// The document store, the object store and the geolocation sensor are
// external collaborators. Handlers and the upload orchestrator only ever see
// these traits; the Firebase/Google adapters and the in-memory test fakes
// both implement them.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::geo::GeoPoint;
use crate::models::post::{Post, PostRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("firebase error: {0}")]
    Firebase(String),
    #[error("geolocation error: {0}")]
    Geolocation(String),
    #[error("other: {0}")]
    Other(String),
}

/// Document store for post records, keyed posts/{owner}/{postId}.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Hand out a post id before anything is written, so asset paths can be
    /// derived from it.
    async fn reserve_id(&self, owner_id: &str) -> Result<String, StoreError>;

    /// Write one complete post record. Called exactly once per submission,
    /// after every asset write has succeeded.
    async fn create(
        &self,
        owner_id: &str,
        post_id: &str,
        record: &PostRecord,
    ) -> Result<(), StoreError>;

    /// All posts of one owner, in storage order.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, StoreError>;

    /// One post, or None when it does not exist.
    async fn get(&self, owner_id: &str, post_id: &str) -> Result<Option<Post>, StoreError>;
}

/// Object store for image bytes.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store bytes under `path` and return a public download URL.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

/// Device-level location sensing. Consulted only when the first image carries
/// no embedded GPS fix.
#[async_trait]
pub trait GeolocationService: Send + Sync {
    async fn request_permission(&self) -> PermissionState;
    async fn current_position(&self) -> Result<GeoPoint, StoreError>;
}
