// src/services/upload_orchestrator.rs - multi-image submission pipeline
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::models::geo::GeoPoint;
use crate::models::post::{format_captured_at, slot_key, ImageEntry, Post, PostRecord};
use crate::repositories::ports::{AssetStore, GeolocationService, PostStore};
use crate::services::{location_resolver, metadata_extractor};

/// The upload form never offers more than ten images.
pub const MAX_IMAGES_PER_POST: usize = 10;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no resolvable location for this post")]
    MissingLocation,
    #[error("could not read image metadata: {0}")]
    Extraction(String),
    #[error("asset upload failed at {slot}: {reason}")]
    AssetWrite { slot: String, reason: String },
    #[error("post record write failed: {0}")]
    RecordWrite(String),
}

/// One raw file inside a submission. Position 0 becomes the thumbnail.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub position: usize,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    pub extension: String,
}

impl ImageAsset {
    pub fn new(position: usize, bytes: Vec<u8>, file_name: String, content_type: String) -> Self {
        let extension = extension_for(&content_type, &file_name);
        Self {
            position,
            bytes,
            file_name,
            content_type,
            extension,
        }
    }
}

/// Storage extension from the declared content type, with the file name as
/// fallback for anything outside the usual set.
fn extension_for(content_type: &str, file_name: &str) -> String {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        "image/gif" => "gif".to_string(),
        "image/webp" => "webp".to_string(),
        _ => {
            if file_name.contains('.') {
                file_name.rsplit('.').next().unwrap_or("jpg").to_lowercase()
            } else {
                "jpg".to_string()
            }
        }
    }
}

/// Everything the user submitted for one post.
#[derive(Debug)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    /// Explicit date from the form's date field. Overrides the EXIF date.
    pub capture_date_override: Option<NaiveDate>,
    /// Explicit map pick. Overrides every other location source.
    pub selected_location: Option<GeoPoint>,
    pub images: Vec<ImageAsset>,
}

/// Sequences a whole submission: metadata from the first image, location
/// resolution, per-slot asset writes, then exactly one post record.
pub struct UploadOrchestrator {
    posts: Arc<dyn PostStore>,
    assets: Arc<dyn AssetStore>,
    geolocation: Arc<dyn GeolocationService>,
}

impl UploadOrchestrator {
    pub fn new(
        posts: Arc<dyn PostStore>,
        assets: Arc<dyn AssetStore>,
        geolocation: Arc<dyn GeolocationService>,
    ) -> Self {
        Self {
            posts,
            assets,
            geolocation,
        }
    }

    pub async fn submit(&self, owner_id: &str, request: UploadRequest) -> Result<Post, UploadError> {
        // Precondition checks happen before any store interaction.
        if request.images.is_empty() {
            return Err(UploadError::InvalidInput("no images selected".to_string()));
        }
        if request.images.len() > MAX_IMAGES_PER_POST {
            return Err(UploadError::InvalidInput(format!(
                "at most {} images per post",
                MAX_IMAGES_PER_POST
            )));
        }

        // Only the first image feeds location/date inference. Later images
        // are stored as-is and their metadata never aborts a submission.
        let first = &request.images[0];
        let metadata = metadata_extractor::extract(&first.bytes, &first.content_type)
            .map_err(|e| UploadError::Extraction(e.to_string()))?;

        let location = location_resolver::resolve(
            request.selected_location,
            metadata.location,
            self.geolocation.as_ref(),
        )
        .await
        .ok_or(UploadError::MissingLocation)?;

        // Id first, so every asset path is known before the first byte moves.
        let post_id = self
            .posts
            .reserve_id(owner_id)
            .await
            .map_err(|e| UploadError::RecordWrite(e.to_string()))?;

        // Concurrent writes, but the joined results come back in input order:
        // slot assignment is positional, never completion order. A failure at
        // any slot aborts the submission; assets already stored stay behind
        // as orphans (no cleanup pass exists, known gap).
        let uploads = request.images.iter().map(|asset| {
            let slot = asset.position + 1;
            let path = format!(
                "images/{}/{}/img{}.{}",
                owner_id, post_id, slot, asset.extension
            );
            let assets = Arc::clone(&self.assets);
            let bytes = asset.bytes.clone();
            let content_type = asset.content_type.clone();
            async move {
                let url = assets
                    .put(&path, bytes, &content_type)
                    .await
                    .map_err(|e| UploadError::AssetWrite {
                        slot: slot_key(slot),
                        reason: e.to_string(),
                    })?;
                Ok::<(String, ImageEntry), UploadError>((
                    slot_key(slot),
                    ImageEntry {
                        url,
                        is_thumbnail: slot == 1,
                    },
                ))
            }
        });
        let entries = futures::future::try_join_all(uploads).await?;
        let images: BTreeMap<String, ImageEntry> = entries.into_iter().collect();

        // EXIF proposes the capture date, the user's edit wins, today is the
        // final fallback.
        let capture_date = request
            .capture_date_override
            .or(metadata.date)
            .unwrap_or_else(|| Utc::now().date_naive());

        let record = PostRecord {
            latitude: location.lat,
            longitude: location.lng,
            title: request.title,
            description: request.description,
            created_at: Utc::now().to_rfc3339(),
            captured_at: format_captured_at(capture_date),
            images,
        };

        self.posts
            .create(owner_id, &post_id, &record)
            .await
            .map_err(|e| UploadError::RecordWrite(e.to_string()))?;

        Ok(Post {
            id: post_id,
            owner_id: owner_id.to_string(),
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::repositories::ports::{PermissionState, StoreError};

    struct MemoryPostStore {
        next_id: AtomicUsize,
        created: Mutex<Vec<(String, String, PostRecord)>>,
        fail_create: bool,
    }

    impl MemoryPostStore {
        fn new() -> Self {
            Self {
                next_id: AtomicUsize::new(1),
                created: Mutex::new(Vec::new()),
                fail_create: false,
            }
        }

        fn failing_create(mut self) -> Self {
            self.fail_create = true;
            self
        }

        fn create_count(&self) -> usize {
            self.created.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PostStore for MemoryPostStore {
        async fn reserve_id(&self, _owner_id: &str) -> Result<String, StoreError> {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(format!("post{}", n))
        }

        async fn create(
            &self,
            owner_id: &str,
            post_id: &str,
            record: &PostRecord,
        ) -> Result<(), StoreError> {
            if self.fail_create {
                return Err(StoreError::Firebase("write denied".to_string()));
            }
            self.created.lock().unwrap().push((
                owner_id.to_string(),
                post_id.to_string(),
                record.clone(),
            ));
            Ok(())
        }

        async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, StoreError> {
            Ok(self
                .created
                .lock()
                .unwrap()
                .iter()
                .filter(|(owner, _, _)| owner == owner_id)
                .map(|(owner, id, record)| Post {
                    id: id.clone(),
                    owner_id: owner.clone(),
                    record: record.clone(),
                })
                .collect())
        }

        async fn get(&self, owner_id: &str, post_id: &str) -> Result<Option<Post>, StoreError> {
            Ok(self
                .list_by_owner(owner_id)
                .await?
                .into_iter()
                .find(|post| post.id == post_id))
        }
    }

    /// Asset store fake that can delay or fail specific slots.
    struct MemoryAssetStore {
        writes: Mutex<Vec<String>>,
        slow_slot: Option<usize>,
        failing_slot: Option<usize>,
    }

    impl MemoryAssetStore {
        fn new() -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                slow_slot: None,
                failing_slot: None,
            }
        }

        fn slow_at(mut self, slot: usize) -> Self {
            self.slow_slot = Some(slot);
            self
        }

        fn failing_at(mut self, slot: usize) -> Self {
            self.failing_slot = Some(slot);
            self
        }

        fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }

        fn slot_of(path: &str) -> usize {
            let name = path.rsplit('/').next().unwrap_or_default();
            name.trim_start_matches("img")
                .split('.')
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl AssetStore for MemoryAssetStore {
        async fn put(
            &self,
            path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, StoreError> {
            let slot = Self::slot_of(path);
            if self.slow_slot == Some(slot) {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            if self.failing_slot == Some(slot) {
                return Err(StoreError::Firebase("upload rejected".to_string()));
            }
            self.writes.lock().unwrap().push(path.to_string());
            Ok(format!("https://assets.test/{}", path))
        }
    }

    struct StubGeolocation {
        permission: PermissionState,
        position: Option<GeoPoint>,
    }

    #[async_trait]
    impl GeolocationService for StubGeolocation {
        async fn request_permission(&self) -> PermissionState {
            self.permission
        }

        async fn current_position(&self) -> Result<GeoPoint, StoreError> {
            self.position
                .ok_or_else(|| StoreError::Geolocation("no fix".to_string()))
        }
    }

    fn jpeg_bytes() -> Vec<u8> {
        // A JPEG SOI marker is enough: no EXIF inside, extraction yields
        // empty metadata and the pipeline moves on.
        vec![0xFF, 0xD8, 0xFF, 0xD9]
    }

    fn image(position: usize, name: &str) -> ImageAsset {
        ImageAsset::new(
            position,
            jpeg_bytes(),
            name.to_string(),
            "image/jpeg".to_string(),
        )
    }

    fn request_with(images: Vec<ImageAsset>, selected: Option<GeoPoint>) -> UploadRequest {
        UploadRequest {
            title: "나들이".to_string(),
            description: "한강에서".to_string(),
            capture_date_override: None,
            selected_location: selected,
            images,
        }
    }

    fn orchestrator(
        posts: Arc<MemoryPostStore>,
        assets: Arc<MemoryAssetStore>,
        geo: StubGeolocation,
    ) -> UploadOrchestrator {
        UploadOrchestrator::new(posts, assets, Arc::new(geo))
    }

    fn denied() -> StubGeolocation {
        StubGeolocation {
            permission: PermissionState::Denied,
            position: None,
        }
    }

    #[tokio::test]
    async fn empty_image_list_fails_before_any_write() {
        let posts = Arc::new(MemoryPostStore::new());
        let assets = Arc::new(MemoryAssetStore::new());
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), denied());

        let result = orch.submit("uid1", request_with(vec![], None)).await;

        assert!(matches!(result, Err(UploadError::InvalidInput(_))));
        assert_eq!(posts.create_count(), 0);
        assert_eq!(assets.write_count(), 0);
    }

    #[tokio::test]
    async fn unresolvable_location_fails_before_any_write() {
        let posts = Arc::new(MemoryPostStore::new());
        let assets = Arc::new(MemoryAssetStore::new());
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), denied());

        let result = orch
            .submit("uid1", request_with(vec![image(0, "a.jpg")], None))
            .await;

        assert!(matches!(result, Err(UploadError::MissingLocation)));
        assert_eq!(posts.create_count(), 0);
        assert_eq!(assets.write_count(), 0);
    }

    #[tokio::test]
    async fn slots_follow_input_order_even_when_a_later_image_finishes_first() {
        let posts = Arc::new(MemoryPostStore::new());
        // img1 is the slow one, so img2 and img3 complete before it.
        let assets = Arc::new(MemoryAssetStore::new().slow_at(1));
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), denied());

        let request = request_with(
            vec![image(0, "a.jpg"), image(1, "b.jpg"), image(2, "c.jpg")],
            Some(GeoPoint::new(37.5665, 126.9780)),
        );
        let post = orch.submit("uid1", request).await.unwrap();

        let slot_urls: Vec<(&str, &str)> = post
            .record
            .ordered_images()
            .iter()
            .map(|(key, entry)| (*key, entry.url.as_str()))
            .collect();
        assert_eq!(slot_urls.len(), 3);
        assert!(slot_urls[0].1.ends_with("img1.jpg"));
        assert!(slot_urls[1].1.ends_with("img2.jpg"));
        assert!(slot_urls[2].1.ends_with("img3.jpg"));
        assert_eq!(slot_urls[0].0, "img1");
        assert_eq!(slot_urls[1].0, "img2");
        assert_eq!(slot_urls[2].0, "img3");
    }

    #[tokio::test]
    async fn device_location_carries_the_post_when_nothing_else_resolves() {
        let posts = Arc::new(MemoryPostStore::new());
        let assets = Arc::new(MemoryAssetStore::new());
        let geo = StubGeolocation {
            permission: PermissionState::Granted,
            position: Some(GeoPoint::new(35.1796, 129.0756)),
        };
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), geo);

        let request = request_with(vec![image(0, "a.jpg"), image(1, "b.jpg")], None);
        let post = orch.submit("uid1", request).await.unwrap();

        assert_eq!(post.record.latitude, 35.1796);
        assert_eq!(post.record.longitude, 129.0756);
        assert!(post.record.images.get("img1").unwrap().is_thumbnail);
        assert!(!post.record.images.get("img2").unwrap().is_thumbnail);
        assert_eq!(posts.create_count(), 1);
    }

    #[tokio::test]
    async fn selected_location_wins_over_device() {
        let posts = Arc::new(MemoryPostStore::new());
        let assets = Arc::new(MemoryAssetStore::new());
        let geo = StubGeolocation {
            permission: PermissionState::Granted,
            position: Some(GeoPoint::new(35.1796, 129.0756)),
        };
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), geo);

        let request = request_with(
            vec![image(0, "a.jpg")],
            Some(GeoPoint::new(37.5665, 126.9780)),
        );
        let post = orch.submit("uid1", request).await.unwrap();

        assert_eq!(post.record.latitude, 37.5665);
        assert_eq!(post.record.longitude, 126.9780);
    }

    #[tokio::test]
    async fn one_failed_asset_aborts_the_whole_submission() {
        let posts = Arc::new(MemoryPostStore::new());
        let assets = Arc::new(MemoryAssetStore::new().failing_at(2));
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), denied());

        let request = request_with(
            vec![image(0, "a.jpg"), image(1, "b.jpg"), image(2, "c.jpg")],
            Some(GeoPoint::new(37.5665, 126.9780)),
        );
        let result = orch.submit("uid1", request).await;

        match result {
            Err(UploadError::AssetWrite { slot, .. }) => assert_eq!(slot, "img2"),
            other => panic!("expected AssetWrite, got {:?}", other.map(|p| p.id)),
        }
        // No post record may exist after a failed submission.
        assert_eq!(posts.create_count(), 0);
    }

    #[tokio::test]
    async fn failed_record_write_surfaces_after_all_assets_landed() {
        let posts = Arc::new(MemoryPostStore::new().failing_create());
        let assets = Arc::new(MemoryAssetStore::new());
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), denied());

        let request = request_with(
            vec![image(0, "a.jpg"), image(1, "b.jpg")],
            Some(GeoPoint::new(37.5665, 126.9780)),
        );
        let result = orch.submit("uid1", request).await;

        assert!(matches!(result, Err(UploadError::RecordWrite(_))));
        // Every asset write already went through; those objects stay behind.
        assert_eq!(assets.write_count(), 2);
        assert_eq!(posts.create_count(), 0);
    }

    #[tokio::test]
    async fn user_date_override_is_stored_as_yy_mm_dd() {
        let posts = Arc::new(MemoryPostStore::new());
        let assets = Arc::new(MemoryAssetStore::new());
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), denied());

        let mut request = request_with(
            vec![image(0, "a.jpg")],
            Some(GeoPoint::new(37.5665, 126.9780)),
        );
        request.capture_date_override = chrono::NaiveDate::from_ymd_opt(2025, 6, 3);
        let post = orch.submit("uid1", request).await.unwrap();

        assert_eq!(post.record.captured_at, "25/06/03");
    }

    #[tokio::test]
    async fn too_many_images_is_invalid_input() {
        let posts = Arc::new(MemoryPostStore::new());
        let assets = Arc::new(MemoryAssetStore::new());
        let orch = orchestrator(Arc::clone(&posts), Arc::clone(&assets), denied());

        let images: Vec<ImageAsset> = (0..11).map(|i| image(i, "a.jpg")).collect();
        let result = orch
            .submit(
                "uid1",
                request_with(images, Some(GeoPoint::new(37.5665, 126.9780))),
            )
            .await;

        assert!(matches!(result, Err(UploadError::InvalidInput(_))));
        assert_eq!(assets.write_count(), 0);
    }

    #[test]
    fn extension_prefers_content_type_then_file_name() {
        assert_eq!(extension_for("image/jpeg", "photo.HEIC"), "jpg");
        assert_eq!(extension_for("image/png", "photo"), "png");
        assert_eq!(extension_for("image/heic", "photo.HEIC"), "heic");
        assert_eq!(extension_for("image/heic", "photo"), "jpg");
    }
}
