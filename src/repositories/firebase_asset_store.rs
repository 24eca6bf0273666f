// src/repositories/firebase_asset_store.rs - AssetStore over the Storage REST API
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use urlencoding::encode;

use crate::repositories::ports::{AssetStore, StoreError};

pub const STORAGE_API_BASE: &str = "https://firebasestorage.googleapis.com";

/// Image bytes go to Cloud Storage for Firebase through its upload endpoint.
/// Object names follow `images/{owner}/{postId}/img{slot}.{ext}`.
#[derive(Clone)]
pub struct FirebaseAssetStore {
    client: Client,
    api_base: String,
    bucket: String,
}

impl FirebaseAssetStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self::with_api_base(client, STORAGE_API_BASE.to_string(), bucket)
    }

    pub fn with_api_base(client: Client, api_base: String, bucket: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bucket,
        }
    }
}

#[async_trait]
impl AssetStore for FirebaseAssetStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let upload_url = format!(
            "{}/v0/b/{}/o?uploadType=media&name={}",
            self.api_base,
            self.bucket,
            encode(path)
        );

        let resp = self
            .client
            .post(&upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Firebase(format!(
                "asset upload failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }

        // The upload response carries the download token the public URL needs.
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let download_url = match value.get("downloadTokens").and_then(|t| t.as_str()) {
            Some(token) => format!(
                "{}/v0/b/{}/o/{}?alt=media&token={}",
                self.api_base,
                self.bucket,
                encode(path),
                token
            ),
            None => format!(
                "{}/v0/b/{}/o/{}?alt=media",
                self.api_base,
                self.bucket,
                encode(path)
            ),
        };
        Ok(download_url)
    }
}
