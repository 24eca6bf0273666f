// src/repositories/firebase_post_store.rs - PostStore over the RTDB REST API
use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::models::post::{Post, PostRecord};
use crate::repositories::ports::{PostStore, StoreError};

/// Post records live in the Realtime Database under `posts/{owner}/{postId}`,
/// accessed through its REST endpoint (`.json` suffix per node).
#[derive(Clone)]
pub struct FirebasePostStore {
    client: Client,
    /// e.g. https://<project>-default-rtdb.firebaseio.com
    database_url: String,
    /// Optional `auth=` query value (database secret or service token).
    auth_token: Option<String>,
}

impl FirebasePostStore {
    pub fn new(client: Client, database_url: String, auth_token: Option<String>) -> Self {
        Self {
            client,
            database_url: database_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    fn node_url(&self, path: &str) -> String {
        match &self.auth_token {
            Some(token) => format!("{}/{}.json?auth={}", self.database_url, path, token),
            None => format!("{}/{}.json", self.database_url, path),
        }
    }
}

#[async_trait]
impl PostStore for FirebasePostStore {
    /// RTDB push ids are generated client-side, so reserving an id costs no
    /// write. A v4 uuid in simple form keeps asset paths URL-safe.
    async fn reserve_id(&self, _owner_id: &str) -> Result<String, StoreError> {
        Ok(Uuid::new_v4().simple().to_string())
    }

    async fn create(
        &self,
        owner_id: &str,
        post_id: &str,
        record: &PostRecord,
    ) -> Result<(), StoreError> {
        let url = self.node_url(&format!("posts/{}/{}", owner_id, post_id));

        let resp = self.client.put(&url).json(record).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StoreError::Firebase(format!(
                "create post failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, StoreError> {
        let url = self.node_url(&format!("posts/{}", owner_id));

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Firebase(format!(
                "list posts failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }

        // A node with no children comes back as literal `null`.
        let value: serde_json::Value = serde_json::from_str(&text)?;
        if value.is_null() {
            return Ok(Vec::new());
        }

        let records: BTreeMap<String, PostRecord> = serde_json::from_value(value)?;
        Ok(records
            .into_iter()
            .map(|(id, record)| Post {
                id,
                owner_id: owner_id.to_string(),
                record,
            })
            .collect())
    }

    async fn get(&self, owner_id: &str, post_id: &str) -> Result<Option<Post>, StoreError> {
        let url = self.node_url(&format!("posts/{}/{}", owner_id, post_id));

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Firebase(format!(
                "get post failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }

        let value: serde_json::Value = serde_json::from_str(&text)?;
        if value.is_null() {
            return Ok(None);
        }
        let record: PostRecord = serde_json::from_value(value)?;
        Ok(Some(Post {
            id: post_id.to_string(),
            owner_id: owner_id.to_string(),
            record,
        }))
    }
}
