use std::env;

use anyhow::{Context, Result};

/// Everything the store adapters need, read once at startup.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// e.g. https://<project>-default-rtdb.firebaseio.com
    pub database_url: String,
    /// e.g. <project>.appspot.com
    pub storage_bucket: String,
    /// Optional database secret appended as `auth=` on RTDB requests.
    pub database_secret: Option<String>,
    /// Google Geolocation API key; absent means device sensing is off.
    pub geolocation_api_key: Option<String>,
}

pub fn firebase_config_from_env() -> Result<FirebaseConfig> {
    Ok(FirebaseConfig {
        database_url: env::var("FIREBASE_DATABASE_URL")
            .context("FIREBASE_DATABASE_URL not set")?
            .trim()
            .trim_end_matches('/')
            .to_string(),
        storage_bucket: env::var("FIREBASE_STORAGE_BUCKET")
            .context("FIREBASE_STORAGE_BUCKET not set")?
            .trim()
            .to_string(),
        database_secret: env::var("FIREBASE_DATABASE_SECRET").ok(),
        geolocation_api_key: env::var("GOOGLE_GEOLOCATION_API_KEY").ok(),
    })
}
