// src/main.rs
mod config;
mod dtos;
mod handlers;
mod middleware;
mod models;
mod repositories;
mod services;

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use reqwest::Client;

use crate::handlers::board_handlers::{board_view, list_regions, sync_markers};
use crate::handlers::post_handlers::{get_post, list_posts};
use crate::handlers::upload_handlers::create_post;
use crate::repositories::firebase_asset_store::FirebaseAssetStore;
use crate::repositories::firebase_post_store::FirebasePostStore;
use crate::repositories::google_geolocation::GoogleGeolocation;
use crate::repositories::ports::{AssetStore, GeolocationService, PostStore};
use crate::services::marker_lifecycle::MarkerLifecycleController;
use crate::services::upload_orchestrator::UploadOrchestrator;

fn mask_key(k: &str) -> String {
    if k.len() <= 8 {
        "[REDACTED]".to_string()
    } else {
        format!("{}***{}", &k[..4], &k[k.len() - 4..])
    }
}

#[derive(Clone)]
pub struct AppState {
    pub post_store: Arc<dyn PostStore>,
    pub asset_store: Arc<dyn AssetStore>,
    pub geolocation: Arc<dyn GeolocationService>,
    /// One marker session per board owner; recomputed whole per filter
    /// change. Bounded by the number of distinct authenticated owners, no
    /// eviction beyond process restart.
    pub marker_sessions: Arc<Mutex<HashMap<String, MarkerLifecycleController>>>,
}

impl AppState {
    pub fn orchestrator(&self) -> UploadOrchestrator {
        UploadOrchestrator::new(
            Arc::clone(&self.post_store),
            Arc::clone(&self.asset_store),
            Arc::clone(&self.geolocation),
        )
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let firebase = match config::firebase_config_from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load Firebase config: {}", e);
            std::process::exit(1);
        }
    };

    info!("Database URL: {}", firebase.database_url);
    info!("Storage bucket: {}", firebase.storage_bucket);
    if let Some(ref secret) = firebase.database_secret {
        info!("Database secret: {}", mask_key(secret));
    }

    let http_client = Client::builder()
        .user_agent("photomap-be/0.1")
        .build()
        .expect("failed to build http client");

    let post_store = FirebasePostStore::new(
        http_client.clone(),
        firebase.database_url.clone(),
        firebase.database_secret.clone(),
    );
    let asset_store =
        FirebaseAssetStore::new(http_client.clone(), firebase.storage_bucket.clone());
    let geolocation =
        GoogleGeolocation::new(http_client.clone(), firebase.geolocation_api_key.clone());

    let state = web::Data::new(AppState {
        post_store: Arc::new(post_store),
        asset_store: Arc::new(asset_store),
        geolocation: Arc::new(geolocation),
        marker_sessions: Arc::new(Mutex::new(HashMap::new())),
    });

    let allowed_origins = env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into());

    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                "authorization",
                "content-type",
                "accept",
                "x-requested-with",
            ])
            .supports_credentials()
            .max_age(3600);

        for origin in allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .service(create_post) // POST /api/posts
                    .service(list_posts) // GET  /api/posts
                    .service(get_post) // GET  /api/posts/{post_id}
                    .service(board_view) // GET  /api/board
                    .service(sync_markers) // POST /api/board/markers
                    .service(list_regions), // GET  /api/regions
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
