pub mod firebase_asset_store;
pub mod firebase_post_store;
pub mod google_geolocation;
pub mod ports;
