pub mod board_query;
pub mod location_resolver;
pub mod marker_lifecycle;
pub mod metadata_extractor;
pub mod upload_orchestrator;
