pub mod board_handlers;
pub mod post_handlers;
pub mod upload_handlers;
