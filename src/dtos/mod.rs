pub mod board_dtos;
pub mod upload_dtos;
