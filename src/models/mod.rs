pub mod geo;
pub mod post;
