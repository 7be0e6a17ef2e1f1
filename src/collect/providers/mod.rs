pub mod catalog;
pub mod metadata_http;
