//! # AeroStore HTTP Server Module
//!
//! Thin axum adapter over `FileService`.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `POST /files` - Upload (multipart field `f`)
//! - `GET /files/:hash` - Download (`If-None-Match`, `Range`)
//! - `DELETE /files/:hash` - Delete

pub mod conditional;
pub mod config;
pub mod errors;
pub mod file_routes;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::ApiError;
pub use server::HttpServer;
