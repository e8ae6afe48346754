//! aerostore - A content-addressed, self-hostable file store
//!
//! Files are stored once per SHA-256 digest of their bytes and served over
//! a small HTTP API.

pub mod cli;
pub mod file_storage;
pub mod http_server;
pub mod observability;
