//! Models for the school inventory service
//!
//! Re-exports domain models from the shared crate and adds the HTTP request
//! and query payloads

pub mod requests;

pub use requests::*;
pub use shared::models::*;
