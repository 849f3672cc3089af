//! Shared types and models for the school inventory ledger
//!
//! This crate contains the domain types shared between the backend service
//! and other components of the school-management platform.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
