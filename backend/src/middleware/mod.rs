//! Request middleware

pub mod auth;

pub use auth::{auth_middleware, Access, AuthUser, Claims, CurrentUser, Role};
