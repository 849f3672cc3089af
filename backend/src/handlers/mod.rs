//! HTTP request handlers

pub mod adjustments;
pub mod health;
pub mod items;
pub mod purchases;
pub mod reports;
pub mod transfers;

pub use adjustments::*;
pub use health::*;
pub use items::*;
pub use purchases::*;
pub use reports::*;
pub use transfers::*;
