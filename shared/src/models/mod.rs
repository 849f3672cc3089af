//! Domain models for the branch inventory ledger

mod adjustment;
mod branch;
mod inventory;
mod ledger;
mod purchase;
mod transfer;

pub use adjustment::*;
pub use branch::*;
pub use inventory::*;
pub use ledger::*;
pub use purchase::*;
pub use transfer::*;
