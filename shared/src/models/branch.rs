//! Institution and branch models
//!
//! Branches are owned by the wider school-management application; the
//! inventory ledger only reads them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical school location, the scoping unit for inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub institution_id: Uuid,
    pub name: String,
}

impl Branch {
    /// Whether two branches belong to the same institution
    pub fn is_sibling_of(&self, other: &Branch) -> bool {
        self.institution_id == other.institution_id
    }
}
