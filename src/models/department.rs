use serde::{Deserialize, Serialize};

/// A department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Row id.
    pub id: i64,
    /// Unique name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
}
