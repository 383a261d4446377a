//! Shop Model

use serde::{Deserialize, Serialize};

/// Shop entity (tenant boundary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
}
