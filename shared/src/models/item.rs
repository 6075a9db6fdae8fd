//! Item Model

use serde::{Deserialize, Serialize};

/// Unit an item is ordered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Piece,
    Case,
}

impl Unit {
    /// Parse from database (or request) string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "piece" => Some(Self::Piece),
            "case" => Some(Self::Case),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Piece => "piece",
            Self::Case => "case",
        }
    }
}

/// Catalogue item (global, not event scoped)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub default_unit: Unit,
    /// Units per case, positive when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_size: Option<i32>,
    pub active: bool,
}

/// Assignment of an item to a location within an event
///
/// Unique per (event_id, location_id, item_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationItem {
    pub event_id: String,
    pub location_id: String,
    pub item_id: String,
    pub active: bool,
    pub sort: i32,
}
