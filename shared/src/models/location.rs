//! Location Model

use serde::{Deserialize, Serialize};

/// Kind of stand placing orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    #[default]
    Bar,
    Food,
}

impl LocationType {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "bar" => Some(Self::Bar),
            "food" => Some(Self::Food),
            _ => None,
        }
    }

    /// Lenient parse for display: anything but "food" is a bar.
    pub fn normalize(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("food") {
            Self::Food
        } else {
            Self::Bar
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Food => "food",
        }
    }
}

/// Location entity (bar or food stand), scoped to one event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    /// Opaque routing token used in the unlock URL
    pub public_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub active: bool,
    #[serde(skip_serializing, default)]
    pub pin_hash: Option<String>,
    pub event_id: String,
}
