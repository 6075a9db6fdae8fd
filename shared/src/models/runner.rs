//! Runner Model

use serde::{Deserialize, Serialize};

/// Staff member delivering orders, scoped to one event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub pin_hash: Option<String>,
    pub active: bool,
    pub event_id: String,
    pub created_at: i64,
}
