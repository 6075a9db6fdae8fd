//! Order Model

use serde::{Deserialize, Serialize};

use super::item::Unit;

/// Order workflow status
///
/// `new -> in_progress -> en_route -> delivered`, with two operator
/// corrections: `new -> delivered` and `delivered|en_route -> new`.
/// Archival is tracked by `Order::archived_at`, not by a status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    InProgress,
    EnRoute,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        Self::New,
        Self::InProgress,
        Self::EnRoute,
        Self::Delivered,
    ];

    /// Parse from database (or request) string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "in_progress" => Some(Self::InProgress),
            "en_route" => Some(Self::EnRoute),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::EnRoute => "en_route",
            Self::Delivered => "delivered",
        }
    }

    /// Statuses an order must currently be in to move to `self`.
    ///
    /// Keyed by destination: the UI offers one "advance" action per order
    /// and the legal predecessor set depends on where it is going.
    pub fn allowed_predecessors(&self) -> &'static [OrderStatus] {
        match self {
            Self::InProgress => &[Self::New],
            Self::EnRoute => &[Self::InProgress],
            Self::Delivered => &[Self::EnRoute, Self::New],
            Self::New => &[Self::EnRoute, Self::Delivered],
        }
    }

    /// Whether `from -> self` is a legal transition
    pub fn can_follow(&self, from: OrderStatus) -> bool {
        self.allowed_predecessors().contains(&from)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Order priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

impl Priority {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    /// Lenient parse for client input: anything unrecognised is normal.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        s.and_then(|v| Self::from_db(v.trim())).unwrap_or_default()
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
        }
    }
}

/// Replenishment order placed by a location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub event_id: String,
    pub location_id: String,
    pub status: OrderStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
    pub archived_at: Option<i64>,
}

impl Order {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Order line, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub order_id: String,
    pub item_id: String,
    pub qty: f64,
    pub unit: Unit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_walk() {
        assert!(OrderStatus::InProgress.can_follow(OrderStatus::New));
        assert!(OrderStatus::EnRoute.can_follow(OrderStatus::InProgress));
        assert!(OrderStatus::Delivered.can_follow(OrderStatus::EnRoute));
    }

    #[test]
    fn test_operator_corrections() {
        assert!(OrderStatus::Delivered.can_follow(OrderStatus::New));
        assert!(OrderStatus::New.can_follow(OrderStatus::Delivered));
        assert!(OrderStatus::New.can_follow(OrderStatus::EnRoute));
    }

    #[test]
    fn test_no_extra_edges() {
        let legal = [
            (OrderStatus::New, OrderStatus::InProgress),
            (OrderStatus::InProgress, OrderStatus::EnRoute),
            (OrderStatus::EnRoute, OrderStatus::Delivered),
            (OrderStatus::New, OrderStatus::Delivered),
            (OrderStatus::EnRoute, OrderStatus::New),
            (OrderStatus::Delivered, OrderStatus::New),
        ];
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(
                    to.can_follow(from),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_status_db_values() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(OrderStatus::from_db("archived"), None);
        assert_eq!(
            serde_json::to_value(OrderStatus::EnRoute).unwrap(),
            "en_route"
        );
    }

    #[test]
    fn test_priority_lenient() {
        assert_eq!(Priority::parse_lenient(Some("urgent")), Priority::Urgent);
        assert_eq!(Priority::parse_lenient(Some(" urgent ")), Priority::Urgent);
        assert_eq!(Priority::parse_lenient(Some("asap")), Priority::Normal);
        assert_eq!(Priority::parse_lenient(None), Priority::Normal);
    }
}
