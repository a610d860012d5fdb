use crate::ids::{ReservationId, UserId};

/// What happened to a reservation
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Created,
    Amended,
    StatusChanged,
    Cancelled,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "CREATED",
            ChangeKind::Amended => "AMENDED",
            ChangeKind::StatusChanged => "STATUS_CHANGED",
            ChangeKind::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(ChangeKind::Created),
            "AMENDED" => Some(ChangeKind::Amended),
            "STATUS_CHANGED" => Some(ChangeKind::StatusChanged),
            "CANCELLED" => Some(ChangeKind::Cancelled),
            _ => None,
        }
    }
}

/// Audit record appended after every successful mutation
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ReservationChange {
    pub reservation_id: ReservationId,
    pub kind: ChangeKind,
    pub from: Option<serde_json::Value>,
    pub to: Option<serde_json::Value>,
    pub actor: UserId,
    pub timestamp: i64,
}
