use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of mutating action recorded in the backend audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    LabelUpdate,
    CommentAdded,
    UpdateFailed,
    AssigneeUpdate,
    AssigneeFailed,
    UserAdded,
    UserRemoved,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LabelUpdate => "label_update",
            AuditAction::CommentAdded => "comment_added",
            AuditAction::UpdateFailed => "update_failed",
            AuditAction::AssigneeUpdate => "assignee_update",
            AuditAction::AssigneeFailed => "assignee_failed",
            AuditAction::UserAdded => "user_added",
            AuditAction::UserRemoved => "user_removed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "label_update" => Some(AuditAction::LabelUpdate),
            "comment_added" => Some(AuditAction::CommentAdded),
            "update_failed" => Some(AuditAction::UpdateFailed),
            "assignee_update" => Some(AuditAction::AssigneeUpdate),
            "assignee_failed" => Some(AuditAction::AssigneeFailed),
            "user_added" => Some(AuditAction::UserAdded),
            "user_removed" => Some(AuditAction::UserRemoved),
            _ => None,
        }
    }

    /// Short marker rendered in the history listing.
    pub fn glyph(&self) -> &'static str {
        match self {
            AuditAction::LabelUpdate => "+L",
            AuditAction::CommentAdded => "+C",
            AuditAction::UpdateFailed => "!!",
            AuditAction::AssigneeUpdate => "+A",
            AuditAction::AssigneeFailed => "!A",
            AuditAction::UserAdded => "+U",
            AuditAction::UserRemoved => "-U",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AuditAction::LabelUpdate => "label updated",
            AuditAction::CommentAdded => "comment added",
            AuditAction::UpdateFailed => "update failed",
            AuditAction::AssigneeUpdate => "assignee updated",
            AuditAction::AssigneeFailed => "assignee update failed",
            AuditAction::UserAdded => "assignee user added",
            AuditAction::UserRemoved => "assignee user removed",
        }
    }
}

/// Immutable backend-owned record of a past action. Read-only on this side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    pub ticket_key: String,
    pub action: AuditAction,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub details: String,
}

/// One page of audit entries plus the total count across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    pub total: usize,
}
