use serde::{Deserialize, Serialize};

/// Locally curated allow-list entry of an assignable user, distinct from the
/// full Jira directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssigneeUser {
    pub id: i64,
    pub display_name: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
}

/// Payload for onboarding a new assignable user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssigneeUser {
    pub display_name: String,
    pub username: String,
    pub email: String,
}

/// Hit from the live Jira directory search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySearchHit {
    pub account_id: String,
    pub display_name: String,
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Current assignee of one ticket, from the bulk lookup endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAssignee {
    pub ticket_key: String,
    pub display_name: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One ticket in a bulk assignee update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssigneeChange {
    pub ticket_key: String,
    pub assignee_username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub comment: String,
}

/// Per-ticket outcome of a bulk assignee update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssigneeUpdateResult {
    pub ticket_key: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_set: Option<String>,
    #[serde(default)]
    pub comment_added: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full response of a bulk assignee update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssigneeResponse {
    pub results: Vec<AssigneeUpdateResult>,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}
