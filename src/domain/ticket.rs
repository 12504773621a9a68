use serde::{Deserialize, Serialize};

use crate::domain::label::compose_results_label;
use crate::error::{AppError, AppResult};

/// How a ticket's existing results labels are treated on submission.
///
/// `Replace` drops the existing results-family labels before applying the new
/// one, `Add` appends alongside them, `Skip` applies no label at all but
/// still posts the ticket's comment when one is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAction {
    Replace,
    Add,
    Skip,
}

impl Default for LabelAction {
    fn default() -> Self {
        LabelAction::Add
    }
}

impl LabelAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelAction::Replace => "replace",
            LabelAction::Add => "add",
            LabelAction::Skip => "skip",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "replace" => Some(LabelAction::Replace),
            "add" => Some(LabelAction::Add),
            "skip" => Some(LabelAction::Skip),
            _ => None,
        }
    }
}

/// One row of the working set: a ticket queued for the next bulk submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEntry {
    pub id: u64,
    pub ticket_key: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub flow: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub failing_cmd: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub label_action: LabelAction,
    /// Error string returned by the last submission, if that submission
    /// failed for this ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl TicketEntry {
    pub fn new(id: u64, ticket_key: &str) -> Self {
        Self {
            id,
            ticket_key: ticket_key.trim().to_string(),
            stage: String::new(),
            flow: String::new(),
            result: String::new(),
            failing_cmd: String::new(),
            comment: String::new(),
            label_action: LabelAction::default(),
            last_error: None,
        }
    }

    /// Fields a submittable entry must carry: ticket_key, stage, flow, result.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.ticket_key.trim().is_empty() {
            missing.push("ticket key");
        }
        if self.stage.trim().is_empty() {
            missing.push("stage");
        }
        if self.flow.trim().is_empty() {
            missing.push("flow");
        }
        if self.result.trim().is_empty() {
            missing.push("result");
        }
        missing
    }

    pub fn is_submittable(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Client-side preview of the label this entry would apply.
    pub fn preview_label(&self) -> String {
        compose_results_label(&self.stage, &self.flow, &self.result, &self.failing_cmd)
    }
}

/// Validate a batch before any network call.
///
/// Returns a single aggregate error listing every deficient entry, or `Ok`
/// when the whole batch is submittable. An empty batch is rejected too.
pub fn validate_batch(entries: &[TicketEntry]) -> AppResult<()> {
    if entries.is_empty() {
        return Err(AppError::Validation(
            "no tickets in the working set; add some with `ticket add`".to_string(),
        ));
    }

    let problems = entries
        .iter()
        .filter_map(|entry| {
            let missing = entry.missing_fields();
            if missing.is_empty() {
                None
            } else {
                let subject = if entry.ticket_key.trim().is_empty() {
                    format!("entry #{}", entry.id)
                } else {
                    entry.ticket_key.clone()
                };
                Some(format!("{subject}: missing {}", missing.join(", ")))
            }
        })
        .collect::<Vec<_>>();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join("; ")))
    }
}

/// Backend report for one ticket from the pre-submission label check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCheckResult {
    pub ticket_key: String,
    /// Label the backend would apply for this submission. Authoritative over
    /// the client-side preview.
    #[serde(default)]
    pub new_label: String,
    #[serde(default)]
    pub existing_results_labels: Vec<String>,
    pub has_conflict: bool,
}

/// Per-ticket outcome of a bulk label/comment update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketUpdateResult {
    pub ticket_key: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_applied: Option<String>,
    #[serde(default)]
    pub comment_added: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full response of a bulk label/comment update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub results: Vec<TicketUpdateResult>,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Split a comma-separated paste of ticket keys into clean, non-empty keys.
/// Duplicates are kept; the backend decides how to treat them.
pub fn split_ticket_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .map(|key| key.to_string())
        .collect()
}
