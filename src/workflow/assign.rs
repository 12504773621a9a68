use std::sync::Arc;

use crate::domain::assignee::{AssigneeChange, BulkAssigneeResponse};
use crate::error::{AppError, AppResult};
use crate::services::AssigneeService;

/// Partitioned outcome of a bulk assignee update.
#[derive(Debug, Clone)]
pub struct AssignReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<(String, String)>,
}

/// Build the change list for assigning one user to many tickets, with an
/// optional shared comment. Rejected before any network call when the inputs
/// are incomplete.
pub fn plan_bulk_assign(
    ticket_keys: &[String],
    assignee_username: &str,
    account_id: Option<&str>,
    comment: &str,
) -> AppResult<Vec<AssigneeChange>> {
    if ticket_keys.is_empty() {
        return Err(AppError::Validation("no ticket keys given".to_string()));
    }
    if assignee_username.trim().is_empty() {
        return Err(AppError::Validation("assignee username is empty".to_string()));
    }
    Ok(ticket_keys
        .iter()
        .map(|key| AssigneeChange {
            ticket_key: key.clone(),
            assignee_username: assignee_username.trim().to_string(),
            account_id: account_id.map(|id| id.to_string()),
            comment: comment.to_string(),
        })
        .collect())
}

/// One bulk request for the whole batch; the backend reports per-ticket
/// outcomes which are partitioned here. No automatic retry.
pub async fn run_bulk_assign(
    assignees: &Arc<dyn AssigneeService>,
    changes: &[AssigneeChange],
) -> AppResult<AssignReport> {
    let response = assignees.bulk_assign(changes).await?;
    Ok(partition(&response))
}

fn partition(response: &BulkAssigneeResponse) -> AssignReport {
    let failures = response
        .results
        .iter()
        .filter(|result| !result.success)
        .map(|result| {
            (
                result.ticket_key.clone(),
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            )
        })
        .collect();
    AssignReport {
        total: response.total,
        successful: response.successful,
        failed: response.failed,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assignee::AssigneeUpdateResult;

    #[test]
    fn plan_requires_keys_and_username() {
        assert!(plan_bulk_assign(&[], "jdoe", None, "").is_err());
        assert!(plan_bulk_assign(&["A-1".to_string()], "  ", None, "").is_err());
    }

    #[test]
    fn plan_fans_one_change_per_ticket() {
        let changes = plan_bulk_assign(
            &["A-1".to_string(), "A-2".to_string()],
            "jdoe",
            Some("acc-9"),
            "handing over",
        )
        .unwrap();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.assignee_username == "jdoe"));
        assert!(changes.iter().all(|c| c.account_id.as_deref() == Some("acc-9")));
        assert_eq!(changes[1].ticket_key, "A-2");
    }

    #[test]
    fn partition_separates_failures() {
        let report = partition(&BulkAssigneeResponse {
            results: vec![
                AssigneeUpdateResult {
                    ticket_key: "A-1".to_string(),
                    success: true,
                    assignee_set: Some("jdoe".to_string()),
                    comment_added: true,
                    error: None,
                },
                AssigneeUpdateResult {
                    ticket_key: "A-2".to_string(),
                    success: false,
                    assignee_set: None,
                    comment_added: false,
                    error: Some("could not resolve user".to_string()),
                },
            ],
            total: 2,
            successful: 1,
            failed: 1,
        });
        assert_eq!(report.successful, 1);
        assert_eq!(
            report.failures,
            vec![("A-2".to_string(), "could not resolve user".to_string())]
        );
    }
}
