use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::ticket::{
    BulkUpdateResponse, LabelAction, LabelCheckResult, TicketEntry, validate_batch,
};
use crate::error::AppResult;
use crate::services::{HistoryQuery, TicketService};
use crate::workset::WorkingSet;

/// Phase of one bulk-submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Checking,
    AwaitingResolution,
    Submitting,
}

/// One conflicting ticket awaiting a user decision.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub entry_id: u64,
    pub ticket_key: String,
    pub existing_labels: Vec<String>,
    /// Backend-computed label when reported, client preview otherwise.
    pub new_label: String,
    pub resolution: LabelAction,
}

/// What the check step decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    NoConflicts,
    NeedsResolution(usize),
}

/// Partitioned outcome of a completed bulk update.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub succeeded_keys: HashSet<String>,
    pub failures: Vec<(String, String)>,
}

/// State machine for one bulk-submission attempt.
///
/// Idle → (validate) → Checking → [AwaitingResolution] → Submitting → Idle.
/// Validation happens inside `begin`; a failed validation surfaces one
/// aggregate error and leaves the machine Idle. At most one attempt is in
/// flight: `begin` on a non-Idle machine is a no-op.
pub struct SubmissionAttempt {
    phase: SubmissionPhase,
    conflicts: Vec<Conflict>,
}

impl SubmissionAttempt {
    pub fn new() -> Self {
        Self {
            phase: SubmissionPhase::Idle,
            conflicts: Vec::new(),
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != SubmissionPhase::Idle
    }

    /// Start an attempt. Returns `Ok(false)` when one is already in flight.
    pub fn begin(&mut self, entries: &[TicketEntry]) -> AppResult<bool> {
        if self.is_busy() {
            return Ok(false);
        }
        // Validating: gate the whole batch before any network call.
        if let Err(err) = validate_batch(entries) {
            self.phase = SubmissionPhase::Idle;
            return Err(err);
        }
        self.conflicts.clear();
        self.phase = SubmissionPhase::Checking;
        Ok(true)
    }

    /// Feed the backend's check-labels report. Builds the conflict list for
    /// exactly the entries whose ticket reported a conflict; entries the
    /// backend did not report on are treated as conflict-free.
    pub fn record_check(
        &mut self,
        entries: &[TicketEntry],
        results: &[LabelCheckResult],
    ) -> CheckOutcome {
        debug_assert_eq!(self.phase, SubmissionPhase::Checking);
        self.conflicts = entries
            .iter()
            .filter_map(|entry| {
                let report = results
                    .iter()
                    .find(|result| result.ticket_key == entry.ticket_key)?;
                if !report.has_conflict {
                    return None;
                }
                let new_label = if report.new_label.is_empty() {
                    entry.preview_label()
                } else {
                    report.new_label.clone()
                };
                Some(Conflict {
                    entry_id: entry.id,
                    ticket_key: entry.ticket_key.clone(),
                    existing_labels: report.existing_results_labels.clone(),
                    new_label,
                    resolution: entry.label_action,
                })
            })
            .collect();

        if self.conflicts.is_empty() {
            self.phase = SubmissionPhase::Submitting;
            CheckOutcome::NoConflicts
        } else {
            self.phase = SubmissionPhase::AwaitingResolution;
            CheckOutcome::NeedsResolution(self.conflicts.len())
        }
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Set the resolution for one conflicting entry.
    pub fn resolve(&mut self, entry_id: u64, action: LabelAction) {
        if let Some(conflict) = self
            .conflicts
            .iter_mut()
            .find(|conflict| conflict.entry_id == entry_id)
        {
            conflict.resolution = action;
        }
    }

    /// Apply the same resolution to every conflicting entry in one step.
    pub fn resolve_all(&mut self, action: LabelAction) {
        for conflict in &mut self.conflicts {
            conflict.resolution = action;
        }
    }

    /// Confirm the resolutions and move to Submitting. Returns the
    /// per-entry actions to stamp into the working set.
    pub fn confirm(&mut self) -> Vec<(u64, LabelAction)> {
        debug_assert_eq!(self.phase, SubmissionPhase::AwaitingResolution);
        self.phase = SubmissionPhase::Submitting;
        self.conflicts
            .iter()
            .map(|conflict| (conflict.entry_id, conflict.resolution))
            .collect()
    }

    /// Abandon the attempt. Label actions already written into the working
    /// set persist for the next attempt.
    pub fn cancel(&mut self) {
        self.phase = SubmissionPhase::Idle;
        self.conflicts.clear();
    }

    /// Partition the bulk response into succeeded/failed and return to Idle.
    pub fn record_response(&mut self, response: &BulkUpdateResponse) -> SubmissionReport {
        debug_assert_eq!(self.phase, SubmissionPhase::Submitting);
        self.phase = SubmissionPhase::Idle;

        let succeeded_keys = response
            .results
            .iter()
            .filter(|result| result.success)
            .map(|result| result.ticket_key.clone())
            .collect();
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

        SubmissionReport {
            total: response.total,
            successful: response.successful,
            failed: response.failed,
            succeeded_keys,
            failures,
        }
    }

    /// The submit call never completed; nothing local changes.
    pub fn record_transport_failure(&mut self) {
        self.phase = SubmissionPhase::Idle;
        self.conflicts.clear();
    }
}

impl Default for SubmissionAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Decision taken by whatever is driving the conflict dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionDecision {
    Confirm,
    Cancel,
}

/// Seam for the interactive conflict dialog, so the orchestration below can
/// be driven by the CLI or by tests.
pub trait ConflictPrompt {
    fn resolve_conflicts(&mut self, attempt: &mut SubmissionAttempt)
    -> AppResult<ResolutionDecision>;
}

/// Result of a full submission run.
pub struct SubmissionOutcome {
    pub report: SubmissionReport,
    pub pruned: usize,
}

/// Orchestrate one submission of the working set: validate, check labels,
/// resolve conflicts through `prompt`, submit, reconcile the working set.
///
/// Returns `Ok(None)` when the user cancelled resolution. Not retried on
/// failure; the working set is left untouched so the user may resubmit.
pub async fn submit_working_set(
    tickets: &Arc<dyn TicketService>,
    workset: &mut WorkingSet,
    prompt: &mut dyn ConflictPrompt,
) -> AppResult<Option<SubmissionOutcome>> {
    let mut attempt = SubmissionAttempt::new();
    if !attempt.begin(workset.entries())? {
        return Ok(None);
    }

    let check = tickets.check_labels(workset.entries()).await.map_err(|err| {
        attempt.record_transport_failure();
        err
    })?;

    match attempt.record_check(workset.entries(), &check) {
        CheckOutcome::NoConflicts => {}
        CheckOutcome::NeedsResolution(count) => {
            tracing::debug!(conflicts = count, "awaiting conflict resolution");
            match prompt.resolve_conflicts(&mut attempt)? {
                ResolutionDecision::Confirm => {
                    for (entry_id, action) in attempt.confirm() {
                        if let Some(entry) = workset.get_mut(entry_id) {
                            entry.label_action = action;
                        }
                    }
                }
                ResolutionDecision::Cancel => {
                    attempt.cancel();
                    workset.save()?;
                    return Ok(None);
                }
            }
        }
    }

    let response = tickets.bulk_update(workset.entries()).await.map_err(|err| {
        attempt.record_transport_failure();
        err
    })?;

    let report = attempt.record_response(&response);
    let pruned = workset.prune_succeeded(&report.succeeded_keys, &report.failures);
    workset.save()?;
    tracing::info!(
        total = report.total,
        successful = report.successful,
        failed = report.failed,
        "bulk update completed"
    );

    Ok(Some(SubmissionOutcome { report, pruned }))
}

/// Fetch the freshest audit entries after a successful submission so the
/// caller can show what just landed.
pub async fn refresh_history(
    tickets: &Arc<dyn TicketService>,
    limit: usize,
) -> AppResult<crate::domain::audit::AuditPage> {
    tickets
        .history(&HistoryQuery {
            limit,
            offset: 0,
            actions: Vec::new(),
        })
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::audit::AuditPage;
    use crate::domain::options::{DropdownConfig, DropdownOption};
    use crate::domain::ticket::TicketUpdateResult;
    use crate::error::AppError;
    use crate::workset::WorkingSet;

    fn filled_entry(id: u64, key: &str) -> TicketEntry {
        let mut entry = TicketEntry::new(id, key);
        entry.stage = "build".to_string();
        entry.flow = "ci".to_string();
        entry.result = "fail".to_string();
        entry
    }

    fn check_result(key: &str, conflict: bool, existing: &[&str]) -> LabelCheckResult {
        LabelCheckResult {
            ticket_key: key.to_string(),
            new_label: "results_buildcifailX".to_string(),
            existing_results_labels: existing.iter().map(|s| s.to_string()).collect(),
            has_conflict: conflict,
        }
    }

    #[test]
    fn begin_rejects_invalid_batch_and_stays_idle() {
        let mut attempt = SubmissionAttempt::new();
        let mut entry = filled_entry(1, "A-1");
        entry.result = String::new();
        let err = attempt.begin(&[entry]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(attempt.phase(), SubmissionPhase::Idle);
    }

    #[test]
    fn begin_while_busy_is_a_no_op() {
        let mut attempt = SubmissionAttempt::new();
        let entries = vec![filled_entry(1, "A-1")];
        assert!(attempt.begin(&entries).unwrap());
        assert!(!attempt.begin(&entries).unwrap());
        assert_eq!(attempt.phase(), SubmissionPhase::Checking);
    }

    #[test]
    fn no_conflicts_goes_straight_to_submitting() {
        let mut attempt = SubmissionAttempt::new();
        let entries = vec![filled_entry(1, "A-1"), filled_entry(2, "A-2")];
        attempt.begin(&entries).unwrap();
        let outcome = attempt.record_check(
            &entries,
            &[
                check_result("A-1", false, &[]),
                check_result("A-2", false, &[]),
            ],
        );
        assert_eq!(outcome, CheckOutcome::NoConflicts);
        assert_eq!(attempt.phase(), SubmissionPhase::Submitting);
    }

    #[test]
    fn conflict_partition_shows_exactly_the_conflicting_entries() {
        let mut attempt = SubmissionAttempt::new();
        let entries = vec![
            filled_entry(1, "A-1"),
            filled_entry(2, "A-2"),
            filled_entry(3, "A-3"),
        ];
        attempt.begin(&entries).unwrap();
        let outcome = attempt.record_check(
            &entries,
            &[
                check_result("A-1", true, &["results_old"]),
                check_result("A-2", false, &[]),
                check_result("A-3", true, &["results_older", "results_old"]),
            ],
        );
        assert_eq!(outcome, CheckOutcome::NeedsResolution(2));
        let keys: Vec<_> = attempt
            .conflicts()
            .iter()
            .map(|c| c.ticket_key.as_str())
            .collect();
        assert_eq!(keys, vec!["A-1", "A-3"]);
        assert_eq!(attempt.conflicts()[1].existing_labels.len(), 2);
    }

    #[test]
    fn resolve_all_touches_only_conflicting_entries() {
        let mut attempt = SubmissionAttempt::new();
        let entries = vec![
            filled_entry(1, "A-1"),
            filled_entry(2, "A-2"),
            filled_entry(3, "A-3"),
        ];
        attempt.begin(&entries).unwrap();
        attempt.record_check(
            &entries,
            &[
                check_result("A-1", true, &["results_old"]),
                check_result("A-2", false, &[]),
                check_result("A-3", true, &["results_old"]),
            ],
        );
        attempt.resolve_all(LabelAction::Replace);
        let resolutions = attempt.confirm();
        assert_eq!(
            resolutions,
            vec![(1, LabelAction::Replace), (3, LabelAction::Replace)]
        );
    }

    #[test]
    fn unreported_entries_are_conflict_free() {
        let mut attempt = SubmissionAttempt::new();
        let entries = vec![filled_entry(1, "A-1"), filled_entry(2, "A-2")];
        attempt.begin(&entries).unwrap();
        let outcome =
            attempt.record_check(&entries, &[check_result("A-1", false, &[])]);
        assert_eq!(outcome, CheckOutcome::NoConflicts);
    }

    #[test]
    fn duplicate_keys_each_get_their_own_conflict_row() {
        let mut attempt = SubmissionAttempt::new();
        let entries = vec![filled_entry(1, "A-1"), filled_entry(2, "A-1")];
        attempt.begin(&entries).unwrap();
        let outcome =
            attempt.record_check(&entries, &[check_result("A-1", true, &["results_old"])]);
        assert_eq!(outcome, CheckOutcome::NeedsResolution(2));
    }

    #[test]
    fn cancel_returns_to_idle_without_resolutions() {
        let mut attempt = SubmissionAttempt::new();
        let entries = vec![filled_entry(1, "A-1")];
        attempt.begin(&entries).unwrap();
        attempt.record_check(&entries, &[check_result("A-1", true, &["results_x"])]);
        attempt.cancel();
        assert_eq!(attempt.phase(), SubmissionPhase::Idle);
        assert!(attempt.conflicts().is_empty());
    }

    #[test]
    fn response_partition_matches_success_flags() {
        let mut attempt = SubmissionAttempt::new();
        let entries = vec![filled_entry(1, "A-1"), filled_entry(2, "A-2")];
        attempt.begin(&entries).unwrap();
        attempt.record_check(
            &entries,
            &[
                check_result("A-1", false, &[]),
                check_result("A-2", false, &[]),
            ],
        );
        let report = attempt.record_response(&BulkUpdateResponse {
            results: vec![
                TicketUpdateResult {
                    ticket_key: "A-1".to_string(),
                    success: true,
                    label_applied: Some("results_buildcifailX".to_string()),
                    comment_added: false,
                    error: None,
                },
                TicketUpdateResult {
                    ticket_key: "A-2".to_string(),
                    success: false,
                    label_applied: None,
                    comment_added: false,
                    error: Some("permission denied".to_string()),
                },
            ],
            total: 2,
            successful: 1,
            failed: 1,
        });
        assert!(report.succeeded_keys.contains("A-1"));
        assert_eq!(
            report.failures,
            vec![("A-2".to_string(), "permission denied".to_string())]
        );
        assert_eq!(attempt.phase(), SubmissionPhase::Idle);
    }

    // -- End-to-end scenario against a mock gateway --------------------------

    struct MockTickets {
        check: Vec<LabelCheckResult>,
        response: BulkUpdateResponse,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl TicketService for MockTickets {
        async fn dropdown_config(&self) -> AppResult<DropdownConfig> {
            Ok(DropdownConfig {
                stages: vec![DropdownOption {
                    value: "build".to_string(),
                    label: "Build".to_string(),
                }],
                flows: vec![DropdownOption {
                    value: "ci".to_string(),
                    label: "CI".to_string(),
                }],
                results: vec![DropdownOption {
                    value: "fail".to_string(),
                    label: "Fail".to_string(),
                }],
            })
        }

        async fn check_labels(
            &self,
            _entries: &[TicketEntry],
        ) -> AppResult<Vec<LabelCheckResult>> {
            self.calls.lock().unwrap().push("check");
            Ok(self.check.clone())
        }

        async fn bulk_update(&self, _entries: &[TicketEntry]) -> AppResult<BulkUpdateResponse> {
            self.calls.lock().unwrap().push("update");
            Ok(self.response.clone())
        }

        async fn history(&self, _query: &HistoryQuery) -> AppResult<AuditPage> {
            self.calls.lock().unwrap().push("history");
            Ok(AuditPage {
                entries: Vec::new(),
                total: 0,
            })
        }
    }

    struct NoPrompt;

    impl ConflictPrompt for NoPrompt {
        fn resolve_conflicts(
            &mut self,
            _attempt: &mut SubmissionAttempt,
        ) -> AppResult<ResolutionDecision> {
            panic!("no conflicts expected in this scenario");
        }
    }

    fn workset_with(keys: &str) -> WorkingSet {
        let mut set = WorkingSet::load_for_tests();
        set.add_keys(keys);
        for id in set.entries().iter().map(|e| e.id).collect::<Vec<_>>() {
            let entry = set.get_mut(id).unwrap();
            entry.stage = "build".to_string();
            entry.flow = "ci".to_string();
            entry.result = "fail".to_string();
        }
        set
    }

    #[tokio::test]
    async fn bulk_paste_submit_prunes_successes_and_keeps_failures() {
        let mock = Arc::new(MockTickets {
            check: vec![
                check_result("A-1", false, &[]),
                check_result("A-2", false, &[]),
            ],
            response: BulkUpdateResponse {
                results: vec![
                    TicketUpdateResult {
                        ticket_key: "A-1".to_string(),
                        success: true,
                        label_applied: Some("results_buildcifailX".to_string()),
                        comment_added: false,
                        error: None,
                    },
                    TicketUpdateResult {
                        ticket_key: "A-2".to_string(),
                        success: false,
                        label_applied: None,
                        comment_added: false,
                        error: Some("permission denied".to_string()),
                    },
                ],
                total: 2,
                successful: 1,
                failed: 1,
            },
            calls: Mutex::new(Vec::new()),
        });
        let tickets: Arc<dyn TicketService> = mock.clone();

        let mut workset = workset_with("A-1, A-2");
        assert_eq!(workset.entries().len(), 2);

        let outcome = submit_working_set(&tickets, &mut workset, &mut NoPrompt)
            .await
            .unwrap()
            .expect("submission should run to completion");

        assert_eq!(outcome.report.successful, 1);
        assert_eq!(outcome.report.failed, 1);
        assert_eq!(outcome.pruned, 1);
        assert_eq!(workset.entries().len(), 1);
        assert_eq!(workset.entries()[0].ticket_key, "A-2");
        assert_eq!(
            workset.entries()[0].last_error.as_deref(),
            Some("permission denied")
        );
        assert_eq!(*mock.calls.lock().unwrap(), vec!["check", "update"]);
    }

    #[tokio::test]
    async fn invalid_batch_never_reaches_the_network() {
        let mock = Arc::new(MockTickets {
            check: Vec::new(),
            response: BulkUpdateResponse {
                results: Vec::new(),
                total: 0,
                successful: 0,
                failed: 0,
            },
            calls: Mutex::new(Vec::new()),
        });
        let tickets: Arc<dyn TicketService> = mock.clone();

        let mut workset = WorkingSet::load_for_tests();
        workset.add_keys("A-1");

        let err = submit_working_set(&tickets, &mut workset, &mut NoPrompt)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(mock.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dropdown_config_fetch_is_idempotent() {
        let mock = MockTickets {
            check: Vec::new(),
            response: BulkUpdateResponse {
                results: Vec::new(),
                total: 0,
                successful: 0,
                failed: 0,
            },
            calls: Mutex::new(Vec::new()),
        };
        let first = mock.dropdown_config().await.unwrap();
        let second = mock.dropdown_config().await.unwrap();
        assert_eq!(first, second);
    }

    struct ApplyAllPrompt(LabelAction);

    impl ConflictPrompt for ApplyAllPrompt {
        fn resolve_conflicts(
            &mut self,
            attempt: &mut SubmissionAttempt,
        ) -> AppResult<ResolutionDecision> {
            attempt.resolve_all(self.0);
            Ok(ResolutionDecision::Confirm)
        }
    }

    #[tokio::test]
    async fn confirmed_resolutions_are_stamped_into_the_working_set() {
        let mock = Arc::new(MockTickets {
            check: vec![check_result("A-1", true, &["results_old"])],
            response: BulkUpdateResponse {
                results: vec![TicketUpdateResult {
                    ticket_key: "A-1".to_string(),
                    success: true,
                    label_applied: Some("results_buildcifailX".to_string()),
                    comment_added: false,
                    error: None,
                }],
                total: 1,
                successful: 1,
                failed: 0,
            },
            calls: Mutex::new(Vec::new()),
        });
        let tickets: Arc<dyn TicketService> = mock.clone();

        let mut workset = workset_with("A-1");
        let outcome =
            submit_working_set(&tickets, &mut workset, &mut ApplyAllPrompt(LabelAction::Replace))
                .await
                .unwrap();
        assert!(outcome.is_some());
        assert!(workset.is_empty());
    }

    struct CancelPrompt;

    impl ConflictPrompt for CancelPrompt {
        fn resolve_conflicts(
            &mut self,
            _attempt: &mut SubmissionAttempt,
        ) -> AppResult<ResolutionDecision> {
            Ok(ResolutionDecision::Cancel)
        }
    }

    #[tokio::test]
    async fn cancelling_resolution_leaves_the_working_set_intact() {
        let mock = Arc::new(MockTickets {
            check: vec![check_result("A-1", true, &["results_old"])],
            response: BulkUpdateResponse {
                results: Vec::new(),
                total: 0,
                successful: 0,
                failed: 0,
            },
            calls: Mutex::new(Vec::new()),
        });
        let tickets: Arc<dyn TicketService> = mock.clone();

        let mut workset = workset_with("A-1");
        let outcome = submit_working_set(&tickets, &mut workset, &mut CancelPrompt)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(workset.entries().len(), 1);
        assert_eq!(*mock.calls.lock().unwrap(), vec!["check"]);
    }
}
