use async_trait::async_trait;

use crate::domain::audit::{AuditAction, AuditPage};
use crate::domain::options::DropdownConfig;
use crate::domain::ticket::{BulkUpdateResponse, LabelCheckResult, TicketEntry};
use crate::error::AppResult;

/// Page request for the audit history listing.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub limit: usize,
    pub offset: usize,
    pub actions: Vec<AuditAction>,
}

#[async_trait]
pub trait TicketService: Send + Sync {
    /// Fetch the stage/flow/result dropdown option sets.
    async fn dropdown_config(&self) -> AppResult<DropdownConfig>;

    /// Pre-submission check: which tickets already carry results labels.
    async fn check_labels(&self, entries: &[TicketEntry]) -> AppResult<Vec<LabelCheckResult>>;

    /// Bulk label/comment update. One request for the whole batch; the
    /// backend walks the tickets sequentially, hence the extended timeout on
    /// the implementation side.
    async fn bulk_update(&self, entries: &[TicketEntry]) -> AppResult<BulkUpdateResponse>;

    /// Paged audit history, newest first.
    async fn history(&self, query: &HistoryQuery) -> AppResult<AuditPage>;
}
