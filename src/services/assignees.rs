use async_trait::async_trait;

use crate::domain::assignee::{
    AssigneeChange, AssigneeUser, BulkAssigneeResponse, CurrentAssignee, DirectorySearchHit,
    NewAssigneeUser,
};
use crate::error::AppResult;

#[async_trait]
pub trait AssigneeService: Send + Sync {
    /// List the active assignable-user allow-list.
    async fn list_users(&self) -> AppResult<Vec<AssigneeUser>>;

    /// Add a user to the allow-list.
    async fn add_user(&self, user: &NewAssigneeUser) -> AppResult<AssigneeUser>;

    /// Remove a user from the allow-list by id.
    async fn remove_user(&self, user_id: i64) -> AppResult<()>;

    /// Live Jira directory search for onboarding new assignable users.
    async fn search_directory(&self, query: &str) -> AppResult<Vec<DirectorySearchHit>>;

    /// Current assignee per ticket key.
    async fn current_assignees(&self, ticket_keys: &[String]) -> AppResult<Vec<CurrentAssignee>>;

    /// Bulk assignee update with optional per-ticket comments.
    async fn bulk_assign(&self, changes: &[AssigneeChange]) -> AppResult<BulkAssigneeResponse>;
}
