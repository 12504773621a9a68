use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::assignee::{
    AssigneeChange, AssigneeUser, BulkAssigneeResponse, CurrentAssignee, DirectorySearchHit,
    NewAssigneeUser,
};
use crate::domain::audit::AuditPage;
use crate::domain::options::DropdownConfig;
use crate::domain::ticket::{BulkUpdateResponse, LabelCheckResult, TicketEntry};
use crate::error::{AppError, AppResult};
use crate::services::{AssigneeService, AuthService, HistoryQuery, TicketService};
use crate::session::UserProfile;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Bulk endpoints walk tickets sequentially server-side.
const BULK_TIMEOUT: Duration = Duration::from_secs(120);
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Single HTTP client wrapping every backend call. The bearer token is
/// injected on each request except the login-URL fetch; a 401 maps to
/// `AppError::AuthExpired` so callers can clear the session.
pub struct ApiGateway {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiGateway {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> AppResult<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or(AppError::AuthExpired)?;
        Ok(builder
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json"))
    }

    async fn send(builder: RequestBuilder) -> AppResult<Response> {
        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                AppError::Transport("request timed out".to_string())
            } else {
                AppError::Transport(format!("failed to reach backend: {err}"))
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::AuthExpired);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Gateway(format!(
                "backend responded with {status}: {body}"
            )));
        }
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        response
            .json()
            .await
            .map_err(|err| AppError::Gateway(format!("failed to parse backend response: {err}")))
    }
}

#[async_trait]
impl AuthService for ApiGateway {
    async fn login_url(&self) -> AppResult<String> {
        let builder = self
            .http
            .get(self.endpoint("/api/auth/login"))
            .header(ACCEPT, "application/json")
            .timeout(DEFAULT_TIMEOUT);
        let response = Self::send(builder).await?;
        let payload: LoginUrlResponse = Self::parse(response).await?;
        Ok(payload.auth_url)
    }

    async fn current_user(&self, token: &str) -> AppResult<UserProfile> {
        let builder = self
            .http
            .get(self.endpoint("/api/auth/me"))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .timeout(DEFAULT_TIMEOUT);
        let response = Self::send(builder).await?;
        Self::parse(response).await
    }

    async fn logout(&self, token: &str) -> AppResult<()> {
        let builder = self
            .http
            .post(self.endpoint("/api/auth/logout"))
            .header(ACCEPT, "application/json")
            .json(&LogoutRequest {
                token: token.to_string(),
            })
            .timeout(DEFAULT_TIMEOUT);
        Self::send(builder).await?;
        Ok(())
    }
}

#[async_trait]
impl TicketService for ApiGateway {
    async fn dropdown_config(&self) -> AppResult<DropdownConfig> {
        let builder = self
            .authorized(self.http.get(self.endpoint("/api/tickets/config")))?
            .timeout(DEFAULT_TIMEOUT);
        let response = Self::send(builder).await?;
        Self::parse(response).await
    }

    async fn check_labels(&self, entries: &[TicketEntry]) -> AppResult<Vec<LabelCheckResult>> {
        let request = LabelCheckRequest {
            tickets: entries.iter().map(LabelCheckItem::from_entry).collect(),
        };
        let builder = self
            .authorized(self.http.post(self.endpoint("/api/tickets/check-labels")))?
            .json(&request)
            .timeout(DEFAULT_TIMEOUT);
        let response = Self::send(builder).await?;
        let payload: LabelCheckResponse = Self::parse(response).await?;
        Ok(payload.results)
    }

    async fn bulk_update(&self, entries: &[TicketEntry]) -> AppResult<BulkUpdateResponse> {
        let request = BulkUpdateRequest {
            tickets: entries.iter().map(TicketUpdateItem::from_entry).collect(),
        };
        let builder = self
            .authorized(self.http.post(self.endpoint("/api/tickets/update")))?
            .json(&request)
            .timeout(BULK_TIMEOUT);
        let response = Self::send(builder).await?;
        Self::parse(response).await
    }

    async fn history(&self, query: &HistoryQuery) -> AppResult<AuditPage> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if !query.actions.is_empty() {
            let actions = query
                .actions
                .iter()
                .map(|action| action.as_str())
                .collect::<Vec<_>>()
                .join(",");
            params.push(("actions", actions));
        }
        let builder = self
            .authorized(self.http.get(self.endpoint("/api/tickets/history")))?
            .query(&params)
            .timeout(DEFAULT_TIMEOUT);
        let response = Self::send(builder).await?;
        Self::parse(response).await
    }
}

#[async_trait]
impl AssigneeService for ApiGateway {
    async fn list_users(&self) -> AppResult<Vec<AssigneeUser>> {
        let builder = self
            .authorized(self.http.get(self.endpoint("/api/assignees/users")))?
            .timeout(DEFAULT_TIMEOUT);
        let response = Self::send(builder).await?;
        Self::parse(response).await
    }

    async fn add_user(&self, user: &NewAssigneeUser) -> AppResult<AssigneeUser> {
        let builder = self
            .authorized(self.http.post(self.endpoint("/api/assignees/users")))?
            .json(user)
            .timeout(DEFAULT_TIMEOUT);
        let response = Self::send(builder).await?;
        Self::parse(response).await
    }

    async fn remove_user(&self, user_id: i64) -> AppResult<()> {
        let builder = self
            .authorized(
                self.http
                    .delete(self.endpoint(&format!("/api/assignees/users/{user_id}"))),
            )?
            .timeout(DEFAULT_TIMEOUT);
        Self::send(builder).await?;
        Ok(())
    }

    async fn search_directory(&self, query: &str) -> AppResult<Vec<DirectorySearchHit>> {
        let builder = self
            .authorized(self.http.get(self.endpoint("/api/assignees/search-jira")))?
            .query(&[("query", query)])
            .timeout(DEFAULT_TIMEOUT);
        let response = Self::send(builder).await?;
        Self::parse(response).await
    }

    async fn current_assignees(&self, ticket_keys: &[String]) -> AppResult<Vec<CurrentAssignee>> {
        let builder = self
            .authorized(
                self.http
                    .post(self.endpoint("/api/assignees/current-assignees")),
            )?
            .json(&TicketKeysRequest {
                ticket_keys: ticket_keys.to_vec(),
            })
            .timeout(LOOKUP_TIMEOUT);
        let response = Self::send(builder).await?;
        let payload: CurrentAssigneesResponse = Self::parse(response).await?;
        Ok(payload.results)
    }

    async fn bulk_assign(&self, changes: &[AssigneeChange]) -> AppResult<BulkAssigneeResponse> {
        let builder = self
            .authorized(self.http.post(self.endpoint("/api/assignees/update")))?
            .json(&BulkAssignRequest {
                tickets: changes.to_vec(),
            })
            .timeout(BULK_TIMEOUT);
        let response = Self::send(builder).await?;
        Self::parse(response).await
    }
}

#[derive(Deserialize)]
struct LoginUrlResponse {
    auth_url: String,
}

#[derive(Serialize)]
struct LogoutRequest {
    token: String,
}

#[derive(Serialize)]
struct LabelCheckRequest {
    tickets: Vec<LabelCheckItem>,
}

#[derive(Serialize)]
struct LabelCheckItem {
    ticket_key: String,
    stage: String,
    flow: String,
    result: String,
    failing_cmd: String,
}

impl LabelCheckItem {
    fn from_entry(entry: &TicketEntry) -> Self {
        Self {
            ticket_key: entry.ticket_key.clone(),
            stage: entry.stage.clone(),
            flow: entry.flow.clone(),
            result: entry.result.clone(),
            failing_cmd: entry.failing_cmd.clone(),
        }
    }
}

#[derive(Deserialize)]
struct LabelCheckResponse {
    results: Vec<LabelCheckResult>,
}

#[derive(Serialize)]
struct BulkUpdateRequest {
    tickets: Vec<TicketUpdateItem>,
}

#[derive(Serialize)]
struct TicketUpdateItem {
    ticket_key: String,
    stage: String,
    flow: String,
    result: String,
    failing_cmd: String,
    comment: String,
    label_action: String,
}

impl TicketUpdateItem {
    fn from_entry(entry: &TicketEntry) -> Self {
        Self {
            ticket_key: entry.ticket_key.clone(),
            stage: entry.stage.clone(),
            flow: entry.flow.clone(),
            result: entry.result.clone(),
            failing_cmd: entry.failing_cmd.clone(),
            comment: entry.comment.clone(),
            label_action: entry.label_action.as_str().to_string(),
        }
    }
}

#[derive(Serialize)]
struct TicketKeysRequest {
    ticket_keys: Vec<String>,
}

#[derive(Deserialize)]
struct CurrentAssigneesResponse {
    results: Vec<CurrentAssignee>,
}

#[derive(Serialize)]
struct BulkAssignRequest {
    tickets: Vec<AssigneeChange>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ticket::LabelAction;

    fn entry() -> TicketEntry {
        let mut entry = TicketEntry::new(1, "PROJ-7");
        entry.stage = "build".to_string();
        entry.flow = "ci".to_string();
        entry.result = "fail".to_string();
        entry.comment = "see run 42".to_string();
        entry.label_action = LabelAction::Replace;
        entry
    }

    #[test]
    fn update_item_carries_label_action_on_the_wire() {
        let item = TicketUpdateItem::from_entry(&entry());
        let encoded = serde_json::to_value(&item).unwrap();
        assert_eq!(encoded["ticket_key"], "PROJ-7");
        assert_eq!(encoded["label_action"], "replace");
        assert_eq!(encoded["comment"], "see run 42");
    }

    #[test]
    fn check_item_omits_comment_and_action() {
        let item = LabelCheckItem::from_entry(&entry());
        let encoded = serde_json::to_value(&item).unwrap();
        assert!(encoded.get("comment").is_none());
        assert!(encoded.get("label_action").is_none());
        assert_eq!(encoded["failing_cmd"], "");
    }

    #[test]
    fn label_check_response_parses_backend_shape() {
        let payload: LabelCheckResponse = serde_json::from_str(
            r#"{"results":[{"ticket_key":"PROJ-7","new_label":"results_buildcifailX",
                "existing_results_labels":["results_old"],"has_conflict":true}]}"#,
        )
        .unwrap();
        assert_eq!(payload.results.len(), 1);
        assert!(payload.results[0].has_conflict);
        assert_eq!(payload.results[0].new_label, "results_buildcifailX");
    }

    #[test]
    fn gateway_trims_trailing_slash() {
        let gateway = ApiGateway::new("http://localhost:8000/", None);
        assert_eq!(
            gateway.endpoint("/api/tickets/config"),
            "http://localhost:8000/api/tickets/config"
        );
    }
}
