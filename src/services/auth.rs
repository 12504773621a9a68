use async_trait::async_trait;

use crate::error::AppResult;
use crate::session::UserProfile;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Fetch the OAuth authorize URL the user must open in a browser.
    async fn login_url(&self) -> AppResult<String>;

    /// Fetch the profile behind a session token.
    async fn current_user(&self, token: &str) -> AppResult<UserProfile>;

    /// Invalidate a session token server-side.
    async fn logout(&self, token: &str) -> AppResult<()>;
}
