use std::io::{self, Write};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::services::AuthService;
use crate::session::Session;

/// Begin the browser OAuth flow: print the authorize URL, then accept the
/// session token pasted back from the redirect and persist the session.
pub async fn login(auth: &Arc<dyn AuthService>) -> AppResult<()> {
    let auth_url = auth.login_url().await?;

    println!("Open this URL in a browser and complete the sign-in:");
    println!("  {auth_url}");
    println!();
    print!("Paste the session token from the redirect URL: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let token = input.trim();
    if token.is_empty() {
        return Err(AppError::Validation("no session token entered".to_string()));
    }

    let user = auth.current_user(token).await?;
    let session = Session::new(token.to_string(), user);
    session.save()?;

    println!("Signed in as {}.", session.user.display_name);
    Ok(())
}

/// Invalidate the session server-side and drop the local copy. The local
/// session is cleared even when the backend already considers it expired.
pub async fn logout(auth: &Arc<dyn AuthService>) -> AppResult<()> {
    match Session::load()? {
        Some(session) => {
            match auth.logout(&session.token).await {
                Ok(()) | Err(AppError::AuthExpired) => {}
                Err(err) => return Err(err),
            }
            Session::clear()?;
            println!("Signed out.");
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

/// Show the profile behind the current session, re-validated against the
/// backend rather than the cached copy.
pub async fn whoami(ctx: &crate::context::AppContext) -> AppResult<()> {
    let user = ctx.auth.current_user(&ctx.session.token).await?;

    println!("{} <{}>", user.display_name, user.email);
    if !user.account_id.is_empty() {
        println!("Account id: {}", user.account_id);
    }
    Ok(())
}
