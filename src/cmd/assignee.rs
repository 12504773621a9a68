use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::domain::assignee::NewAssigneeUser;
use crate::domain::ticket::split_ticket_keys;
use crate::error::{AppError, AppResult};
use crate::workflow::assign::{plan_bulk_assign, run_bulk_assign};

#[derive(Args, Debug, Clone)]
pub struct AssigneeArgs {
    #[command(subcommand)]
    pub command: AssigneeCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AssigneeCommand {
    /// List the assignable-user allow-list.
    List,
    /// Add a user to the allow-list.
    Add {
        display_name: String,
        username: String,
        email: String,
    },
    /// Remove an allow-list user by id.
    Remove { id: i64 },
    /// Search the Jira directory for users to onboard.
    Search { query: String },
    /// Show the current assignee of each given ticket (comma-separated keys).
    Current { keys: String },
    /// Assign one user to many tickets (comma-separated keys).
    Assign {
        keys: String,
        username: String,
        /// Jira account id, when known from `assignee search`.
        #[arg(long)]
        account_id: Option<String>,
        /// Comment to post on each ticket.
        #[arg(long, default_value = "")]
        comment: String,
    },
}

pub async fn run(ctx: &AppContext, command: AssigneeCommand) -> AppResult<()> {
    match command {
        AssigneeCommand::List => run_list(ctx).await,
        AssigneeCommand::Add {
            display_name,
            username,
            email,
        } => run_add(ctx, display_name, username, email).await,
        AssigneeCommand::Remove { id } => run_remove(ctx, id).await,
        AssigneeCommand::Search { query } => run_search(ctx, &query).await,
        AssigneeCommand::Current { keys } => run_current(ctx, &keys).await,
        AssigneeCommand::Assign {
            keys,
            username,
            account_id,
            comment,
        } => run_assign(ctx, &keys, &username, account_id.as_deref(), &comment).await,
    }
}

async fn run_list(ctx: &AppContext) -> AppResult<()> {
    let users = ctx.assignees.list_users().await?;
    if users.is_empty() {
        println!("No assignable users configured.");
        return Ok(());
    }
    println!("{:<5} {:<24} {:<14} email", "id", "name", "username");
    for user in &users {
        println!(
            "{:<5} {:<24} {:<14} {}",
            user.id, user.display_name, user.username, user.email
        );
    }
    Ok(())
}

async fn run_add(
    ctx: &AppContext,
    display_name: String,
    username: String,
    email: String,
) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("username is empty".to_string()));
    }
    let user = ctx
        .assignees
        .add_user(&NewAssigneeUser {
            display_name,
            username,
            email,
        })
        .await?;
    println!("Added {} ({}) as id {}.", user.display_name, user.username, user.id);
    Ok(())
}

async fn run_remove(ctx: &AppContext, id: i64) -> AppResult<()> {
    ctx.assignees.remove_user(id).await?;
    println!("Removed user {id}.");
    Ok(())
}

async fn run_search(ctx: &AppContext, query: &str) -> AppResult<()> {
    if query.trim().len() < 2 {
        return Err(AppError::Validation(
            "search query must be at least 2 characters".to_string(),
        ));
    }
    let hits = ctx.assignees.search_directory(query.trim()).await?;
    if hits.is_empty() {
        println!("No directory matches for '{query}'.");
        return Ok(());
    }
    for hit in &hits {
        println!(
            "{:<24} {:<32} {}",
            hit.display_name, hit.email_address, hit.account_id
        );
    }
    Ok(())
}

async fn run_current(ctx: &AppContext, keys: &str) -> AppResult<()> {
    let ticket_keys = split_ticket_keys(keys);
    if ticket_keys.is_empty() {
        return Err(AppError::Validation("no ticket keys given".to_string()));
    }
    let current = ctx.assignees.current_assignees(&ticket_keys).await?;
    for item in &current {
        match &item.error {
            Some(error) => println!("{:<12} <error: {error}>", item.ticket_key),
            None => println!("{:<12} {}", item.ticket_key, item.display_name),
        }
    }
    Ok(())
}

async fn run_assign(
    ctx: &AppContext,
    keys: &str,
    username: &str,
    account_id: Option<&str>,
    comment: &str,
) -> AppResult<()> {
    let ticket_keys = split_ticket_keys(keys);
    let changes = plan_bulk_assign(&ticket_keys, username, account_id, comment)?;
    let report = run_bulk_assign(&ctx.assignees, &changes).await?;

    println!("{}/{} successful.", report.successful, report.total);
    for (key, error) in &report.failures {
        println!("  {key}: {error}");
    }
    Ok(())
}
