mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod session;
mod workflow;
mod workset;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::assignee::{self, AssigneeArgs};
use crate::cmd::auth;
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::history::{self, HistoryArgs};
use crate::cmd::ticket::{self, TicketArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::infra::ApiGateway;
use crate::services::{AssigneeService, AuthService, TicketService};
use crate::session::Session;

#[derive(Parser)]
#[command(
    name = "tickettractor",
    author,
    version,
    about = "Bulk-edit issue-tracker tickets: results labels, comments and assignees"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage CLI configuration.
    Config(ConfigArgs),
    /// Sign in through the backend's OAuth flow.
    Login,
    /// Invalidate and drop the current session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Manage the working set and run bulk label/comment updates.
    Ticket(TicketArgs),
    /// Browse the audit history.
    History(HistoryArgs),
    /// Manage assignable users and run bulk assignee updates.
    Assignee(AssigneeArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "tickettractor=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run().await {
        if matches!(error, AppError::AuthExpired) {
            // Expired token is useless; drop it so the next login starts clean.
            let _ = Session::clear();
        }
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Login => auth::login(&auth_service()?).await,
        Commands::Logout => auth::logout(&auth_service()?).await,
        Commands::Whoami => auth::whoami(&build_context()?).await,
        Commands::Ticket(args) => ticket::run(&build_context()?, args.command).await,
        Commands::History(args) => history::run(&build_context()?, args).await,
        Commands::Assignee(args) => assignee::run(&build_context()?, args.command).await,
    }
}

/// Gateway for the auth commands, which carry their token explicitly.
fn auth_service() -> AppResult<Arc<dyn AuthService>> {
    let config = AppConfig::load()?;
    Ok(Arc::new(ApiGateway::new(&config.backend_url, None)))
}

/// Context for authenticated commands: loaded session injected into one
/// shared gateway.
fn build_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;
    let session = Session::require()?;
    let gateway = Arc::new(ApiGateway::new(
        &config.backend_url,
        Some(session.token.clone()),
    ));

    let auth: Arc<dyn AuthService> = gateway.clone();
    let tickets: Arc<dyn TicketService> = gateway.clone();
    let assignees: Arc<dyn AssigneeService> = gateway;

    Ok(AppContext::new(config, session, auth, tickets, assignees))
}
