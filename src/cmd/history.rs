use clap::Args;

use crate::context::AppContext;
use crate::domain::audit::AuditAction;
use crate::error::{AppError, AppResult};
use crate::services::HistoryQuery;

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Entries per page.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Offset into the log, newest first.
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    /// Filter by action kind; may be repeated (e.g. --action label_update).
    #[arg(long = "action")]
    pub actions: Vec<String>,
}

pub async fn run(ctx: &AppContext, args: HistoryArgs) -> AppResult<()> {
    let actions = args
        .actions
        .iter()
        .map(|raw| {
            AuditAction::from_str(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown action '{raw}'")))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let query = HistoryQuery {
        limit: args.limit.unwrap_or(ctx.config.history_page_size),
        offset: args.offset,
        actions,
    };
    let page = ctx.tickets.history(&query).await?;

    if page.entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    for entry in &page.entries {
        let mut line = format!(
            "{} {} {:<12} {:<24} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action.glyph(),
            entry.ticket_key,
            entry.user_name,
            entry.action.description(),
        );
        if !entry.label.is_empty() {
            line.push_str(&format!(" [{}]", entry.label));
        }
        if !entry.details.is_empty() {
            line.push_str(&format!(" - {}", entry.details));
        }
        println!("{line}");
    }
    println!(
        "\nShowing {}-{} of {}.",
        query.offset + 1,
        query.offset + page.entries.len(),
        page.total
    );
    Ok(())
}
