use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::domain::ticket::LabelAction;
use crate::error::{AppError, AppResult};
use crate::workflow::submit::{
    ConflictPrompt, ResolutionDecision, SubmissionAttempt, refresh_history, submit_working_set,
};
use crate::workset::WorkingSet;

#[derive(Args, Debug, Clone)]
pub struct TicketArgs {
    #[command(subcommand)]
    pub command: TicketCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TicketCommand {
    /// Add tickets to the working set; accepts comma-separated keys.
    Add {
        /// Ticket keys, e.g. "PROJ-1" or "PROJ-1, PROJ-2".
        keys: String,
    },
    /// Edit fields of one working-set entry.
    Set {
        /// Entry id as shown by `ticket list`.
        id: u64,
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        flow: Option<String>,
        #[arg(long)]
        result: Option<String>,
        #[arg(long)]
        failing_cmd: Option<String>,
        #[arg(long)]
        comment: Option<String>,
        /// replace, add or skip.
        #[arg(long)]
        label_action: Option<String>,
    },
    /// Show the working set.
    List,
    /// Remove one entry from the working set.
    Remove { id: u64 },
    /// Show the stage/flow/result options served by the backend.
    Options,
    /// Check labels, resolve conflicts and run the bulk update.
    Submit {
        /// Resolve every conflict with this action instead of prompting.
        #[arg(long)]
        apply_all: Option<String>,
    },
}

pub async fn run(ctx: &AppContext, command: TicketCommand) -> AppResult<()> {
    match command {
        TicketCommand::Add { keys } => run_add(&keys),
        TicketCommand::Set {
            id,
            stage,
            flow,
            result,
            failing_cmd,
            comment,
            label_action,
        } => {
            run_set(
                ctx,
                id,
                stage,
                flow,
                result,
                failing_cmd,
                comment,
                label_action,
            )
            .await
        }
        TicketCommand::List => run_list(),
        TicketCommand::Remove { id } => run_remove(id),
        TicketCommand::Options => run_options(ctx).await,
        TicketCommand::Submit { apply_all } => run_submit(ctx, apply_all).await,
    }
}

fn run_add(keys: &str) -> AppResult<()> {
    let mut workset = WorkingSet::load()?;
    let added = workset.add_keys(keys);
    if added.is_empty() {
        return Err(AppError::Validation("no ticket keys given".to_string()));
    }
    workset.save()?;
    println!("Added {} ticket(s) to the working set.", added.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_set(
    ctx: &AppContext,
    id: u64,
    stage: Option<String>,
    flow: Option<String>,
    result: Option<String>,
    failing_cmd: Option<String>,
    comment: Option<String>,
    label_action: Option<String>,
) -> AppResult<()> {
    // Validate dropdown-backed values against the backend's option sets
    // before touching the entry.
    if stage.is_some() || flow.is_some() || result.is_some() {
        let options = ctx.tickets.dropdown_config().await?;
        if let Some(value) = stage.as_deref() {
            if !options.is_valid_stage(value) {
                return Err(AppError::Validation(format!("unknown stage '{value}'")));
            }
        }
        if let Some(value) = flow.as_deref() {
            if !options.is_valid_flow(value) {
                return Err(AppError::Validation(format!("unknown flow '{value}'")));
            }
        }
        if let Some(value) = result.as_deref() {
            if !options.is_valid_result(value) {
                return Err(AppError::Validation(format!("unknown result '{value}'")));
            }
        }
    }

    let action = match label_action.as_deref() {
        Some(raw) => Some(LabelAction::from_str(raw).ok_or_else(|| {
            AppError::Validation(format!(
                "label action must be replace, add or skip; got '{raw}'"
            ))
        })?),
        None => None,
    };

    let mut workset = WorkingSet::load()?;
    let entry = workset
        .get_mut(id)
        .ok_or_else(|| AppError::Validation(format!("no working-set entry with id {id}")))?;

    if let Some(value) = stage {
        entry.stage = value;
    }
    if let Some(value) = flow {
        entry.flow = value;
    }
    if let Some(value) = result {
        entry.result = value;
    }
    if let Some(value) = failing_cmd {
        entry.failing_cmd = value;
    }
    if let Some(value) = comment {
        entry.comment = value;
    }
    if let Some(value) = action {
        entry.label_action = value;
    }

    let key = entry.ticket_key.clone();
    workset.save()?;
    println!("Updated entry {id} ({key}).");
    Ok(())
}

fn run_list() -> AppResult<()> {
    let workset = WorkingSet::load()?;
    if workset.is_empty() {
        println!("Working set is empty.");
        return Ok(());
    }

    println!(
        "{:<4} {:<12} {:<10} {:<10} {:<10} {:<8} label",
        "id", "ticket", "stage", "flow", "result", "action"
    );
    for entry in workset.entries() {
        println!(
            "{:<4} {:<12} {:<10} {:<10} {:<10} {:<8} {}",
            entry.id,
            entry.ticket_key,
            or_dash(&entry.stage),
            or_dash(&entry.flow),
            or_dash(&entry.result),
            entry.label_action.as_str(),
            if entry.is_submittable() {
                entry.preview_label()
            } else {
                "<incomplete>".to_string()
            },
        );
        if let Some(error) = &entry.last_error {
            println!("     last error: {error}");
        }
    }
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

fn run_remove(id: u64) -> AppResult<()> {
    let mut workset = WorkingSet::load()?;
    if !workset.remove(id) {
        return Err(AppError::Validation(format!(
            "no working-set entry with id {id}"
        )));
    }
    workset.save()?;
    println!("Removed entry {id}.");
    Ok(())
}

async fn run_options(ctx: &AppContext) -> AppResult<()> {
    let options = ctx.tickets.dropdown_config().await?;
    println!("Stages:");
    for option in &options.stages {
        println!("  {:<12} {}", option.value, option.label);
    }
    println!("Flows:");
    for option in &options.flows {
        println!("  {:<12} {}", option.value, option.label);
    }
    println!("Results:");
    for option in &options.results {
        println!("  {:<12} {}", option.value, option.label);
    }
    Ok(())
}

async fn run_submit(ctx: &AppContext, apply_all: Option<String>) -> AppResult<()> {
    let apply_all = match apply_all.as_deref() {
        Some(raw) => Some(LabelAction::from_str(raw).ok_or_else(|| {
            AppError::Validation(format!(
                "--apply-all must be replace, add or skip; got '{raw}'"
            ))
        })?),
        None => None,
    };

    let mut workset = WorkingSet::load()?;
    let mut prompt = CliConflictPrompt { apply_all };

    let outcome = match submit_working_set(&ctx.tickets, &mut workset, &mut prompt).await? {
        Some(outcome) => outcome,
        None => {
            println!("Submission cancelled; working set unchanged.");
            return Ok(());
        }
    };

    println!(
        "{}/{} successful; {} ticket(s) cleared from the working set.",
        outcome.report.successful, outcome.report.total, outcome.pruned
    );
    for (key, error) in &outcome.report.failures {
        println!("  {key}: {error}");
    }
    if outcome.report.failed > 0 {
        println!("Failed tickets remain in the working set for retry.");
    }

    // Show what just landed in the audit log.
    let recent = refresh_history(&ctx.tickets, ctx.config.history_page_size).await?;
    if !recent.entries.is_empty() {
        println!("\nRecent activity:");
        for entry in recent.entries.iter().take(5) {
            println!(
                "  {} {} {} {}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.action.glyph(),
                entry.ticket_key,
                entry.action.description(),
            );
        }
    }
    Ok(())
}

/// Interactive conflict dialog. With `apply_all` set it resolves every
/// conflict the same way without prompting.
struct CliConflictPrompt {
    apply_all: Option<LabelAction>,
}

impl ConflictPrompt for CliConflictPrompt {
    fn resolve_conflicts(
        &mut self,
        attempt: &mut SubmissionAttempt,
    ) -> AppResult<ResolutionDecision> {
        if let Some(action) = self.apply_all {
            attempt.resolve_all(action);
            return Ok(ResolutionDecision::Confirm);
        }

        println!(
            "{} ticket(s) already carry a results label:",
            attempt.conflicts().len()
        );
        let conflicts = attempt.conflicts().to_vec();
        for conflict in &conflicts {
            println!(
                "\n{}: existing [{}], new label {}",
                conflict.ticket_key,
                conflict.existing_labels.join(", "),
                conflict.new_label,
            );
            match prompt_action(conflict.resolution)? {
                PromptChoice::One(action) => attempt.resolve(conflict.entry_id, action),
                PromptChoice::All(action) => {
                    attempt.resolve_all(action);
                    return Ok(ResolutionDecision::Confirm);
                }
                PromptChoice::Cancel => return Ok(ResolutionDecision::Cancel),
            }
        }
        Ok(ResolutionDecision::Confirm)
    }
}

enum PromptChoice {
    One(LabelAction),
    All(LabelAction),
    Cancel,
}

fn prompt_action(current: LabelAction) -> AppResult<PromptChoice> {
    let mut stdout = io::stdout();
    write!(
        stdout,
        "Action (replace/add/skip, all <action>, cancel) [{}]: ",
        current.as_str()
    )?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Ok(PromptChoice::One(current));
    }
    if trimmed.eq_ignore_ascii_case("cancel") {
        return Ok(PromptChoice::Cancel);
    }
    if let Some(rest) = trimmed.strip_prefix("all ") {
        let action = LabelAction::from_str(rest).ok_or_else(|| {
            AppError::Validation(format!("unknown action '{rest}' after 'all'"))
        })?;
        return Ok(PromptChoice::All(action));
    }
    let action = LabelAction::from_str(trimmed)
        .ok_or_else(|| AppError::Validation(format!("unknown action '{trimmed}'")))?;
    Ok(PromptChoice::One(action))
}
