use std::time::Duration;

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, format_time};
use crate::error::{Result, TellmyError};
use crate::storage::Collection;
use crate::sync::{CancelToken, SyncOutcome, SyncProcessor};

#[derive(Args, Debug)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// List queued mutations
    List,
    /// Replay queued mutations against the Story API
    Sync(QueueSyncArgs),
    /// Drop one queued mutation
    Remove(QueueRemoveArgs),
    /// Drop every queued mutation
    Clear,
}

#[derive(Args, Debug)]
pub struct QueueSyncArgs {
    /// Skip items that already failed this many times (overrides sync.max_retries)
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Stop replaying after this many seconds; unsent items stay queued
    #[arg(long)]
    pub time_budget_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct QueueRemoveArgs {
    pub id: i64,
}

pub fn run(ctx: &AppContext, args: &QueueArgs) -> Result<()> {
    match &args.command {
        QueueCommand::List => list(ctx),
        QueueCommand::Sync(args) => sync(ctx, args),
        QueueCommand::Remove(args) => remove(ctx, args),
        QueueCommand::Clear => clear(ctx),
    }
}

fn list(ctx: &AppContext) -> Result<()> {
    let queue = ctx.store.get_offline_queue()?;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({ "count": queue.len(), "items": queue }));
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("Offline queue ({})", queue.len()));
    for item in &queue {
        let mut line = format!(
            "#{:<4} {:<6} {} {}",
            item.id,
            item.kind.as_str(),
            item.url,
            format_time(item.timestamp).dimmed()
        );
        if item.retry_count > 0 {
            line.push_str(&format!(" retries={}", item.retry_count).yellow().to_string());
        }
        layout.push_line(line);
        if let Some(error) = &item.last_error {
            layout.push_line(format!("      {}", error.red()));
        }
    }
    emit_human(layout);
    Ok(())
}

fn sync(ctx: &AppContext, args: &QueueSyncArgs) -> Result<()> {
    let api = ctx.api()?;
    let max_retries = args.max_retries.or(ctx.config.sync.max_retries);
    let cancel = CancelToken::new();
    if let Some(secs) = args.time_budget_secs {
        cancel.cancel_after(Duration::from_secs(secs));
    }
    let report = SyncProcessor::new(&ctx.store, &api)
        .with_max_retries(max_retries)
        .run_with_cancel(&cancel)?;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "replayed": report.replayed(),
            "failed": report.failed(),
            "exhausted": report.exhausted(),
            "cancelled": report.cancelled(),
            "report": report,
        }));
    }

    let mut layout = HumanLayout::new();
    layout.title("Queue sync");
    if report.is_empty() {
        layout.push_line("Nothing to sync.");
    }
    for item in &report.outcomes {
        let status = match &item.outcome {
            SyncOutcome::Replayed { .. } => "replayed".green().to_string(),
            SyncOutcome::Failed { error, .. } => format!("{} {error}", "failed".red()),
            SyncOutcome::Cancelled => "cancelled".yellow().to_string(),
            SyncOutcome::Exhausted { retry_count } => {
                format!("{} after {retry_count} attempts", "skipped".yellow())
            }
        };
        layout.push_line(format!("#{:<4} {} {status}", item.queue_id, item.url));
    }
    layout.blank().push_line(report.summary_line());
    emit_human(layout);
    Ok(())
}

fn remove(ctx: &AppContext, args: &QueueRemoveArgs) -> Result<()> {
    if ctx.store.get_queue_item(args.id)?.is_none() {
        return Err(TellmyError::NotFound(format!("queue item {}", args.id)));
    }
    ctx.store.remove_from_offline_queue(args.id)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "status": "ok", "id": args.id }))
    } else {
        println!("Removed queue item #{}", args.id);
        Ok(())
    }
}

fn clear(ctx: &AppContext) -> Result<()> {
    let queue = ctx.store.get_offline_queue()?;
    for item in &queue {
        ctx.store.remove_from_offline_queue(item.id)?;
    }
    let remaining = ctx.store.count(Collection::OfflineQueue)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({
            "status": "ok",
            "removed": queue.len(),
            "remaining": remaining,
        }))
    } else {
        println!("Removed {} queued item(s)", queue.len());
        Ok(())
    }
}
