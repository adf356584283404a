use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, excerpt, format_time};
use crate::error::Result;
use crate::storage::RetentionPolicy;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// List cached stories
    List,
    /// Evict cached stories older than the retention window
    Prune(CachePruneArgs),
}

#[derive(Args, Debug)]
pub struct CachePruneArgs {
    /// Maximum age in days (default: store.cache_max_age_days)
    #[arg(long)]
    pub max_age_days: Option<u32>,
}

pub fn run(ctx: &AppContext, args: &CacheArgs) -> Result<()> {
    match &args.command {
        CacheCommand::List => list(ctx),
        CacheCommand::Prune(args) => prune(ctx, args),
    }
}

fn list(ctx: &AppContext) -> Result<()> {
    let cached = ctx.store.get_all_cached_stories()?;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({ "count": cached.len(), "stories": cached }));
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("Cached stories ({})", cached.len()));
    for entry in &cached {
        layout.push_line(format!(
            "{} {} {}",
            format_time(entry.cached_at).dimmed(),
            entry.story.id.cyan(),
            excerpt(&entry.story.description, 60)
        ));
    }
    emit_human(layout);
    Ok(())
}

fn prune(ctx: &AppContext, args: &CachePruneArgs) -> Result<()> {
    let policy = args
        .max_age_days
        .map_or_else(|| ctx.config.store.retention(), RetentionPolicy::days);
    let deleted = policy.apply(&ctx.store)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({
            "status": "ok",
            "deleted": deleted,
            "max_age_secs": policy.max_age.as_secs(),
        }))
    } else {
        let mut layout = HumanLayout::new();
        layout
            .title("Cache pruned")
            .kv("Deleted", &deleted.to_string())
            .kv("Max age", &format!("{} day(s)", policy.max_age.as_secs() / 86_400));
        emit_human(layout);
        Ok(())
    }
}
