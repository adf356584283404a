use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, format_bytes};
use crate::error::{Result, TellmyError};
use crate::storage::Collection;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm deleting bookmarks, cache, preferences and the offline queue
    #[arg(long)]
    pub yes: bool,
}

pub fn usage(ctx: &AppContext) -> Result<()> {
    let usage = ctx.store.storage_usage();
    let mut counts = Vec::new();
    for collection in Collection::ALL {
        counts.push((collection, ctx.store.count(collection)?));
    }

    if ctx.robot_mode {
        let collections: serde_json::Map<_, _> = counts
            .iter()
            .map(|(c, n)| (c.name().to_string(), serde_json::json!(n)))
            .collect();
        return emit_json(&serde_json::json!({
            "path": ctx.store.path(),
            "schema_version": ctx.store.schema_version(),
            "usage": usage,
            "collections": collections,
        }));
    }

    let mut layout = HumanLayout::new();
    layout.title("Local storage");
    if let Some(path) = ctx.store.path() {
        layout.kv("Database", &path.display().to_string());
    }
    layout.kv("Schema", &format!("v{}", ctx.store.schema_version()));
    match usage {
        Some(usage) => {
            layout
                .kv("Used", &format_bytes(usage.used))
                .kv("Available", &format_bytes(usage.available))
                .kv("Used %", &format!("{}%", usage.used_percent));
        }
        None => {
            layout.kv("Usage", &"unavailable".dimmed().to_string());
        }
    }
    layout.blank().section("Collections");
    for (collection, count) in &counts {
        layout.kv(collection.name(), &count.to_string());
    }
    emit_human(layout);
    Ok(())
}

pub fn reset(ctx: &AppContext, args: &ResetArgs) -> Result<()> {
    if !args.yes {
        return Err(TellmyError::Validation(
            "reset deletes all local data; pass --yes to confirm".to_string(),
        ));
    }
    ctx.store.clear_all()?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "status": "ok" }))
    } else {
        println!("All local data deleted.");
        Ok(())
    }
}
