use clap::{Args, Subcommand};
use serde_json::Value;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::{Result, TellmyError};

#[derive(Args, Debug)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Show one preference, or all of them
    Get(PrefsGetArgs),
    /// Set a preference; the value is parsed as JSON, falling back to a string
    Set(PrefsSetArgs),
    /// Delete a preference
    Delete(PrefsKeyArgs),
}

#[derive(Args, Debug)]
pub struct PrefsGetArgs {
    pub key: Option<String>,
}

#[derive(Args, Debug)]
pub struct PrefsSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Args, Debug)]
pub struct PrefsKeyArgs {
    pub key: String,
}

pub fn run(ctx: &AppContext, args: &PrefsArgs) -> Result<()> {
    match &args.command {
        PrefsCommand::Get(args) => get(ctx, args),
        PrefsCommand::Set(args) => set(ctx, args),
        PrefsCommand::Delete(args) => delete(ctx, args),
    }
}

fn get(ctx: &AppContext, args: &PrefsGetArgs) -> Result<()> {
    let Some(key) = &args.key else {
        let entries = ctx.store.list_preferences()?;
        if ctx.robot_mode {
            return emit_json(&entries);
        }
        let mut layout = HumanLayout::new();
        layout.title("Preferences");
        for entry in &entries {
            layout.kv(&entry.key, &entry.value.to_string());
        }
        emit_human(layout);
        return Ok(());
    };

    let value = ctx
        .store
        .get_preference(key)?
        .ok_or_else(|| TellmyError::NotFound(format!("preference {key}")))?;
    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "key": key, "value": value }))
    } else {
        println!("{value}");
        Ok(())
    }
}

fn set(ctx: &AppContext, args: &PrefsSetArgs) -> Result<()> {
    let value = parse_value(&args.value);
    ctx.store.set_preference(&args.key, &value)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "status": "ok", "key": args.key, "value": value }))
    } else {
        println!("{} = {value}", args.key);
        Ok(())
    }
}

fn delete(ctx: &AppContext, args: &PrefsKeyArgs) -> Result<()> {
    ctx.store.delete_preference(&args.key)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "status": "ok", "key": args.key }))
    } else {
        println!("Deleted {}", args.key);
        Ok(())
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
