use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, excerpt, format_time};
use crate::error::Result;
use crate::services::{Bookmarks, StoryService};

#[derive(Args, Debug)]
pub struct BookmarkArgs {
    #[command(subcommand)]
    pub command: BookmarkCommand,
}

#[derive(Subcommand, Debug)]
pub enum BookmarkCommand {
    /// Bookmark a story (fetched, or taken from the cache when offline)
    Add(BookmarkIdArgs),
    /// Remove a bookmark
    Remove(BookmarkIdArgs),
    /// List bookmarked stories
    List,
    /// Check whether a story is bookmarked
    Check(BookmarkIdArgs),
}

#[derive(Args, Debug)]
pub struct BookmarkIdArgs {
    pub id: String,
}

pub fn run(ctx: &AppContext, args: &BookmarkArgs) -> Result<()> {
    match &args.command {
        BookmarkCommand::Add(args) => add(ctx, args),
        BookmarkCommand::Remove(args) => remove(ctx, args),
        BookmarkCommand::List => list(ctx),
        BookmarkCommand::Check(args) => check(ctx, args),
    }
}

fn add(ctx: &AppContext, args: &BookmarkIdArgs) -> Result<()> {
    let api = ctx.api()?;
    let connectivity = ctx.connectivity(&api);
    let story = StoryService::new(&ctx.store, &api, connectivity.as_ref())
        .load_story_detail(&args.id)?
        .value
        .story;
    let saved = Bookmarks::new(&ctx.store).save(&story)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "status": "ok", "bookmark": saved }))
    } else {
        println!("{} {}", "Bookmarked".green(), saved.story.id);
        Ok(())
    }
}

fn remove(ctx: &AppContext, args: &BookmarkIdArgs) -> Result<()> {
    Bookmarks::new(&ctx.store).remove(&args.id)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "status": "ok", "id": args.id }))
    } else {
        println!("Removed bookmark {}", args.id);
        Ok(())
    }
}

fn list(ctx: &AppContext) -> Result<()> {
    let saved = Bookmarks::new(&ctx.store).list()?;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({ "count": saved.len(), "bookmarks": saved }));
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("Bookmarks ({})", saved.len()));
    for entry in &saved {
        layout.push_line(format!(
            "{} {} {} {}",
            format_time(entry.saved_at).dimmed(),
            entry.story.id.cyan(),
            entry.story.name.bold(),
            excerpt(&entry.story.description, 50)
        ));
    }
    emit_human(layout);
    Ok(())
}

fn check(ctx: &AppContext, args: &BookmarkIdArgs) -> Result<()> {
    let bookmarked = Bookmarks::new(&ctx.store).is_bookmarked(&args.id)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "id": args.id, "bookmarked": bookmarked }))
    } else {
        println!(
            "{} is {}bookmarked",
            args.id,
            if bookmarked { "" } else { "not " }
        );
        Ok(())
    }
}
