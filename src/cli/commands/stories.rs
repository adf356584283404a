use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::api::{NewStory, StoryQuery};
use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, excerpt, format_time};
use crate::error::{Result, TellmyError};
use crate::services::{Bookmarks, Source, StoryService, Submission};
use crate::storage::Story;

#[derive(Args, Debug)]
pub struct StoriesArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = 10)]
    pub size: u32,

    /// Only stories with a location
    #[arg(long)]
    pub with_location: bool,
}

#[derive(Args, Debug)]
pub struct StoryArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Story text
    #[arg(long, short = 'd')]
    pub description: String,

    /// Photo to upload with the story
    #[arg(long)]
    pub photo: Option<PathBuf>,

    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

pub fn list(ctx: &AppContext, args: &StoriesArgs) -> Result<()> {
    if args.size == 0 || args.page == 0 {
        return Err(TellmyError::Validation(
            "--page and --size start at 1".to_string(),
        ));
    }
    let api = ctx.api()?;
    let connectivity = ctx.connectivity(&api);
    let service = StoryService::new(&ctx.store, &api, connectivity.as_ref());
    let loaded = service.load_stories(&StoryQuery {
        page: args.page,
        size: args.size,
        with_location: args.with_location,
    })?;

    if ctx.robot_mode {
        return emit_json(&loaded);
    }

    let bookmarks = Bookmarks::new(&ctx.store);
    let mut layout = HumanLayout::new();
    layout.title(&match loaded.source {
        Source::Remote => format!("Stories (page {})", args.page),
        Source::Cache => "Stories (offline, from cache)".to_string(),
    });
    if loaded.value.stories.is_empty() {
        layout.push_line("No stories.");
    }
    for story in &loaded.value.stories {
        let marker = if bookmarks.is_bookmarked(&story.id)? {
            "★".yellow().to_string()
        } else {
            " ".to_string()
        };
        layout.push_line(format!(
            "{marker} {} {} {}",
            story.id.cyan(),
            story.name.bold(),
            excerpt(&story.description, 60)
        ));
    }
    emit_human(layout);
    Ok(())
}

pub fn show(ctx: &AppContext, args: &StoryArgs) -> Result<()> {
    let api = ctx.api()?;
    let connectivity = ctx.connectivity(&api);
    let service = StoryService::new(&ctx.store, &api, connectivity.as_ref());
    let loaded = service.load_story_detail(&args.id)?;

    if ctx.robot_mode {
        return emit_json(&loaded);
    }

    let bookmarked = Bookmarks::new(&ctx.store).is_bookmarked(&args.id)?;
    let mut layout = HumanLayout::new();
    story_layout(&mut layout, &loaded.value.story);
    layout
        .kv("Bookmarked", if bookmarked { "yes" } else { "no" })
        .kv(
            "Source",
            match loaded.source {
                Source::Remote => "remote",
                Source::Cache => "cache",
            },
        );
    emit_human(layout);
    Ok(())
}

pub fn post(ctx: &AppContext, args: &PostArgs) -> Result<()> {
    let api = ctx.api()?;
    let connectivity = ctx.connectivity(&api);
    let service = StoryService::new(&ctx.store, &api, connectivity.as_ref());
    let submission = service.submit_story(&NewStory {
        description: args.description.clone(),
        photo: args.photo.clone(),
        lat: args.lat,
        lon: args.lon,
    })?;

    if ctx.robot_mode {
        return emit_json(&submission);
    }
    match submission {
        Submission::Sent { message } => println!("{} {message}", "Posted.".green()),
        Submission::Queued { item } => println!(
            "{} queued as #{}; run `tellmy queue sync` when back online",
            "Offline:".yellow(),
            item.id
        ),
    }
    Ok(())
}

pub(super) fn story_layout(layout: &mut HumanLayout, story: &Story) {
    layout
        .title(&story.id)
        .kv("Author", &story.name)
        .kv("Story", &story.description);
    if let Some(created) = story.created_at {
        layout.kv("Created", &format_time(created));
    }
    if let Some(photo) = &story.photo_url {
        layout.kv("Photo", photo);
    }
    if let (Some(lat), Some(lon)) = (story.lat, story.lon) {
        layout.kv("Location", &format!("{lat:.5}, {lon:.5}"));
    }
}
