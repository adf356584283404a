//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// tellmy - share stories, online or not
#[derive(Parser, Debug)]
#[command(name = "tellmy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON on stdout for machine consumption
    #[arg(long, global = true, env = "TELLMY_ROBOT")]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/tellmy/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account on the Story API
    Register(commands::account::RegisterArgs),

    /// Log in and remember the access token
    Login(commands::account::LoginArgs),

    /// Forget the stored access token
    Logout,

    /// Show a page of the story feed
    Stories(commands::stories::StoriesArgs),

    /// Show one story
    Story(commands::stories::StoryArgs),

    /// Post a story (queued when offline)
    Post(commands::stories::PostArgs),

    /// Manage bookmarked stories
    Bookmark(commands::bookmark::BookmarkArgs),

    /// Inspect and replay the offline queue
    Queue(commands::queue::QueueArgs),

    /// Read and write preferences
    Prefs(commands::prefs::PrefsArgs),

    /// Inspect and prune the offline story cache
    Cache(commands::cache::CacheArgs),

    /// Report local storage usage
    Storage,

    /// Delete all local data
    Reset(commands::storage::ResetArgs),

    /// Manage the web push subscription
    Push(commands::push::PushArgs),
}
