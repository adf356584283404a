//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod account;
pub mod bookmark;
pub mod cache;
pub mod prefs;
pub mod push;
pub mod queue;
pub mod storage;
pub mod stories;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Register(args) => account::register(ctx, args),
        Commands::Login(args) => account::login(ctx, args),
        Commands::Logout => account::logout(ctx),
        Commands::Stories(args) => stories::list(ctx, args),
        Commands::Story(args) => stories::show(ctx, args),
        Commands::Post(args) => stories::post(ctx, args),
        Commands::Bookmark(args) => bookmark::run(ctx, args),
        Commands::Queue(args) => queue::run(ctx, args),
        Commands::Prefs(args) => prefs::run(ctx, args),
        Commands::Cache(args) => cache::run(ctx, args),
        Commands::Storage => storage::usage(ctx),
        Commands::Reset(args) => storage::reset(ctx, args),
        Commands::Push(args) => push::run(ctx, args),
    }
}
