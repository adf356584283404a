use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::{Result, TellmyError};
use crate::services::Session;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// Password (read from TELLMY_PASSWORD when omitted)
    #[arg(long, env = "TELLMY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    /// Password (read from TELLMY_PASSWORD when omitted)
    #[arg(long, env = "TELLMY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub fn register(ctx: &AppContext, args: &RegisterArgs) -> Result<()> {
    let api = ctx.api()?;
    let message = Session::new(&ctx.store, &api).register(&args.name, &args.email, &args.password)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({
            "status": "ok",
            "email": args.email,
            "message": message.message,
        }))
    } else {
        let mut layout = HumanLayout::new();
        layout
            .title("Account created")
            .kv("Email", &args.email)
            .kv("Server", &message.message);
        emit_human(layout);
        Ok(())
    }
}

pub fn login(ctx: &AppContext, args: &LoginArgs) -> Result<()> {
    let api = ctx.api()?;
    let result = Session::new(&ctx.store, &api).login(&args.email, &args.password)?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({
            "status": "ok",
            "user_id": result.user_id,
            "name": result.name,
        }))
    } else {
        let mut layout = HumanLayout::new();
        layout
            .title("Logged in")
            .kv("Name", &result.name)
            .kv("User ID", &result.user_id);
        emit_human(layout);
        Ok(())
    }
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    let api = ctx.api()?;
    let session = Session::new(&ctx.store, &api);
    if session.access_token()?.is_none() {
        return Err(TellmyError::Unauthenticated("not logged in".to_string()));
    }
    session.logout()?;

    if ctx.robot_mode {
        emit_json(&serde_json::json!({ "status": "ok" }))
    } else {
        println!("Logged out.");
        Ok(())
    }
}
