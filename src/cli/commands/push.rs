use clap::{Args, Subcommand};

use crate::api::{PushKeys, PushSubscription};
use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::Result;
use crate::services::{PushService, Submission};

#[derive(Args, Debug)]
pub struct PushArgs {
    #[command(subcommand)]
    pub command: PushCommand,
}

#[derive(Subcommand, Debug)]
pub enum PushCommand {
    /// Register a web push subscription
    Subscribe(PushSubscribeArgs),
    /// Remove a web push subscription (default: the remembered one)
    Unsubscribe(PushUnsubscribeArgs),
    /// Show the remembered subscription
    Status,
}

#[derive(Args, Debug)]
pub struct PushSubscribeArgs {
    #[arg(long)]
    pub endpoint: String,

    /// Client public key (base64url)
    #[arg(long)]
    pub p256dh: String,

    /// Auth secret (base64url)
    #[arg(long)]
    pub auth: String,
}

#[derive(Args, Debug)]
pub struct PushUnsubscribeArgs {
    #[arg(long)]
    pub endpoint: Option<String>,
}

pub fn run(ctx: &AppContext, args: &PushArgs) -> Result<()> {
    let api = ctx.api()?;
    let connectivity = ctx.connectivity(&api);
    let push = PushService::new(&ctx.store, &api, connectivity.as_ref());

    let submission = match &args.command {
        PushCommand::Subscribe(args) => Some(push.subscribe(&PushSubscription {
            endpoint: args.endpoint.clone(),
            keys: PushKeys {
                p256dh: args.p256dh.clone(),
                auth: args.auth.clone(),
            },
        })?),
        PushCommand::Unsubscribe(args) => Some(push.unsubscribe(args.endpoint.as_deref())?),
        PushCommand::Status => None,
    };
    let status = push.status()?;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "result": submission,
            "push": status,
        }));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Web push")
        .kv("Subscribed", if status.subscribed { "yes" } else { "no" });
    if let Some(endpoint) = &status.endpoint {
        layout.kv("Endpoint", endpoint);
    }
    match submission {
        Some(Submission::Sent { message }) => {
            layout.kv("Server", &message);
        }
        Some(Submission::Queued { item }) => {
            layout.kv("Queued", &format!("#{} (run `tellmy queue sync` when online)", item.id));
        }
        None => {}
    }
    emit_human(layout);
    Ok(())
}
