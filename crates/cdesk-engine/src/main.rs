//! `cdesk`: operator CLI over the reconciliation engine.

use anyhow::{bail, Context, Result};
use cdesk_engine::prelude::*;
use cdesk_engine::WriteAction;
use cdesk_gateway::{InMemoryGateway, YouTubeGateway};
use cdesk_store::{Author, Comment};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cdesk", version, about = "Creator dashboard comment moderation")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// OAuth access token for the YouTube Data API
    #[arg(long, global = true, env = "CDESK_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List comment threads of a video
    List {
        /// Video id or URL
        video: String,
    },
    /// Post a top-level comment
    Post {
        /// Video id or URL
        video: String,
        /// Comment text
        text: String,
    },
    /// Reply to a thread
    Reply {
        /// Video id or URL
        video: String,
        /// Thread or root comment id
        thread: String,
        /// Reply text
        text: String,
    },
    /// Delete a thread root or reply
    Delete {
        /// Video id or URL
        video: String,
        /// Comment id
        id: String,
    },
    /// Walk through a post, reply, failed delete and resync offline
    Demo {
        /// Resync delay in milliseconds
        #[arg(long, default_value_t = 200)]
        resync_ms: u64,
    },
}

impl Command {
    fn video(&self) -> Option<&str> {
        match self {
            Self::List { video }
            | Self::Post { video, .. }
            | Self::Reply { video, .. }
            | Self::Delete { video, .. } => Some(video.as_str()),
            Self::Demo { .. } => None,
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_video(input: &str) -> Result<VideoId> {
    match VideoId::parse(input) {
        Some(video) => Ok(video),
        None => bail!("not a video id or URL: {input:?}"),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match &cli.config {
        Some(path) => DeskConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DeskConfig::default(),
    };
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Demo { resync_ms } => run_demo(config, Duration::from_millis(resync_ms)).await,
        command => {
            let Some(token) = cli.token else {
                bail!("an access token is required (--token or CDESK_ACCESS_TOKEN)");
            };
            let gateway = YouTubeGateway::new(config.youtube.clone())?.with_bearer_token(token.clone());
            let engine = ReconciliationEngine::new(gateway, TracingNotifier, config.engine);
            let identity = Identity {
                authenticated: true,
                bearer: Some(token),
                ..Identity::default()
            };
            run_remote(&engine, identity, command).await
        }
    }
}

async fn run_remote(engine: &ReconciliationEngine, identity: Identity, command: Command) -> Result<()> {
    let Some(video) = command.video() else {
        bail!("command does not target a video");
    };
    let video = parse_video(video)?;
    let session = Session::new(identity).with_video(video.clone());

    let loaded = engine.load_threads_for_video(&session, video).await?;
    let outcome = match command {
        Command::List { .. } | Command::Demo { .. } => None,
        Command::Post { text, .. } => Some(engine.post_top_level_comment(&session, &text).await?),
        Command::Reply { thread, text, .. } => Some(
            engine
                .reply_to_thread(&session, &CommentId::from(thread.as_str()), &text)
                .await?,
        ),
        Command::Delete { id, .. } => Some(
            engine
                .delete_comment(&session, &CommentId::from(id.as_str()))
                .await?,
        ),
    };

    print_json(&json!({
        "video_id": engine.loaded_video(),
        "comments_disabled": loaded == LoadOutcome::CommentsDisabled,
        "outcome": outcome.as_ref().map(|o| match o.applied_id() {
            Some(id) => json!({ "applied": id.to_string() }),
            None => json!("suppressed"),
        }),
        "threads": engine.threads(),
    }))
}

async fn run_demo(config: DeskConfig, resync_delay: Duration) -> Result<()> {
    let video = VideoId::new("demo-video");
    let gateway = Arc::new(InMemoryGateway::new().with_author(Author::new("Demo User", "")));
    gateway.seed(
        &video,
        [Thread::new(Comment::new(
            CommentId::confirmed("seed-1"),
            Author::new("Viewer", ""),
            "Great video!",
            Utc::now(),
        ))],
    );

    let engine = ReconciliationEngine::new(
        Arc::clone(&gateway),
        TracingNotifier,
        config.engine.with_resync_delay(resync_delay),
    );
    let session = Session::new(Identity::signed_in("Demo User", "")).with_video(video.clone());

    engine.load_threads_for_video(&session, video.clone()).await?;
    engine.post_top_level_comment(&session, "Thanks for watching!").await?;
    engine
        .reply_to_thread(&session, &CommentId::confirmed("seed-1"), "Glad you liked it")
        .await?;

    gateway.fail_next_writes(1);
    match engine.delete_comment(&session, &CommentId::confirmed("seed-1")).await {
        Err(EngineError::RemoteWrite { action: WriteAction::Delete, .. }) => {
            tracing::info!("delete failed as scripted; thread restored");
        }
        other => bail!("unexpected delete result: {other:?}"),
    }

    tokio::time::sleep(resync_delay + Duration::from_millis(50)).await;

    print_json(&json!({
        "video_id": video,
        "threads": engine.threads(),
        "activity": engine.activity(),
    }))
}
