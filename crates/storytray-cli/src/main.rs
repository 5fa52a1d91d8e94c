//! `storytray` command-line front end

mod config;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::{media_file, CliConfig, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storytray_core::config::load_toml;
use storytray_core::{
    spawn_reconciled_tray, Collaborators, JsonFileStore, MediaKind, PlaybackState, PublishRequest, StoryId,
    StoryTray, SystemClock, TimerFactory, TokioTimers,
};
use storytray_http::{HttpMediaUploader, HttpStoryService};
use tracing_subscriber::EnvFilter;

/// How often `play` polls the driver for progress
const PLAY_POLL: Duration = Duration::from_millis(250);

fn cli() -> Command {
    Command::new("storytray")
        .version(storytray_core::VERSION)
        .about("Ephemeral story tray")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .default_value(DEFAULT_CONFIG_FILE)
                .value_parser(value_parser!(PathBuf))
                .help("Path to config file"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Override the directory holding cached stories"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .env("STORYTRAY_TOKEN")
                .help("Bearer token for the story service"),
        )
        .subcommand(
            Command::new("list")
                .about("Reconcile with the server and show visible stories")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                )
                .arg(
                    Arg::new("offline")
                        .long("offline")
                        .action(ArgAction::SetTrue)
                        .help("Skip reconciliation"),
                ),
        )
        .subcommand(
            Command::new("publish")
                .about("Upload a file and add it to the tray")
                .arg(Arg::new("file").required(true).value_parser(value_parser!(PathBuf)))
                .arg(
                    Arg::new("video")
                        .long("video")
                        .action(ArgAction::SetTrue)
                        .help("Publish as video regardless of file type"),
                ),
        )
        .subcommand(
            Command::new("play")
                .about("Play stories with auto-advance")
                .arg(Arg::new("id").help("Story to start from (default: newest)")),
        )
        .subcommand(Command::new("seen").about("List seen story ids"))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("list", args)) => list(&config, args).await,
        Some(("publish", args)) => publish(&config, args).await,
        Some(("play", args)) => play(&config, args).await,
        Some(("seen", _)) => seen(&config).await,
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(matches: &ArgMatches) -> Result<CliConfig> {
    let path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config: CliConfig =
        load_toml(&path).with_context(|| format!("loading {}", path.display()))?;

    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config.data_dir = dir.clone();
    }
    if let Some(token) = matches.get_one::<String>("token") {
        config.http.auth_token = Some(token.clone());
    }
    Ok(config)
}

async fn open_tray(config: &CliConfig, timers: Box<dyn TimerFactory>) -> Result<StoryTray> {
    let stories = HttpStoryService::new(&config.http).context("story service")?;
    let uploader = HttpMediaUploader::new(&config.http).context("uploader")?;

    let collaborators = Collaborators {
        clock: Arc::new(SystemClock),
        store: Arc::new(JsonFileStore::new(&config.data_dir)),
        stories: Arc::new(stories),
        uploader: Arc::new(uploader),
        timers,
    };
    Ok(StoryTray::load(config.tray.clone(), config.viewer.clone(), collaborators).await)
}

async fn list(config: &CliConfig, args: &ArgMatches) -> Result<()> {
    let (timers, _tickets) = TokioTimers::new();
    let mut tray = open_tray(config, Box::new(timers)).await?;
    if !args.get_flag("offline") {
        tray.reconcile().await;
    }

    let entries = tray.entries();
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No stories in the last {}h", tray.config().retention_secs / 3600);
        return Ok(());
    }
    let now = tray.now();
    for entry in entries {
        let age = now - entry.story.created_at;
        println!(
            "{} {:<20} {:<5} {:>3}h{:02}m  {}",
            if entry.seen { " " } else { "*" },
            entry.label,
            entry.story.media_kind,
            age.num_hours(),
            age.num_minutes() % 60,
            entry.story.id
        );
    }
    Ok(())
}

async fn publish(config: &CliConfig, args: &ArgMatches) -> Result<()> {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        bail!("no file given");
    };
    let file = media_file(path);
    let request = if args.get_flag("video") {
        PublishRequest::new(file, MediaKind::Video)
    } else {
        PublishRequest::from_file(file)
    };

    let (timers, _tickets) = TokioTimers::new();
    let mut tray = open_tray(config, Box::new(timers)).await?;
    let item = tray.publish(request).await?;

    println!("{} {} ({:?})", item.media_kind, item.id, item.provenance);
    println!("{}", item.media_url);
    Ok(())
}

async fn play(config: &CliConfig, args: &ArgMatches) -> Result<()> {
    let (timers, tickets) = TokioTimers::new();
    let mut tray = open_tray(config, Box::new(timers)).await?;
    tray.reconcile().await;

    let start = match args.get_one::<String>("id") {
        Some(id) => StoryId::new(id.as_str()),
        None => match tray.visible().first() {
            Some(story) => story.id.clone(),
            None => {
                println!("Nothing to play");
                return Ok(());
            }
        },
    };

    let (handle, task) = spawn_reconciled_tray(tray, tickets);
    let mut shown = None;
    handle.open(start).await?;

    let mut poll = tokio::time::interval(PLAY_POLL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.close().await?;
                println!("Closed");
                break;
            }
            _ = poll.tick() => {
                let snapshot = handle.snapshot().await?;
                let Some(current) = snapshot.current else {
                    if snapshot.playback == PlaybackState::Closed {
                        println!("End of stories");
                        break;
                    }
                    continue;
                };
                if shown.as_ref() != Some(&current.id) {
                    let index = snapshot.playback.index().unwrap_or_default();
                    println!(
                        "[{}/{}] {} {} ({}, {}m ago)",
                        index + 1,
                        snapshot.entries.len(),
                        current.owner_display_name,
                        current.media_url,
                        current.media_kind,
                        (Utc::now() - current.created_at).num_minutes()
                    );
                    shown = Some(current.id);
                }
            }
        }
    }

    handle.shutdown().await?;
    task.await.context("tray driver panicked")?;
    Ok(())
}

async fn seen(config: &CliConfig) -> Result<()> {
    let (timers, _tickets) = TokioTimers::new();
    let tray = open_tray(config, Box::new(timers)).await?;
    for id in tray.seen().iter() {
        println!("{id}");
    }
    Ok(())
}
