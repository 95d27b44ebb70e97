//! `quiz`: practice tests and question banks from the terminal, or a desktop window with `--features desktop`.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use quiz_core::model::{UserProfile, UserTier};
use services::{AppServices, Clock};

mod commands;
#[cfg(feature = "desktop")]
mod gui;

#[derive(Parser)]
#[command(name = "quiz", version, about = "Practice tests and question banks in the terminal")]
struct Cli {
    /// SQLite database holding attempts and settings
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3", global = true)]
    db_url: String,

    /// JSON content catalog
    #[arg(long, env = "QUIZ_CATALOG", default_value = "catalog.json", global = true)]
    catalog: PathBuf,

    /// Subscription tier (free, plus, pro). Without one every item is locked.
    #[arg(long, env = "QUIZ_TIER", global = true)]
    tier: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the practice tests and question banks of a topic
    List {
        #[arg(long, env = "QUIZ_TOPIC")]
        topic: String,
    },

    /// Start or resume a quiz
    Take {
        #[arg(long, env = "QUIZ_TOPIC")]
        topic: String,

        /// Id of the practice test or question bank
        item: String,

        /// Time-and-a-half accommodation
        #[arg(long)]
        additional_time: bool,

        /// Simulate the test-centre delay between sections
        #[arg(long)]
        prometric_delay: bool,
    },

    /// Open the desktop window on a topic
    #[cfg(feature = "desktop")]
    Gui {
        #[arg(long, env = "QUIZ_TOPIC")]
        topic: String,
    },

    /// Show or change app settings
    Settings {
        /// light or dark
        #[arg(long)]
        theme: Option<String>,

        #[arg(long)]
        sidebar_collapsed: Option<bool>,

        /// Seconds between timer checkpoints
        #[arg(long)]
        autosave_interval: Option<u32>,
    },
}

fn profile_from_tier(raw: Option<&str>) -> Option<UserProfile> {
    raw.map(|tier| UserProfile::new("local", UserTier::parse(tier)))
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;
    let services = AppServices::new_sqlite(&db_url, &cli.catalog, Clock::default_clock())
        .await
        .with_context(|| format!("opening {db_url} with catalog {}", cli.catalog.display()))?;
    let profile = profile_from_tier(cli.tier.as_deref());

    match cli.command {
        Commands::List { topic } => commands::list::execute(&services, &topic, profile.as_ref()).await,
        Commands::Take {
            topic,
            item,
            additional_time,
            prometric_delay,
        } => {
            commands::take::execute(
                &services,
                &topic,
                &item,
                profile.as_ref(),
                quiz_core::model::PracticeTestSettings {
                    additional_time,
                    prometric_delay,
                },
            )
            .await
        }
        Commands::Settings {
            theme,
            sidebar_collapsed,
            autosave_interval,
        } => commands::settings::execute(&services, theme, sidebar_collapsed, autosave_interval).await,
        #[cfg(feature = "desktop")]
        Commands::Gui { topic } => {
            gui::launch(&services, &topic, profile).await;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("QUIZ_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}
