mod channel_cmds;
mod config;
mod plan_cmd;
mod product_cmds;
mod report_cmd;
mod settings_cmd;
mod task_cmds;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use creatorflow_core::clock::{Clock, SystemClock, local_today};
use creatorflow_core::generate::Shift;
use creatorflow_core::state::AppState;
use creatorflow_store::JsonFileStore;
use creatorflow_store::models::{ClockTime, Priority, Theme};

use config::CreatorFlowConfig;

#[derive(Parser)]
#[command(name = "creatorflow", about = "Content-planning calendar with an AI scheduler")]
struct Cli {
    /// Data directory (overrides CREATORFLOW_DATA_DIR env var)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a creatorflow config file
    Init {
        /// Gemini API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Gemini model name
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// AI planner
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Calendar tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Product inventory
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Channels (top-level categories)
    Channel {
        #[command(subcommand)]
        command: ChannelCommands,
    },
    /// Sub-categories within a channel
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Per-channel progress and schedule totals
    Report {
        /// Only count tasks on this day
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Integration settings and theme
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Ask the model for a day plan and add it to the calendar
    Generate {
        /// Day to plan (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Time window: full, morning, afternoon, evening
        #[arg(long, default_value = "full")]
        shift: Shift,
        /// What to prioritise (free text)
        #[arg(long, default_value = "")]
        focus: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List tasks (all days, or one day)
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Add a task, or replace one when --id names an existing task
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        channel: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Start time, HH:MM (24-hour)
        #[arg(long)]
        start: ClockTime,
        /// Minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,
        /// High, Medium, or Low
        #[arg(long, default_value = "Medium")]
        priority: Priority,
        #[arg(long)]
        notes: Option<String>,
        /// Product this task features
        #[arg(long)]
        product: Option<String>,
        /// Existing task ID to replace
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a task
    Delete { task_id: String },
    /// Flip a task's completion flag
    Toggle { task_id: String },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List products with their aging status
    List,
    /// Add a product to the inventory
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        sub_category: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a product
    Delete { product_id: String },
}

#[derive(Subcommand)]
pub enum ChannelCommands {
    /// List channels with targets and sub-categories
    List,
    /// Add a channel
    Add { name: String },
    /// Rename a channel everywhere it is referenced
    Rename { old: String, new: String },
    /// Delete an unused channel (the last one cannot be deleted)
    Delete { name: String },
    /// Set a channel's task target
    Target { name: String, target: u32 },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a sub-category to a channel
    Add { channel: String, name: String },
    /// Rename a sub-category within a channel
    Rename {
        channel: String,
        old: String,
        new: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Store Notion integration credentials (never sent anywhere)
    Notion {
        #[arg(long)]
        key: String,
        #[arg(long)]
        db: String,
    },
    /// Set the colour theme
    Theme { theme: Theme },
    /// Show current settings
    Show,
}

/// Execute the `creatorflow init` command: write config file.
fn cmd_init(
    data_dir: Option<&Path>,
    api_key: Option<String>,
    model: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        store: config::StoreSection {
            data_dir: data_dir.map(Path::to_path_buf),
        },
        gemini: config::GeminiSection {
            api_key,
            model,
            ..Default::default()
        },
        calendar: Default::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    if let Some(dir) = &cfg.store.data_dir {
        println!("  store.data_dir = {}", dir.display());
    }
    if let Some(model) = &cfg.gemini.model {
        println!("  gemini.model = {model}");
    }
    if !has_key {
        println!();
        println!(
            "No API key stored. Set {} before running `creatorflow plan generate`.",
            config::API_KEY_ENV
        );
    }

    Ok(())
}

/// Open the data directory and load application state.
fn open_state(resolved: &CreatorFlowConfig, clock: Arc<dyn Clock>) -> anyhow::Result<AppState> {
    let store = JsonFileStore::open(&resolved.store);
    tracing::debug!(dir = %store.dir().display(), "opening data directory");
    AppState::load_at(Arc::new(store), clock, resolved.utc_offset_hours)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init {
            api_key,
            model,
            force,
        } => return cmd_init(cli.data_dir.as_deref(), api_key, model, force),
        other => other,
    };

    let resolved = CreatorFlowConfig::resolve(cli.data_dir.as_deref())?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let today = local_today(clock.now(), resolved.utc_offset_hours);
    let mut state = open_state(&resolved, clock.clone())?;

    match command {
        Commands::Init { .. } => {}
        Commands::Plan { command } => {
            plan_cmd::run_plan_command(command, state, &resolved, clock, today).await?;
        }
        Commands::Task { command } => {
            task_cmds::run_task_command(command, &mut state, today)?;
        }
        Commands::Product { command } => {
            product_cmds::run_product_command(command, &mut state)?;
        }
        Commands::Channel { command } => {
            channel_cmds::run_channel_command(command, &mut state)?;
        }
        Commands::Category { command } => {
            channel_cmds::run_category_command(command, &mut state)?;
        }
        Commands::Report { date } => {
            report_cmd::run_report(&state, date);
        }
        Commands::Settings { command } => {
            settings_cmd::run_settings_command(command, &mut state);
        }
    }

    Ok(())
}
