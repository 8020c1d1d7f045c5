//! wikijson - JSON snapshot cache of wiki farm metadata
//!
//! Main entry point for the wikijson CLI.

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use wikijson::config::{validate_config_result, WikiJsonConfig};
use wikijson::database::SqliteWikiDatabase;
use wikijson::invalidation::Invalidator;
use wikijson::manager::{regenerate_farm_list, validate_wiki_id};
use wikijson::snapshot::{wiki_file, SnapshotStore, DATABASES_FILE, DELETED_FILE};
use wikijson::staleness::Changes;
use wikijson::timestamps::{SqliteTimestampStore, DATABASES_ENTRY};
use wikijson::{UpdateReport, WikiJson, WikiJsonError};

/// wikijson - keep a wiki farm's JSON snapshots in sync with its database
#[derive(Parser, Debug)]
#[command(name = "wikijson")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/wikijson/config.yaml)
    #[arg(short, long, env = "WIKIJSON_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config and create the cache directory and databases
    Init,

    /// Regenerate the stale snapshots of a wiki and of the farm list
    Update {
        /// Wiki database name (e.g., testwiki)
        wiki: String,

        /// Regenerate even if the snapshots are fresh
        #[arg(long)]
        force: bool,
    },

    /// Invalidate a wiki's snapshot
    ResetWiki {
        wiki: String,

        /// Regenerate right away
        #[arg(long)]
        update: bool,
    },

    /// Invalidate the farm list snapshots
    ResetDatabases {
        /// Regenerate the farm list right away
        #[arg(long)]
        update: bool,
    },

    /// Show invalidation and snapshot timestamps of a wiki without changing them
    Status { wiki: String },

    /// Print a wiki's snapshot
    Show { wiki: String },
}

fn main() {
    if let Err(e) = wikijson::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> wikijson::Result<()> {
    match cli.command {
        // Init creates the config, every other command needs one
        Commands::Init => handle_init_command(cli.config),
        Commands::Update { wiki, force } => {
            handle_update_command(&load_config(cli.config)?, &wiki, force)
        }
        Commands::ResetWiki { wiki, update } => {
            handle_reset_wiki_command(&load_config(cli.config)?, &wiki, update)
        }
        Commands::ResetDatabases { update } => {
            handle_reset_databases_command(&load_config(cli.config)?, update)
        }
        Commands::Status { wiki } => handle_status_command(&load_config(cli.config)?, &wiki),
        Commands::Show { wiki } => handle_show_command(&load_config(cli.config)?, &wiki),
    }
}

fn handle_update_command(config: &WikiJsonConfig, wiki: &str, force: bool) -> wikijson::Result<()> {
    let mut json = WikiJson::from_config(wiki, config)?;

    let report = if force {
        let changes = json.changes();
        let databases = json.generate_database_list();
        let written = json.generate_wiki()?;
        UpdateReport {
            changes,
            databases,
            wiki: written,
        }
    } else {
        json.update()?
    };

    print_report(wiki, &report);
    Ok(())
}

fn handle_reset_wiki_command(config: &WikiJsonConfig, wiki: &str, update: bool) -> wikijson::Result<()> {
    let mut json = WikiJson::from_config(wiki, config)?;
    json.reset_wiki()?;
    println!("Invalidated {} at {}", wiki, format_timestamp(json.wiki_timestamp()));

    if update {
        let report = json.update()?;
        print_report(wiki, &report);
    }
    Ok(())
}

fn open_invalidator(config: &WikiJsonConfig) -> wikijson::Result<Invalidator> {
    Ok(Invalidator::new(
        config.cache_namespace.clone(),
        Rc::new(SqliteWikiDatabase::open(&config.database)?),
        Rc::new(SqliteTimestampStore::open(&config.timestamp_store)?),
    ))
}

fn handle_reset_databases_command(config: &WikiJsonConfig, update: bool) -> wikijson::Result<()> {
    let invalidator = open_invalidator(config)?;

    let at = invalidator.reset_database_list()?;
    println!("Invalidated farm list at {}", format_timestamp(Some(at)));

    if update {
        let snapshots = SnapshotStore::open(&config.cache_directory)?;
        let written = regenerate_farm_list(invalidator.database(), &snapshots, at);
        let report = UpdateReport {
            changes: Changes {
                databases: true,
                wiki: false,
            },
            databases: written,
            wiki: false,
        };
        for line in report_lines("farm", &report) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Timestamps of one wiki and the farm list as currently stored
struct Status {
    databases_invalidated: Option<i64>,
    databases_snapshot: i64,
    wiki_invalidated: Option<i64>,
    wiki_snapshot: i64,
    changes: Changes,
}

/// Read timestamps without seeding missing ones
fn read_status(invalidator: &Invalidator, snapshots: &SnapshotStore, wiki: &str) -> Status {
    let databases_invalidated = invalidator.current(DATABASES_ENTRY);
    let wiki_invalidated = invalidator.current(wiki);
    let databases_snapshot = snapshots
        .read_timestamp(DATABASES_FILE)
        .min(snapshots.read_timestamp(DELETED_FILE));
    let wiki_snapshot = snapshots.read_timestamp(&wiki_file(wiki));

    Status {
        databases_invalidated,
        databases_snapshot,
        wiki_invalidated,
        wiki_snapshot,
        changes: Changes::detect(
            databases_snapshot,
            databases_invalidated,
            wiki_snapshot,
            wiki_invalidated,
        ),
    }
}

fn handle_status_command(config: &WikiJsonConfig, wiki: &str) -> wikijson::Result<()> {
    validate_wiki_id(wiki)?;
    let invalidator = open_invalidator(config)?;
    let snapshots = SnapshotStore::open(&config.cache_directory)?;
    let status = read_status(&invalidator, &snapshots, wiki);

    println!("Wiki: {}", wiki);
    println!("Cache directory: {}", snapshots.dir().display());
    println!();
    println!("Farm list:");
    println!("  Invalidated: {}", format_timestamp(status.databases_invalidated));
    println!("  Snapshot:    {}", format_timestamp(Some(status.databases_snapshot)));
    println!("  Stale:       {}", status.changes.databases);
    println!();
    println!("{}.json:", wiki);
    println!("  Invalidated: {}", format_timestamp(status.wiki_invalidated));
    println!("  Snapshot:    {}", format_timestamp(Some(status.wiki_snapshot)));
    println!("  Stale:       {}", status.changes.wiki);
    Ok(())
}

fn handle_show_command(config: &WikiJsonConfig, wiki: &str) -> wikijson::Result<()> {
    validate_wiki_id(wiki)?;
    let snapshots = SnapshotStore::open(&config.cache_directory)?;

    match snapshots.read_wiki(wiki) {
        Some(snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        None => Err(WikiJsonError::Other(format!(
            "No snapshot for {}. Run 'wikijson update {}' first.",
            wiki, wiki
        ))),
    }
}

fn load_config(path: Option<PathBuf>) -> wikijson::Result<WikiJsonConfig> {
    let config = match path {
        Some(path) => WikiJsonConfig::load(path)?,
        None => match WikiJsonConfig::load_default() {
            Ok(config) => config,
            Err(WikiJsonError::Config(msg)) if msg.contains("Config file not found") => {
                return Err(WikiJsonError::Config(
                    "No configuration found. Run 'wikijson init' first to create one.".to_string(),
                ));
            }
            Err(e) => return Err(e),
        },
    };

    validate_config_result(&config)?;
    Ok(config)
}

fn handle_init_command(path: Option<PathBuf>) -> wikijson::Result<()> {
    let path = path.unwrap_or_else(WikiJsonConfig::default_path);

    let config = if path.exists() {
        println!("Using existing config at {}", path.display());
        WikiJsonConfig::load(&path)?
    } else {
        let config = WikiJsonConfig::new();
        config.save(&path)?;
        println!("Created config at {}", path.display());
        config
    };

    validate_config_result(&config)?;

    std::fs::create_dir_all(&config.cache_directory)?;
    SqliteWikiDatabase::initialize(&config.database)?;
    SqliteTimestampStore::open(&config.timestamp_store)?;

    println!("  Cache directory: {}", config.cache_directory.display());
    println!("  Wikis database:  {}", config.database.display());
    println!("  Timestamp store: {}", config.timestamp_store.display());
    Ok(())
}

fn print_report(wiki: &str, report: &UpdateReport) {
    for line in report_lines(wiki, report) {
        println!("{}", line);
    }
}

fn report_lines(wiki: &str, report: &UpdateReport) -> Vec<String> {
    let list_written = report.databases.databases || report.databases.deleted;
    if !report.changes.any() && !report.wiki && !list_written {
        return vec![format!("{}: snapshots are fresh", wiki)];
    }

    let mark = |written: bool| if written { "written" } else { "kept" };
    let mut lines = Vec::new();

    if report.changes.databases || list_written {
        lines.push(format!("databases.json: {}", mark(report.databases.databases)));
        lines.push(format!("deleted.json:   {}", mark(report.databases.deleted)));
    }
    if report.changes.wiki || report.wiki {
        lines.push(format!("{}.json: {}", wiki, mark(report.wiki)));
    }
    lines
}

/// Render a `YYYYMMDDHHMMSS` timestamp for humans
fn format_timestamp(timestamp: Option<i64>) -> String {
    match timestamp {
        None | Some(0) => "never".to_string(),
        Some(ts) => NaiveDateTime::parse_from_str(&ts.to_string(), "%Y%m%d%H%M%S")
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|_| ts.to_string()),
    }
}
