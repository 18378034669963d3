//! eisenhower: command-line front end for the Eisenhower task store.

use anyhow::{Context, Result, bail};
use clap::Parser;
use eisenhower_tasks::backend::TaskBackend;
use eisenhower_tasks::backend::kv::{FileBlobStore, KvBackend};
use eisenhower_tasks::cli::export::ExportArgs;
use eisenhower_tasks::cli::import::ImportArgs;
use eisenhower_tasks::cli::{Cli, Command};
use eisenhower_tasks::config::{BackendKind, Config, ConfigLoader, ConfigPaths, ENV_CONFIG_PATH};
use eisenhower_tasks::db::Database;
use eisenhower_tasks::error::StoreError;
use eisenhower_tasks::export::{CURRENT_SCHEMA_VERSION, Snapshot, export_snapshot, import_snapshot};
use eisenhower_tasks::format::{self, OutputFormat};
use eisenhower_tasks::logging::{self, LogTarget};
use eisenhower_tasks::store::{StoreEvent, TaskStore};
use eisenhower_tasks::types::{Quadrant, TaskId};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    // --config takes the place of EISENHOWER_CONFIG_PATH.
    let explicit_config = cli.config.clone();
    let mut loader = ConfigLoader::load_with(ConfigPaths::discover(), |key| {
        if key == ENV_CONFIG_PATH && explicit_config.is_some() {
            return explicit_config.clone();
        }
        std::env::var(key).ok()
    })?;
    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "config source");
    }

    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.store.db_path = db_path.into();
    }
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }
    let config = loader.into_config();

    let format = cli.format.unwrap_or(config.output.format);
    let command = cli.command.unwrap_or(Command::List { parent: None });

    match config.store.backend {
        BackendKind::Sqlite => {
            let db = Database::open(&config.store.db_path).with_context(|| {
                format!("Failed to open database {}", config.store.db_path.display())
            })?;
            run(db, &config, format, command).await
        }
        BackendKind::Kv => {
            let backend = KvBackend::new(FileBlobStore::new(&config.store.kv_path));
            run(backend, &config, format, command).await
        }
    }
}

async fn run<B: TaskBackend>(
    backend: B,
    config: &Config,
    format: OutputFormat,
    command: Command,
) -> Result<()> {
    let mut store = TaskStore::new(backend).with_root_title(config.store.root_title.clone());
    store.load().await?;

    match command {
        Command::List { parent } => {
            if let Some(parent) = parent {
                let id = resolve_id(&store, &parent)?;
                store.navigate_to(&id).await?;
            }
            let breadcrumb = store.hierarchy().breadcrumb();
            let buckets = store.current_quadrants();
            match format {
                OutputFormat::Markdown => {
                    print!(
                        "{}",
                        format::format_level_markdown(&breadcrumb, &buckets, store.forest())
                    );
                }
                OutputFormat::Json => {
                    let mut quadrants = Map::new();
                    for quadrant in Quadrant::ALL {
                        quadrants.insert(
                            quadrant.label().to_string(),
                            serde_json::to_value(buckets.get(quadrant))?,
                        );
                    }
                    let view = json!({ "breadcrumb": breadcrumb, "quadrants": quadrants });
                    println!("{}", format::to_json(&view)?);
                }
            }
        }
        Command::Tree => match format {
            OutputFormat::Markdown => print!("{}", format::format_tree_markdown(store.forest())),
            OutputFormat::Json => println!("{}", format::to_json(&store.forest().to_trees())?),
        },
        Command::Show { id } => {
            let id = resolve_id(&store, &id)?;
            let counts = store.subtask_counts(&id);
            let task = store.open_details(&id)?;
            match format {
                OutputFormat::Markdown => print!("{}", format::format_task_markdown(task, &counts)),
                OutputFormat::Json => {
                    let mut value = serde_json::to_value(task)?;
                    if let Value::Object(ref mut map) = value {
                        map.insert("subtasks".to_string(), serde_json::to_value(counts)?);
                    }
                    println!("{}", format::to_json(&value)?);
                }
            }
            store.close_details();
        }
        Command::Add {
            title,
            quadrant,
            parent,
        } => {
            let parent_id = parent.map(|p| resolve_id(&store, &p)).transpose()?;
            let (urgent, important) = quadrant.flags();
            let Some(task) = store
                .create_task(&title, urgent, important, parent_id)
                .await?
            else {
                return Err(StoreError::missing_field("title").into());
            };
            match format {
                OutputFormat::Markdown => {
                    println!("Created `{}` {} ({})", task.id, task.title, task.quadrant())
                }
                OutputFormat::Json => println!("{}", format::to_json(&task)?),
            }
        }
        Command::Rename { id, title } => {
            let id = resolve_id(&store, &id)?;
            if !store.rename_task(&id, &title).await? {
                return Err(StoreError::missing_field("title").into());
            }
            eprintln!("Renamed `{}` to {}", id, title.trim());
        }
        Command::Note { id, text } => {
            let id = resolve_id(&store, &id)?;
            store.edit_note(&id, &text).await?;
            if text.trim().is_empty() {
                eprintln!("Cleared note on `{}`", id);
            } else {
                eprintln!("Updated note on `{}`", id);
            }
        }
        Command::Toggle { id } => {
            let id = resolve_id(&store, &id)?;
            let mut events = store.subscribe();
            let completed = store.toggle_completion(&id).await?;
            while let Ok(event) = events.try_recv() {
                if let StoreEvent::Completed { title, .. } = event {
                    eprintln!("Completed: {}", title);
                }
            }
            if !completed {
                eprintln!("Reopened `{}`", id);
            }
        }
        Command::Move { id, quadrant } => {
            let id = resolve_id(&store, &id)?;
            store.move_task(&id, quadrant).await?;
            eprintln!("Moved `{}` to {}", id, quadrant);
        }
        Command::Delete { id } => {
            let id = resolve_id(&store, &id)?;
            let deleted = store.delete_task_cascade(&id).await?;
            match format {
                OutputFormat::Markdown => eprintln!(
                    "Deleted `{}` and {} subtask(s)",
                    id,
                    deleted.len().saturating_sub(1)
                ),
                OutputFormat::Json => println!("{}", format::to_json(&deleted)?),
            }
        }
        Command::Search { query } => {
            let hits = store.search(&query);
            match format {
                OutputFormat::Markdown => print!("{}", format::format_search_markdown(&query, &hits)),
                OutputFormat::Json => println!("{}", format::to_json(&hits)?),
            }
        }
        Command::Stats => {
            let stats = store.stats();
            match format {
                OutputFormat::Markdown => print!("{}", format::format_stats_markdown(&stats)),
                OutputFormat::Json => {
                    let mut value = serde_json::to_value(&stats)?;
                    if let Value::Object(ref mut map) = value {
                        map.insert("completion_rate".to_string(), json!(stats.completion_rate()));
                    }
                    println!("{}", format::to_json(&value)?);
                }
            }
        }
        Command::Export(args) => run_export(store.backend(), args).await?,
        Command::Import(args) => run_import(store.backend(), args).await?,
    }

    Ok(())
}

/// Resolve a full id or a unique id prefix against the loaded forest.
fn resolve_id<B: TaskBackend>(store: &TaskStore<B>, input: &str) -> Result<TaskId> {
    let input = input.trim();
    if input.is_empty() {
        return Err(StoreError::no_selection().into());
    }
    if store.forest().contains(input) {
        return Ok(input.to_string());
    }

    let mut matches = Vec::new();
    store.forest().walk(|task, _| {
        if task.id.starts_with(input) {
            matches.push(task.id.clone());
        }
    });
    match matches.len() {
        0 => Err(StoreError::task_not_found(input).into()),
        1 => Ok(matches.remove(0)),
        n => bail!("'{}' matches {} tasks; give more of the id", input, n),
    }
}

/// Run the export command
async fn run_export<B: TaskBackend>(backend: &B, args: ExportArgs) -> Result<()> {
    let snapshot = export_snapshot(backend).await?;
    let json_output = snapshot.to_json_pretty()?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_output)?;
        eprintln!(
            "Exported {} tasks to {}",
            snapshot.task_count(),
            path.display()
        );
    } else {
        println!("{}", json_output);
    }

    Ok(())
}

/// Run the import command
async fn run_import<B: TaskBackend>(backend: &B, args: ImportArgs) -> Result<()> {
    let snapshot = Snapshot::from_file(&args.file)
        .with_context(|| format!("Failed to read snapshot {}", args.file.display()))?;

    if !snapshot.is_schema_compatible() {
        eprintln!(
            "Warning: Snapshot schema version {} differs from current version {}",
            snapshot.schema_version, CURRENT_SCHEMA_VERSION
        );
    }

    info!(
        mode = args.import_mode(),
        file = %args.file.display(),
        tasks = snapshot.task_count(),
        "importing snapshot"
    );

    if args.dry_run {
        println!(
            "Would import {} tasks ({} top level) exported {} by {}",
            snapshot.task_count(),
            snapshot.tasks.len(),
            snapshot.exported_at,
            snapshot.exported_by
        );
        return Ok(());
    }

    let summary = import_snapshot(backend, &snapshot).await?;
    eprintln!("Imported {} tasks", summary.imported);
    Ok(())
}
