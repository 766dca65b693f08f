use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flowtrace_engine::{
  ChannelNotifier, ExecId, ExecutionEvent, RunId, Snapshot, SourceMessage, TraceConfig,
  TraceEngine, TraceRunner, TraceUpdate, parse_batch, reconcile,
};
use flowtrace_event::EventKind;
use flowtrace_store::{EventStore, SqliteStore};

/// Flowtrace - rebuild workflow run execution trees from event logs
#[derive(Parser)]
#[command(name = "flowtrace")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.flowtrace)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Path to a JSON reconciliation config
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the execution tree of a run in a log file
  Tree {
    /// Event log (JSON array or JSON lines)
    log_file: PathBuf,
    #[arg(long)]
    run: String,
  },

  /// Print the end node of a run in a log file
  End {
    log_file: PathBuf,
    #[arg(long)]
    run: String,
  },

  /// Print the nodes of a run waiting for human confirmation
  Backlog {
    log_file: PathBuf,
    #[arg(long)]
    run: String,
  },

  /// Append the events of a log file to the event store
  Import { log_file: PathBuf },

  /// Rebuild a stored run, optionally resolving human confirmations
  Replay {
    #[arg(long)]
    run: String,

    /// Node execution ids whose confirmation has been handled
    #[arg(long)]
    resolve: Vec<String>,
  },

  /// List runs in the event store
  Runs,

  /// Read events as JSON lines from stdin and print a snapshot after each
  Watch {
    #[arg(long)]
    run: String,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let config = load_config(cli.config.as_deref())?;

  let Some(command) = cli.command else {
    println!("flowtrace - use --help to see available commands");
    return Ok(());
  };

  match command {
    Commands::Tree { log_file, run } => {
      let snapshot = reconcile_file(&log_file, run, &config)?;
      print_json(&snapshot.tree)
    }
    Commands::End { log_file, run } => {
      let snapshot = reconcile_file(&log_file, run, &config)?;
      print_json(&snapshot.end_node)
    }
    Commands::Backlog { log_file, run } => {
      let snapshot = reconcile_file(&log_file, run, &config)?;
      print_json(&snapshot.backlog)
    }
    Commands::Import { log_file } => {
      let data_dir = resolve_data_dir(cli.data_dir)?;
      block_on(import(log_file, data_dir))
    }
    Commands::Replay { run, resolve } => {
      let data_dir = resolve_data_dir(cli.data_dir)?;
      block_on(replay(RunId::from(run), resolve, data_dir, config))
    }
    Commands::Runs => {
      let data_dir = resolve_data_dir(cli.data_dir)?;
      block_on(list_runs(data_dir))
    }
    Commands::Watch { run } => block_on(watch(RunId::from(run), config)),
  }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(future)
}

fn load_config(path: Option<&Path>) -> Result<TraceConfig> {
  let Some(path) = path else {
    return Ok(TraceConfig::default());
  };

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read config file: {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
  match data_dir {
    Some(dir) => Ok(dir),
    None => Ok(
      dirs::home_dir()
        .context("could not determine home directory")?
        .join(".flowtrace"),
    ),
  }
}

async fn open_store(data_dir: &Path) -> Result<SqliteStore> {
  tokio::fs::create_dir_all(data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

  SqliteStore::open(data_dir.join("events.db"))
    .await
    .context("failed to open event store")
}

/// Read a log file holding either a JSON array of events or one event per line.
fn read_log(path: &Path) -> Result<Vec<ExecutionEvent>> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read log file: {}", path.display()))?;

  if content.trim_start().starts_with('[') {
    let raw: Vec<Value> = serde_json::from_str(&content)
      .with_context(|| format!("failed to parse log file: {}", path.display()))?;
    return Ok(parse_batch(raw));
  }

  let raw = content
    .lines()
    .enumerate()
    .filter(|(_, line)| !line.trim().is_empty())
    .filter_map(|(idx, line)| match serde_json::from_str::<Value>(line) {
      Ok(value) => Some(value),
      Err(e) => {
        warn!(line = idx + 1, error = %e, "skipping unparseable line");
        None
      }
    });
  Ok(parse_batch(raw))
}

fn reconcile_file(path: &Path, run: String, config: &TraceConfig) -> Result<Snapshot> {
  let log = read_log(path)?;
  let run_id = RunId::from(run);
  let snapshot = reconcile(&log, &run_id, config);

  info!(
    run_id = %run_id,
    events = log.len(),
    top_level = snapshot.tree.len(),
    backlog = snapshot.backlog.len(),
    "reconciled log file"
  );
  Ok(snapshot)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

async fn import(log_file: PathBuf, data_dir: PathBuf) -> Result<()> {
  let events = read_log(&log_file)?;
  let store = open_store(&data_dir).await?;

  let stored = store
    .append_events(&events)
    .await
    .context("failed to store events")?;

  eprintln!("Imported {} events from {}", stored, log_file.display());
  Ok(())
}

async fn replay(
  run_id: RunId,
  resolve: Vec<String>,
  data_dir: PathBuf,
  config: TraceConfig,
) -> Result<()> {
  let store = open_store(&data_dir).await?;
  let events = store
    .list_events(&run_id)
    .await
    .with_context(|| format!("failed to load events for run {run_id}"))?;

  if events.is_empty() {
    bail!("no stored events for run {run_id}");
  }

  let mut engine = TraceEngine::for_run(config, run_id.clone());
  engine.ingest_events(events.into_iter().map(|stored| stored.into_event()));

  if !resolve.is_empty() {
    let before = pending_confirmations(engine.events());
    for id in &resolve {
      let removed = engine.resolve(&ExecId::from(id.as_str()));
      if removed == 0 {
        warn!(node_exec_id = %id, "no pending confirmation");
      }
    }
    let after = pending_confirmations(engine.events());

    let resolved: Vec<ExecId> = before.difference(&after).cloned().collect();
    store
      .delete_confirmations(&run_id, &resolved)
      .await
      .context("failed to remove resolved confirmations")?;
  }

  print_json(engine.snapshot())
}

fn pending_confirmations(log: &[ExecutionEvent]) -> HashSet<ExecId> {
  log
    .iter()
    .filter(|event| event.kind == EventKind::NeedHumanConfirm)
    .map(|event| event.exec_id().clone())
    .collect()
}

async fn list_runs(data_dir: PathBuf) -> Result<()> {
  let store = open_store(&data_dir).await?;
  let runs = store.list_runs().await.context("failed to list runs")?;
  print_json(&runs)
}

async fn watch(run_id: RunId, config: TraceConfig) -> Result<()> {
  let (tx, mut updates) = mpsc::unbounded_channel();
  let runner = TraceRunner::new(config, Arc::new(ChannelNotifier::new(tx)));
  let sender = runner.sender();

  let cancel = CancellationToken::new();
  let runner_handle = tokio::spawn(runner.start(cancel.clone()));

  // Ends once the runner drops its notifier.
  let printer = tokio::spawn(async move {
    while let Some(update) = updates.recv().await {
      if let TraceUpdate::Reconciled { snapshot } = update {
        match serde_json::to_string(&snapshot) {
          Ok(line) => println!("{line}"),
          Err(e) => warn!(error = %e, "failed to encode snapshot"),
        }
      }
    }
  });

  sender
    .send(SourceMessage::Observe(run_id))
    .await
    .context("trace runner stopped")?;

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  loop {
    tokio::select! {
      _ = tokio::signal::ctrl_c() => {
        cancel.cancel();
        break;
      }
      line = lines.next_line() => {
        let Some(line) = line.context("failed to read stdin")? else {
          break;
        };
        if line.trim().is_empty() {
          continue;
        }
        match serde_json::from_str::<Value>(&line) {
          Ok(value) => sender
            .send(SourceMessage::Batch(vec![value]))
            .await
            .context("trace runner stopped")?,
          Err(e) => warn!(error = %e, "skipping unparseable line"),
        }
      }
    }
  }

  drop(sender);
  let engine = runner_handle.await.context("trace runner panicked")?;
  printer.await.context("snapshot printer panicked")?;

  eprintln!(
    "Watched {} events, {} top-level nodes, {} awaiting confirmation",
    engine.events().len(),
    engine.tree().len(),
    engine.backlog_count()
  );
  Ok(())
}
