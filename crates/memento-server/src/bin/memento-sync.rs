//! The sync runner CLI (§6 CLI surface, §4.4): pulls one cycle from the
//! configured GitHub-shaped upstream, or reports the current sync state
//! with `--status`.

use clap::Parser;
use memento_infrastructure::logging::init_logging;
use memento_infrastructure::sync::{SyncMode, SyncStateStore};
use memento_server::context::AppContext;
use memento_domain::value_objects::GroupId;

/// One command per concern, flags not subcommands (§6).
#[derive(Parser, Debug)]
#[command(name = "memento-sync", about = "Run or inspect the external-source sync engine")]
struct Cli {
    /// Ignore incremental state and re-pull everything this cycle.
    #[arg(long, conflicts_with = "incremental")]
    full: bool,

    /// Only pull items changed since the last cycle (default).
    #[arg(long)]
    incremental: bool,

    /// Restrict this cycle to code-blob sync only.
    #[arg(long, conflicts_with = "no_code_blobs")]
    code_only: bool,

    /// Skip code-blob sync this cycle even if it is enabled in config.
    #[arg(long)]
    no_code_blobs: bool,

    /// Print the current sync state and health beacon age instead of running a cycle.
    #[arg(long)]
    status: bool,
}

#[tokio::main]
async fn main() {
    init_logging(true);
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    let mut config = match memento_infrastructure::config::ConfigLoader::new().load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return 1;
        }
    };

    if cli.no_code_blobs {
        config.sync.code_blob_enabled = false;
    }

    let context = match AppContext::from_config(config) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return 1;
        }
    };

    if cli.status {
        return print_status(&context);
    }

    let Some(owner_repo) = source_identity(&context) else {
        eprintln!("sync source not configured: set sync.source_owner and sync.source_repo");
        return 1;
    };
    let Some(group_id) = GroupId::from_raw(&owner_repo) else {
        eprintln!("could not derive a group_id from the configured sync source");
        return 1;
    };

    let engine = match context.build_github_sync_engine_scoped(cli.code_only) {
        Ok(Some(engine)) => engine,
        Ok(None) => {
            eprintln!("sync source not configured: set sync.source_owner and sync.source_repo");
            return 1;
        }
        Err(e) => {
            eprintln!("failed to build sync engine: {e}");
            return 1;
        }
    };

    let mode = if cli.full { SyncMode::Full } else { SyncMode::Incremental };
    let report = engine.run_cycle(&group_id, mode).await;

    println!(
        "sync cycle for {owner_repo}: scanned={} processed={} errors={} duplicates={} breaker_open={}",
        report.scanned, report.processed, report.errors, report.duplicates, report.breaker_open
    );

    if report.breaker_open || !report.accounting_holds() {
        return 1;
    }
    0
}

fn source_identity(context: &AppContext) -> Option<String> {
    let sync = &context.config.sync;
    if sync.source_owner.is_empty() || sync.source_repo.is_empty() {
        None
    } else {
        Some(format!("{}-{}", sync.source_owner, sync.source_repo))
    }
}

fn print_status(context: &AppContext) -> i32 {
    let Some(owner_repo) = source_identity(context) else {
        println!("sync source not configured");
        return 0;
    };
    let source_name = "github";
    let state_store = SyncStateStore::new(&context.config.queue.state_dir);
    match state_store.load(source_name) {
        Ok(state) => {
            println!("sync source: {owner_repo}");
            for (kind, entity_state) in &state.entities {
                let last_synced = entity_state
                    .last_synced
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_owned());
                println!("  {kind}: last_synced={last_synced} last_count={}", entity_state.last_count);
            }
            0
        }
        Err(e) => {
            println!("no sync state available yet: {e}");
            0
        }
    }
}
