//! Single human-readable status command (§6): backend health, sync state
//! and health-beacon age, and pending-queue depth.

use memento_infrastructure::logging::init_logging;
use memento_infrastructure::sync::SyncStateStore;
use memento_server::context::AppContext;

#[tokio::main]
async fn main() {
    init_logging(true);
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let context = match AppContext::build() {
        Ok(context) => context,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return 1;
        }
    };

    let mut healthy = true;

    match context.vector_store.health_check().await {
        Ok(()) => println!("vector store: ok"),
        Err(e) => {
            println!("vector store: unreachable ({e})");
            healthy = false;
        }
    }

    let queue_size = context.queue.size();
    println!("pending queue: {queue_size} record(s)");

    let sync = &context.config.sync;
    if sync.source_owner.is_empty() || sync.source_repo.is_empty() {
        println!("sync source: not configured");
    } else {
        let source_name = "github";
        println!("sync source: {}-{}", sync.source_owner, sync.source_repo);
        let state_store = SyncStateStore::new(&context.config.queue.state_dir);
        match state_store.load(source_name) {
            Ok(state) => {
                for (kind, entity_state) in &state.entities {
                    let last_synced = entity_state
                        .last_synced
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_owned());
                    println!("  {kind}: last_synced={last_synced} last_count={}", entity_state.last_count);
                }
            }
            Err(e) => println!("  no sync state available yet: {e}"),
        }

        match health_beacon_age(&context, source_name) {
            Some(age) if age > std::time::Duration::from_secs(sync.sync_total_timeout_secs * 2) => {
                println!("  health beacon: stale ({}s old)", age.as_secs());
                healthy = false;
            }
            Some(age) => println!("  health beacon: {}s old", age.as_secs()),
            None => println!("  health beacon: none yet (sync has not run)"),
        }
    }

    if healthy {
        0
    } else {
        1
    }
}

/// Age of the `.state/<source>.health` beacon file, following the same path
/// convention `SyncStateStore` uses internally.
fn health_beacon_age(context: &AppContext, source: &str) -> Option<std::time::Duration> {
    let path = std::path::Path::new(&context.config.queue.state_dir)
        .join(".state")
        .join(format!("{source}.health"));
    let modified = std::fs::metadata(&path).ok()?.modified().ok()?;
    modified.elapsed().ok()
}
