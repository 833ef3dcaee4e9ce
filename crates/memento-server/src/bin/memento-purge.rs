//! The purge CLI (§6, §8): delete items older than a duration, optionally
//! scoped to one collection. Two-phase per §8's destructive-operation rule —
//! dry run (count only) unless `--confirm` is passed, and the audit entry is
//! written before any deletion, not after.

use clap::Parser;
use memento_domain::entities::Collection;
use memento_infrastructure::audit::AuditLog;
use memento_infrastructure::logging::init_logging;
use memento_server::context::AppContext;
use serde_json::json;

/// One command per concern, flags not subcommands (§6).
#[derive(Parser, Debug)]
#[command(name = "memento-purge", about = "Delete memory items older than a duration")]
struct Cli {
    /// Age cutoff, e.g. `90d`, `2w`, `6m`, `1y`.
    #[arg(long)]
    duration: String,

    /// Restrict the purge to one collection; all three otherwise.
    #[arg(long)]
    collection: Option<String>,

    /// Actually delete. Without this flag the command only reports a count.
    #[arg(long)]
    confirm: bool,
}

const SCROLL_PAGE_SIZE: usize = 200;

#[tokio::main]
async fn main() {
    init_logging(true);
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    let Some(cutoff) = parse_duration_cutoff(&cli.duration) else {
        eprintln!("invalid --duration: expected `<N>{{d,w,m,y}}`, e.g. `90d`");
        return 1;
    };

    let collections = match resolve_collections(cli.collection.as_deref()) {
        Ok(collections) => collections,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let context = match AppContext::build() {
        Ok(context) => context,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return 1;
        }
    };

    let audit = AuditLog::new(&context.config.queue.state_dir);
    if let Err(e) = audit.record(
        "purge",
        json!({
            "duration": cli.duration,
            "cutoff": cutoff.to_rfc3339(),
            "collection": cli.collection,
            "confirm": cli.confirm,
        }),
    ) {
        eprintln!("failed to write audit log, aborting: {e}");
        return 1;
    }

    let mut total_matched = 0u64;
    let mut total_deleted = 0u64;
    for collection in collections {
        match collect_stale_ids(&context, collection, cutoff).await {
            Ok(ids) => {
                total_matched += ids.len() as u64;
                if cli.confirm && !ids.is_empty() {
                    match context.vector_store.delete(collection.as_str(), &ids).await {
                        Ok(()) => total_deleted += ids.len() as u64,
                        Err(e) => {
                            eprintln!("delete failed for {}: {e}", collection.as_str());
                            return 1;
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("scroll failed for {}: {e}", collection.as_str());
                return 1;
            }
        }
    }

    if cli.confirm {
        println!("purged {total_deleted} item(s) older than {}", cli.duration);
    } else {
        println!(
            "dry run: {total_matched} item(s) older than {} would be deleted (pass --confirm to delete)",
            cli.duration
        );
    }
    0
}

fn resolve_collections(name: Option<&str>) -> Result<Vec<Collection>, String> {
    let Some(name) = name else {
        return Ok(vec![Collection::CodePatterns, Collection::Conventions, Collection::Discussions]);
    };
    match name {
        "code-patterns" => Ok(vec![Collection::CodePatterns]),
        "conventions" => Ok(vec![Collection::Conventions]),
        "discussions" => Ok(vec![Collection::Discussions]),
        other => Err(format!(
            "unknown --collection `{other}`: expected one of code-patterns, conventions, discussions"
        )),
    }
}

/// Scroll an entire collection and keep ids whose `timestamp` payload field
/// is older than `cutoff`. `Filter` only supports equality (§6), so range
/// filtering happens client-side here rather than pushed down to the backend.
async fn collect_stale_ids(
    context: &AppContext,
    collection: Collection,
    cutoff: chrono::DateTime<chrono::Utc>,
) -> memento_domain::error::Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut offset = None;
    loop {
        let page = context
            .vector_store
            .scroll(collection.as_str(), None, SCROLL_PAGE_SIZE, offset)
            .await?;
        for hit in &page.points {
            let Some(timestamp) = hit
                .payload
                .get("timestamp")
                .and_then(serde_json::Value::as_str)
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            else {
                continue;
            };
            if timestamp.with_timezone(&chrono::Utc) < cutoff {
                ids.push(hit.id.clone());
            }
        }
        offset = page.next_offset;
        if offset.is_none() {
            break;
        }
    }
    Ok(ids)
}

/// Parse `<N>{d,w,m,y}` into an absolute UTC cutoff relative to now.
fn parse_duration_cutoff(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = raw.trim();
    let (digits, unit) = raw.split_at(raw.len().checked_sub(1)?);
    let n: i64 = digits.parse().ok()?;
    if n <= 0 {
        return None;
    }
    let days = match unit {
        "d" => n,
        "w" => n * 7,
        "m" => n * 30,
        "y" => n * 365,
        _ => return None,
    };
    Some(chrono::Utc::now() - chrono::Duration::days(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_duration_unit() {
        assert!(parse_duration_cutoff("90d").is_some());
        assert!(parse_duration_cutoff("2w").is_some());
        assert!(parse_duration_cutoff("6m").is_some());
        assert!(parse_duration_cutoff("1y").is_some());
    }

    #[test]
    fn rejects_malformed_duration() {
        assert!(parse_duration_cutoff("90").is_none());
        assert!(parse_duration_cutoff("d90").is_none());
        assert!(parse_duration_cutoff("0d").is_none());
        assert!(parse_duration_cutoff("-5d").is_none());
    }

    #[test]
    fn resolves_known_collection_names() {
        assert_eq!(resolve_collections(Some("code-patterns")).unwrap(), vec![Collection::CodePatterns]);
        assert!(resolve_collections(Some("nope")).is_err());
        assert_eq!(resolve_collections(None).unwrap().len(), 3);
    }
}
