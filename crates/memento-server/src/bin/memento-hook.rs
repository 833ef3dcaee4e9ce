//! The single hook entry point every host-integration event is piped
//! through (§4.1, §9 redesign flag: one binary, closed-enum dispatch,
//! rather than one binary per event kind).
//!
//! Reads one JSON object from stdin, validates it, and either runs
//! retrieval synchronously (session-start / pre-compact) or hands capture
//! off to a detached [`memento-capture-worker`] process so this process can
//! return within its budget regardless of how long embedding/storage take.

use std::io::Read;
use std::process::Stdio;

use memento_domain::value_objects::GroupId;
use memento_infrastructure::logging::{init_logging, log_event};
use memento_infrastructure::search::{format_context, RetrievalTier};
use memento_server::context::AppContext;
use memento_server::hook::{build_capture_tasks, HookEventKind, RawHookEvent};

const TARGET: &str = "hook";

#[tokio::main]
async fn main() {
    init_logging(false);
    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    let mut raw_stdin = String::new();
    if std::io::stdin().read_to_string(&mut raw_stdin).is_err() {
        log_event(TARGET, "stdin_read_failed", &[]);
        return 0;
    }

    // Gate 1: JSON parse.
    let event: RawHookEvent = match serde_json::from_str(&raw_stdin) {
        Ok(event) => event,
        Err(e) => {
            log_event(TARGET, "malformed_hook_input", &[("error", &e.to_string())]);
            return 0;
        }
    };

    // Gate 2: event kind must be one of the fixed set.
    let Some(kind) = HookEventKind::parse(&event.hook_event_name) else {
        log_event(TARGET, "unknown_hook_event", &[("hook_event_name", &event.hook_event_name)]);
        return 0;
    };

    let budget = kind.budget();
    let outcome = tokio::time::timeout(budget, dispatch(kind, &event)).await;
    if outcome.is_err() {
        log_event(TARGET, "hook_budget_exceeded", &[("hook_event_name", &event.hook_event_name)]);
    }
    0
}

async fn dispatch(kind: HookEventKind, event: &RawHookEvent) {
    if kind.is_retrieval() {
        run_retrieval(kind, event).await;
        return;
    }

    if kind == HookEventKind::PostToolUse {
        run_tier3_retrieval(event).await;
    }

    let tasks = build_capture_tasks(kind, event);
    for task in tasks {
        spawn_capture_worker(&task).await;
    }
}

/// Tool-triggered Tier 3 lookup (§4.2.1): a successful `PostToolUse` event
/// that names a file is cheap enough to also run a code-patterns-only
/// retrieval against, independent of whatever the capture path does with
/// the same event — this is the file-open trigger the tier exists for.
async fn run_tier3_retrieval(event: &RawHookEvent) {
    if event.tool_status.as_deref() != Some("success") {
        return;
    }
    let Some(file_path) = event
        .tool_input
        .as_ref()
        .and_then(|v| v.get("file_path"))
        .and_then(serde_json::Value::as_str)
    else {
        return;
    };

    let Some(group_id) = event.cwd.as_deref().and_then(GroupId::from_project_path) else {
        return;
    };

    let context = match AppContext::build() {
        Ok(context) => context,
        Err(e) => {
            log_event(TARGET, "tier3_context_build_failed", &[("error", &e.to_string())]);
            return;
        }
    };

    let memories = context
        .retrieval
        .retrieve(RetrievalTier::Tier3, file_path, &group_id, context.config.capture.max_retrievals)
        .await;

    let rendered = format_context(&memories);
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    log_event(
        TARGET,
        "tier3_retrieval_completed",
        &[("results_count", &memories.len().to_string())],
    );
}

/// Session-start and pre-compact run retrieval in-process and print the
/// formatted context block to stdout; everything else is silent (§4.1).
async fn run_retrieval(kind: HookEventKind, event: &RawHookEvent) {
    let tier = match kind {
        HookEventKind::SessionStart => RetrievalTier::Tier1,
        HookEventKind::PreCompact => RetrievalTier::Tier2,
        _ => unreachable!("dispatch only calls run_retrieval for retrieval kinds"),
    };

    let Some(group_id) = event.cwd.as_deref().and_then(GroupId::from_project_path) else {
        log_event(TARGET, "retrieval_missing_cwd", &[]);
        return;
    };

    let context = match AppContext::build() {
        Ok(context) => context,
        Err(e) => {
            log_event(TARGET, "retrieval_context_build_failed", &[("error", &e.to_string())]);
            return;
        }
    };

    let query = compose_query(event);
    let memories = context
        .retrieval
        .retrieve(tier, &query, &group_id, context.config.capture.max_retrievals)
        .await;

    let rendered = format_context(&memories);
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    log_event(
        TARGET,
        "session_retrieval_completed",
        &[("results_count", &memories.len().to_string())],
    );
}

/// Combine project/cwd/recent-activity/prompt signal into one query string
/// (§4.2: "Build one query string per trigger combining project name,
/// working directory, detected language/framework markers, recent tool
/// activity, and user prompt text").
fn compose_query(event: &RawHookEvent) -> String {
    let mut parts = Vec::new();
    if let Some(cwd) = &event.cwd {
        parts.push(cwd.clone());
    }
    if let Some(tool_name) = &event.tool_name {
        parts.push(format!("recent tool: {tool_name}"));
    }
    if let Some(prompt) = event.user_message.as_deref().or(event.prompt.as_deref()) {
        parts.push(prompt.to_owned());
    }
    if parts.is_empty() {
        "project context".to_owned()
    } else {
        parts.join(" ")
    }
}

/// Spawn the background capture worker as a detached child process (§4.1,
/// §9 redesign flag: the runtime's native detached-task primitive stands in
/// for an ad-hoc subprocess fork). The child is neither awaited nor killed
/// on drop, so it keeps running after this process exits; it owns its own
/// timeouts end to end.
async fn spawn_capture_worker(task: &memento_server::hook::CaptureTask) {
    let payload = match serde_json::to_vec(task) {
        Ok(bytes) => bytes,
        Err(e) => {
            log_event(TARGET, "capture_task_serialize_failed", &[("error", &e.to_string())]);
            return;
        }
    };

    let binary = capture_worker_path();
    let mut command = tokio::process::Command::new(binary);
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            log_event(TARGET, "capture_worker_spawn_failed", &[("error", &e.to_string())]);
            return;
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        use tokio::io::AsyncWriteExt;
        if let Err(e) = stdin.write_all(&payload).await {
            log_event(TARGET, "capture_worker_stdin_write_failed", &[("error", &e.to_string())]);
        }
    }
    // Deliberately not awaited: the worker inherits its own budget and this
    // process must return immediately regardless of how long it takes.
    std::mem::drop(child);
}

/// Resolve the capture worker binary next to this one, falling back to
/// letting `PATH` resolve it (installed deployments put both on `PATH`).
fn capture_worker_path() -> std::path::PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("memento-capture-worker")))
        .filter(|p| p.exists())
        .unwrap_or_else(|| std::path::PathBuf::from("memento-capture-worker"))
}
