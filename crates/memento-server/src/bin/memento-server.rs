//! The long-running daemon (§2, §5): `/health` and `/metrics` over HTTP,
//! with the pending-queue retry worker and the external sync engine running
//! as cooperative background tasks in the same process rather than as
//! separate subprocesses (§5: "Long-running subsystems... are cooperative
//! tasks inside a single process").

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use memento_domain::value_objects::GroupId;
use memento_infrastructure::logging::{init_logging, log_event};
use memento_infrastructure::queue::QueueWorker;
use memento_infrastructure::sync::SyncMode;
use memento_server::context::AppContext;
use memento_server::metrics::PrometheusMetrics;

const TARGET: &str = "server";
/// Poll cadence for the pending-queue retry worker (§4.7 doesn't name one
/// explicitly; short enough that queued items drain promptly without busy-looping).
const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(30);

struct AppState {
    context: AppContext,
    metrics: PrometheusMetrics,
}

#[tokio::main]
async fn main() {
    init_logging(true);

    let context = match AppContext::build() {
        Ok(context) => context,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    let metrics = match PrometheusMetrics::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("failed to initialize metrics registry: {e}");
            std::process::exit(1);
        }
    };

    let host = context.config.server.metrics_host.clone();
    let port = context.config.server.metrics_port;
    let sync_interval = Duration::from_secs(context.config.sync.sync_interval_seconds);

    let state = Arc::new(AppState { context, metrics });

    tokio::spawn(run_queue_worker(state.clone()));
    tokio::spawn(run_sync_loop(state.clone(), sync_interval));

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state);

    let addr = format!("{host}:{port}");
    log_event(TARGET, "server_starting", &[("addr", &addr)]);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.context.vector_store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "vector store unreachable"),
    }
}

async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Drain the pending queue on a fixed interval for as long as the process runs.
async fn run_queue_worker(state: Arc<AppState>) {
    let worker = QueueWorker::new(
        state.context.queue.clone(),
        state.context.storage.clone(),
        state.context.config.queue.batch_size,
        state.context.config.queue.max_retries,
    );
    loop {
        let outcomes = worker.run_once().await;
        if !outcomes.is_empty() {
            state.metrics.incr_counter("queue_worker_batches_total", &[]);
            log_event(TARGET, "queue_batch_drained", &[("count", &outcomes.len().to_string())]);
        }
        tokio::time::sleep(QUEUE_POLL_INTERVAL).await;
    }
}

/// Run one sync cycle per `sync_interval`, for as long as the process runs.
/// A no-op loop (just sleeps) when no sync source is configured.
async fn run_sync_loop(state: Arc<AppState>, interval: Duration) {
    let sync = &state.context.config.sync;
    if sync.source_owner.is_empty() || sync.source_repo.is_empty() {
        log_event(TARGET, "sync_loop_disabled", &[]);
        return;
    }
    let Some(group_id) = GroupId::from_raw(&format!("{}-{}", sync.source_owner, sync.source_repo)) else {
        log_event(TARGET, "sync_loop_invalid_group_id", &[]);
        return;
    };

    loop {
        match state.context.build_github_sync_engine() {
            Ok(Some(engine)) => {
                let report = engine.run_cycle(&group_id, SyncMode::Incremental).await;
                state.metrics.set_gauge("sync_last_cycle_errors", report.errors as f64, &[]);
                state.metrics.incr_counter(
                    "sync_cycles_total",
                    &[("breaker_open", if report.breaker_open { "true" } else { "false" })],
                );
                log_event(
                    TARGET,
                    "sync_cycle_completed",
                    &[
                        ("scanned", &report.scanned.to_string()),
                        ("processed", &report.processed.to_string()),
                        ("errors", &report.errors.to_string()),
                    ],
                );
            }
            Ok(None) => log_event(TARGET, "sync_loop_disabled", &[]),
            Err(e) => log_event(TARGET, "sync_cycle_build_failed", &[("error", &e.to_string())]),
        }
        tokio::time::sleep(interval).await;
    }
}
