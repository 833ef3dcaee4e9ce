//! File-backed pending queue and retry worker (§4.7, §9 redesign flag: keep
//! the append-only file design but use a cross-platform file-lock
//! primitive with a timeout).

mod pending_queue;
mod worker;

pub use pending_queue::{PendingQueue, QueuedRecord};
pub use worker::{QueueWorker, WorkerOutcome};
