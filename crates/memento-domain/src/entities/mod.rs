//! Domain entities.

pub mod chunk;
pub mod collection;
pub mod memory_item;
pub mod security;
pub mod sync;

pub use chunk::{Chunk, ContentType};
pub use collection::{Collection, EmbeddingModel, MemoryType};
pub use memory_item::{EmbeddingStatus, FreshnessStatus, MemoryItem, SourceHook};
pub use security::{FindingType, ScanFinding, ScanLayer, ScanOutcome, TrustBand};
pub use sync::{EntityKind, EntityKindState, SourceSyncState, SyncCycleReport, SyncState};
