//! Value objects — small, immutable, validated domain types.

mod group_id;
mod ids;

pub use group_id::{GroupId, GROUP_ID_MAX_LEN};
pub use ids::{AgentId, BatchId, MemoryItemId, OperationId, SessionId};
