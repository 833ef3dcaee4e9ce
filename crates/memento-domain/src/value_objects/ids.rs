//! Strong-typed identifiers for domain entities.
//!
//! A thin macro mirrors the newtype-over-Uuid pattern used throughout this
//! codebase: every identifier gets `Display`, `FromStr`, and serde support
//! without hand-writing the boilerplate per type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(MemoryItemId, "Opaque 128-bit identifier for a memory item");
define_id!(SessionId, "Opaque host-session identifier");
define_id!(AgentId, "Identifier for an agent-authored item's originating agent");
define_id!(BatchId, "Shared identifier for chunks produced from the same source");
define_id!(OperationId, "Identifier for a single sync-cycle or capture operation, for log correlation");
