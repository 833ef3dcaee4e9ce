//! Collections and the closed type enum partitioned across them (§3).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One of the three fixed vector-store collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    /// HOW code is written — embedded with the code model.
    CodePatterns,
    /// WHAT rules to follow — embedded with the prose model, shared across tenants.
    Conventions,
    /// WHY things were decided — embedded with the prose model.
    Discussions,
}

impl Collection {
    /// Stable collection name as stored in the vector DB.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CodePatterns => "code-patterns",
            Self::Conventions => "conventions",
            Self::Discussions => "discussions",
        }
    }

    /// Whether queries against this collection may omit `group_id` (§3).
    #[must_use]
    pub fn is_tenant_shared(&self) -> bool {
        matches!(self, Self::Conventions)
    }

    /// The embedding model identity this collection is embedded with (§6).
    #[must_use]
    pub fn embedding_model(&self) -> EmbeddingModel {
        match self {
            Self::CodePatterns => EmbeddingModel::Code,
            Self::Conventions | Self::Discussions => EmbeddingModel::Prose,
        }
    }
}

/// The two embedding model identities the embedding server exposes (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingModel {
    /// Prose/natural-language model, identifier `"en"` on the wire.
    Prose,
    /// Code-aware model, identifier `"code"` on the wire.
    Code,
}

impl EmbeddingModel {
    /// Wire identifier sent to the embedding server's `/embed` endpoint.
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Prose => "en",
            Self::Code => "code",
        }
    }
}

/// The closed enum of memory types, partitioned one-to-one onto collections (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    // code-patterns
    /// A captured implementation pattern
    Implementation,
    /// A captured fix for a prior error
    ErrorFix,
    /// A captured refactor
    Refactor,
    /// A recurring file-level pattern
    FilePattern,

    // conventions
    /// A project rule
    Rule,
    /// A guideline document (always semantically chunked, §4.3)
    Guideline,
    /// A documented port/interface convention
    Port,
    /// A naming convention
    Naming,
    /// A structural convention
    Structure,

    // discussions
    /// A recorded decision
    Decision,
    /// A session handoff summary
    Session,
    /// A recorded blocker
    Blocker,
    /// A recorded preference
    Preference,
    /// A captured user turn
    UserMessage,
    /// A captured assistant turn
    AgentResponse,
    /// Agent-memory subtype: a free-form agent memory (see Open Questions, §9)
    AgentMemory,
    /// Agent-memory subtype: an agent-authored insight
    AgentInsight,
    /// Agent-memory subtype: an agent session handoff
    AgentHandoff,
}

impl MemoryType {
    /// The single collection this type belongs to (§3 invariant).
    #[must_use]
    pub fn collection(&self) -> Collection {
        match self {
            Self::Implementation | Self::ErrorFix | Self::Refactor | Self::FilePattern => {
                Collection::CodePatterns
            }
            Self::Rule | Self::Guideline | Self::Port | Self::Naming | Self::Structure => {
                Collection::Conventions
            }
            Self::Decision
            | Self::Session
            | Self::Blocker
            | Self::Preference
            | Self::UserMessage
            | Self::AgentResponse
            | Self::AgentMemory
            | Self::AgentInsight
            | Self::AgentHandoff => Collection::Discussions,
        }
    }

    /// Validate that this type is allowed in `collection`, per the storage-layer
    /// refusal rule in §3.
    pub fn require_collection(&self, collection: Collection) -> Result<()> {
        let owner = self.collection();
        if owner != collection {
            return Err(Error::TypeCollectionMismatch {
                item_type: format!("{self:?}"),
                collection: collection.as_str().to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_maps_to_exactly_one_collection() {
        let types = [
            MemoryType::Implementation,
            MemoryType::ErrorFix,
            MemoryType::Refactor,
            MemoryType::FilePattern,
            MemoryType::Rule,
            MemoryType::Guideline,
            MemoryType::Port,
            MemoryType::Naming,
            MemoryType::Structure,
            MemoryType::Decision,
            MemoryType::Session,
            MemoryType::Blocker,
            MemoryType::Preference,
            MemoryType::UserMessage,
            MemoryType::AgentResponse,
            MemoryType::AgentMemory,
            MemoryType::AgentInsight,
            MemoryType::AgentHandoff,
        ];
        for t in types {
            t.require_collection(t.collection()).unwrap();
        }
    }

    #[test]
    fn mismatch_is_rejected() {
        assert!(MemoryType::Rule
            .require_collection(Collection::CodePatterns)
            .is_err());
    }

    #[test]
    fn agent_memory_subtypes_land_in_discussions() {
        // Open Question (§9): agent-memory subtypes are placed in `discussions`.
        assert_eq!(MemoryType::AgentMemory.collection(), Collection::Discussions);
        assert_eq!(MemoryType::AgentInsight.collection(), Collection::Discussions);
        assert_eq!(MemoryType::AgentHandoff.collection(), Collection::Discussions);
    }
}
