//! Content-type routing and chunk shape (§4.3).

use serde::{Deserialize, Serialize};

use crate::value_objects::BatchId;

/// The closed set of content types the chunker routes on (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Free-form natural-language prose.
    Prose,
    /// Source code.
    Code,
    /// A captured user turn.
    UserMessage,
    /// A captured assistant turn.
    AgentResponse,
    /// A (command, error, output) triple — never chunked, only truncated.
    ErrorContext,
    /// A convention/rule document — always semantically chunked.
    Guideline,
    /// A full-file blob pulled from a code host.
    GithubCodeBlob,
}

impl ContentType {
    /// Detect a content type from a file extension, for explicit-type-absent routing.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "rs" | "py" | "js" | "jsx" | "ts" | "tsx" | "go" | "java" | "c" | "cpp" | "h"
            | "hpp" | "rb" | "php" | "cs" | "kt" | "swift" => Some(Self::Code),
            "md" | "mdx" | "txt" | "rst" => Some(Self::Prose),
            _ => None,
        }
    }
}

/// One chunk produced by the chunker, carrying its position within a shared batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Shared identifier for every chunk produced from the same source document.
    pub batch_id: BatchId,
    /// Zero-based position of this chunk within the batch.
    pub chunk_index: u32,
    /// Total number of chunks in the batch.
    pub chunk_total: u32,
    /// The chunk's text content, including any overlap prefix.
    pub content: String,
    /// Token count of `content`, as measured by the shared `TokenCounter`.
    pub tokens: usize,
    /// Whether this chunk carries a leading overlap prefix ("...") from the previous chunk.
    pub has_overlap: bool,
}
