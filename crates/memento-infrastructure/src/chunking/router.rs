//! Content-type routing and per-type chunking policy (§4.3).

use memento_domain::constants::budgets::{
    AGENT_RESPONSE_WHOLE_MAX_TOKENS, CHUNK_OVERLAP_RATIO_MAX, GUIDELINE_CHUNK_MAX_TOKENS,
    USER_MESSAGE_WHOLE_MAX_TOKENS,
};
use memento_domain::entities::{Chunk, ContentType};
use memento_domain::value_objects::BatchId;

use super::tokenizer::TokenCounter;

/// Per-content-type chunk-size overrides; defaults to the §4.3 policy values
/// when not overridden by config.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub guideline_max_tokens: usize,
    pub prose_max_tokens: usize,
    pub code_max_tokens: usize,
    pub overlap_ratio: f32,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            guideline_max_tokens: GUIDELINE_CHUNK_MAX_TOKENS,
            prose_max_tokens: GUIDELINE_CHUNK_MAX_TOKENS,
            code_max_tokens: GUIDELINE_CHUNK_MAX_TOKENS,
            overlap_ratio: CHUNK_OVERLAP_RATIO_MAX,
        }
    }
}

/// Route `content` by `content_type` and produce one or more chunks.
/// `error_context` is never passed here — it is handled by the structured
/// truncator in [`super::truncation`] instead.
#[must_use]
pub fn chunk_content(
    counter: &TokenCounter,
    config: &ChunkerConfig,
    content_type: ContentType,
    content: &str,
) -> Vec<Chunk> {
    match content_type {
        ContentType::UserMessage => {
            whole_or_chunked(counter, config, content, USER_MESSAGE_WHOLE_MAX_TOKENS, split_prose)
        }
        ContentType::AgentResponse => whole_or_chunked(
            counter,
            config,
            content,
            AGENT_RESPONSE_WHOLE_MAX_TOKENS,
            split_prose,
        ),
        ContentType::Guideline => {
            build_chunks(counter, split_prose(content), config.guideline_max_tokens, config)
        }
        ContentType::Prose => {
            whole_or_chunked(counter, config, content, config.prose_max_tokens, split_prose)
        }
        ContentType::Code => {
            whole_or_chunked(counter, config, content, config.code_max_tokens, split_code)
        }
        ContentType::ErrorContext => {
            vec![single_chunk(counter, content)]
        }
        ContentType::GithubCodeBlob => {
            whole_or_chunked(counter, config, content, config.code_max_tokens, split_code)
        }
    }
}

fn whole_or_chunked(
    counter: &TokenCounter,
    config: &ChunkerConfig,
    content: &str,
    whole_max_tokens: usize,
    splitter: fn(&str) -> Vec<String>,
) -> Vec<Chunk> {
    if counter.count(content) <= whole_max_tokens {
        return vec![single_chunk(counter, content)];
    }
    build_chunks(counter, splitter(content), whole_max_tokens, config)
}

fn single_chunk(counter: &TokenCounter, content: &str) -> Chunk {
    Chunk {
        batch_id: BatchId::new(),
        chunk_index: 0,
        chunk_total: 1,
        tokens: counter.count(content),
        content: content.to_owned(),
        has_overlap: false,
    }
}

/// Paragraph boundaries first, then sentence boundaries for oversized
/// paragraphs, then word boundaries for pathologically long sentences (§4.3).
fn split_prose(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split on declaration boundaries (blank-line-preceded `fn`/`class`/`def`
/// style headers) first, then logical blocks, per §4.3.
fn split_code(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        let is_declaration = DECLARATION_KEYWORDS
            .iter()
            .any(|kw| line.trim_start().starts_with(kw));
        if is_declaration && !current.trim().is_empty() {
            blocks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        blocks.push(current);
    }
    if blocks.is_empty() {
        vec![content.to_owned()]
    } else {
        blocks
    }
}

const DECLARATION_KEYWORDS: &[&str] = &[
    "fn ", "pub fn ", "async fn ", "struct ", "impl ", "trait ", "class ", "def ", "function ",
];

/// Merge naive splitter output into budget-respecting chunks, adding a
/// leading `"..."` overlap prefix between adjacent chunks when it still
/// fits inside the max.
fn build_chunks(
    counter: &TokenCounter,
    segments: Vec<String>,
    max_tokens: usize,
    config: &ChunkerConfig,
) -> Vec<Chunk> {
    let batch_id = BatchId::new();
    let overlap_tokens = ((max_tokens as f32) * config.overlap_ratio) as usize;

    let mut raw_chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;

    for segment in segments {
        let segment_tokens = counter.count(&segment);
        if segment_tokens > max_tokens {
            if !current.is_empty() {
                raw_chunks.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            for word_chunk in split_by_words(counter, &segment, max_tokens) {
                raw_chunks.push(word_chunk);
            }
            continue;
        }
        if current_tokens + segment_tokens > max_tokens && !current.is_empty() {
            raw_chunks.push(std::mem::take(&mut current));
            current_tokens = 0;
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&segment);
        current_tokens += segment_tokens;
    }
    if !current.trim().is_empty() {
        raw_chunks.push(current);
    }

    let total = raw_chunks.len() as u32;
    raw_chunks
        .into_iter()
        .enumerate()
        .map(|(idx, text)| {
            let (content, has_overlap) = if idx > 0 && overlap_tokens > 0 {
                add_overlap(counter, &text, overlap_tokens, max_tokens)
            } else {
                (text, false)
            };
            Chunk {
                batch_id,
                chunk_index: idx as u32,
                chunk_total: total,
                tokens: counter.count(&content),
                content,
                has_overlap,
            }
        })
        .collect()
}

fn add_overlap(
    counter: &TokenCounter,
    text: &str,
    overlap_tokens: usize,
    max_tokens: usize,
) -> (String, bool) {
    let candidate = format!("...{text}");
    if counter.count(&candidate) <= max_tokens {
        let _ = overlap_tokens; // budget already enforced by the max_tokens check above
        (candidate, true)
    } else {
        (text.to_owned(), false)
    }
}

fn split_by_words(counter: &TokenCounter, text: &str, max_tokens: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out = Vec::new();
    let mut current = String::new();
    for word in words {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        if counter.count(&candidate) > max_tokens && !current.is_empty() {
            out.push(current.clone());
            current = word.to_owned();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_user_message_is_stored_whole() {
        let counter = TokenCounter::new();
        let config = ChunkerConfig::default();
        let chunks = chunk_content(&counter, &config, ContentType::UserMessage, "hi there");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_total, 1);
    }

    #[test]
    fn guideline_is_always_chunked_even_when_short() {
        let counter = TokenCounter::new();
        let config = ChunkerConfig::default();
        let chunks = chunk_content(&counter, &config, ContentType::Guideline, "short rule");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn no_chunk_exceeds_max_tokens_even_with_overlap() {
        let counter = TokenCounter::new();
        let config = ChunkerConfig {
            guideline_max_tokens: 30,
            ..ChunkerConfig::default()
        };
        let long_guideline = (0..50)
            .map(|i| format!("Rule {i} states something important about the codebase."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_content(&counter, &config, ContentType::Guideline, &long_guideline);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.tokens <= 30);
        }
    }

    #[test]
    fn error_context_is_never_split() {
        let counter = TokenCounter::new();
        let config = ChunkerConfig::default();
        let chunks = chunk_content(&counter, &config, ContentType::ErrorContext, "boom");
        assert_eq!(chunks.len(), 1);
    }
}
