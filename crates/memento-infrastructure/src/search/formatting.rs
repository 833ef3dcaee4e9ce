//! Context block formatting (§4.2).

use memento_domain::constants::gating::{RELEVANCE_HIGH, RELEVANCE_LOW, RELEVANCE_MEDIUM_LOW};

use super::retrieval::ScoredMemory;

/// Default per-entry content cap (chars), applied after token-budget packing
/// so a single very dense entry cannot dominate the block visually.
const PER_ENTRY_CONTENT_CAP: usize = 1_000;

/// Render gated, packed results into one text block with tiered headers.
/// Returns an empty string when `memories` is empty (§4.2, §8 boundary
/// behaviour: empty project yields empty context).
#[must_use]
pub fn format_context(memories: &[ScoredMemory]) -> String {
    if memories.is_empty() {
        return String::new();
    }

    let (high, rest): (Vec<_>, Vec<_>) = memories.iter().partition(|m| m.score >= RELEVANCE_HIGH);
    let (medium, low): (Vec<_>, Vec<_>) = rest
        .into_iter()
        .partition(|m| m.score >= RELEVANCE_MEDIUM_LOW);
    let low: Vec<_> = low.into_iter().filter(|m| m.score >= RELEVANCE_LOW).collect();

    let mut out = String::new();
    append_section(&mut out, "## High Relevance", &high);
    append_section(&mut out, "## Medium Relevance", &medium);
    append_section(&mut out, "## Low Relevance", &low);
    out.trim_end().to_owned()
}

fn append_section(out: &mut String, header: &str, memories: &[&ScoredMemory]) {
    if memories.is_empty() {
        return;
    }
    out.push_str(header);
    out.push('\n');
    for memory in memories {
        let relevance_pct = (memory.score * 100.0).round() as i32;
        let content = cap_entry_content(&memory.content);
        out.push_str(&format!(
            "- [{}] {relevance_pct}% relevance, via {}: {content}\n",
            memory.collection.as_str(),
            memory.source_hook,
        ));
    }
    out.push('\n');
}

fn cap_entry_content(content: &str) -> String {
    if content.chars().count() <= PER_ENTRY_CONTENT_CAP {
        return content.to_owned();
    }
    let truncated: String = content.chars().take(PER_ENTRY_CONTENT_CAP).collect();
    format!("{truncated} [...]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memento_domain::entities::Collection;

    fn memory(score: f32) -> ScoredMemory {
        ScoredMemory {
            id: "id1".to_owned(),
            collection: Collection::Discussions,
            score,
            content: "some captured memory".to_owned(),
            source_hook: "stop".to_owned(),
            timestamp: Utc::now(),
            source_authority: 0.5,
        }
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn high_relevance_items_get_high_header() {
        let out = format_context(&[memory(0.9)]);
        assert!(out.contains("## High Relevance"));
    }

    #[test]
    fn below_floor_scores_are_excluded_by_caller_not_formatter() {
        // formatting trusts its input is already gated; a score below the
        // low-tier boundary is simply omitted from every section.
        let out = format_context(&[memory(0.1)]);
        assert_eq!(out, "");
    }
}
