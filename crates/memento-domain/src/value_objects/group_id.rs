//! `group_id` — the per-project tenant isolation key.
//!
//! Derived deterministically from the host's working directory: lowercased,
//! non-alphanumeric runs collapsed to a single hyphen, trimmed to 50 chars.
//! Every stored item carries one (§3 invariants); `conventions` queries may
//! omit it since that collection is shared across tenants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of a normalized `group_id`.
pub const GROUP_ID_MAX_LEN: usize = 50;

/// A normalized, non-empty tenant key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Normalize a raw working-directory path (or project name) into a
    /// `group_id`.
    ///
    /// The final path component is used as the project name; the whole
    /// thing is lowercased, runs of characters that are not ASCII
    /// alphanumeric are collapsed into a single `-`, and leading/trailing
    /// hyphens are trimmed before truncating to [`GROUP_ID_MAX_LEN`].
    #[must_use]
    pub fn from_project_path(path: &str) -> Option<Self> {
        let name = path
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path);
        Self::from_raw(name)
    }

    /// Normalize an already-extracted project name directly.
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        let mut out = String::with_capacity(raw.len());
        let mut last_was_sep = true; // suppress a leading hyphen
        for ch in raw.chars() {
            if ch.is_ascii_alphanumeric() {
                out.push(ch.to_ascii_lowercase());
                last_was_sep = false;
            } else if !last_was_sep {
                out.push('-');
                last_was_sep = true;
            }
        }
        while out.ends_with('-') {
            out.pop();
        }
        out.truncate(GROUP_ID_MAX_LEN);
        while out.ends_with('-') {
            out.pop();
        }
        if out.is_empty() {
            None
        } else {
            Some(Self(out))
        }
    }

    /// Borrow the normalized string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for GroupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mixed_case_and_punctuation() {
        let id = GroupId::from_project_path("/home/dev/My Cool_Project!!").unwrap();
        assert_eq!(id.as_str(), "my-cool-project");
    }

    #[test]
    fn truncates_to_max_len() {
        let long = "a".repeat(200);
        let id = GroupId::from_raw(&long).unwrap();
        assert_eq!(id.as_str().len(), GROUP_ID_MAX_LEN);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(GroupId::from_raw("!!!").is_none());
        assert!(GroupId::from_raw("").is_none());
    }

    #[test]
    fn trims_trailing_separators_after_truncation() {
        let raw = format!("{}-tail", "a".repeat(GROUP_ID_MAX_LEN - 2));
        let id = GroupId::from_raw(&raw).unwrap();
        assert!(!id.as_str().ends_with('-'));
        assert!(id.as_str().len() <= GROUP_ID_MAX_LEN);
    }
}
