//! Content-hash dedup key (§4.6 step 1).

use sha2::{Digest, Sha256};

/// SHA-256 of the normalized composed content, hex-encoded.
///
/// Normalization is whitespace-trimming only: the composer is responsible
/// for deterministic output, this function just must never vary for
/// byte-identical composed content.
#[must_use]
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Cosine similarity between two equal-length dense vectors, used for the
/// semantic-dedup check in §4.6 step 4.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_hashes_identically() {
        assert_eq!(content_hash("hello world"), content_hash("hello world"));
    }

    #[test]
    fn leading_trailing_whitespace_does_not_change_hash() {
        assert_eq!(content_hash("hello world"), content_hash("  hello world  \n"));
    }

    #[test]
    fn different_content_hashes_differently() {
        assert_ne!(content_hash("hello"), content_hash("world"));
    }

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_zero_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }
}
