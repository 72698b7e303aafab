//! Vector index over course content chunks.
//!
//! The index is read-mostly: it is populated once at startup from an
//! externally chunked corpus and then serves nearest-neighbor queries with
//! optional equality filters over the `course_title` and `lesson_number`
//! metadata fields. [`VectorIndex`] is the seam; [`InMemoryIndex`] is the
//! default backend.

pub mod in_memory;

pub use in_memory::InMemoryIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One embedded content chunk with its retrieval metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: usize,
    pub vector: Vec<f32>,
}

/// Equality constraints restricting a semantic query.
///
/// Both fields absent means unrestricted; one field is a single equality
/// constraint; both is a logical AND of the two.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl MetadataFilter {
    pub fn is_unrestricted(&self) -> bool {
        self.course_title.is_none() && self.lesson_number.is_none()
    }

    /// Whether a chunk satisfies every constraint in this filter.
    pub fn matches(&self, chunk: &ChunkRecord) -> bool {
        if let Some(course) = &self.course_title {
            if chunk.course_title != *course {
                return false;
            }
        }
        if let Some(lesson) = self.lesson_number {
            if chunk.lesson_number != Some(lesson) {
                return false;
            }
        }
        true
    }
}

/// A chunk ranked by ascending distance from the query vector.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: ChunkRecord,
    /// Cosine distance; lower is more relevant.
    pub distance: f32,
}

/// Faults raised by a vector index backend.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector dimension mismatch: index holds {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("index fault: {0}")]
    Fault(String),
}

/// Nearest-neighbor search over embedded chunks with metadata filtering.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `limit` chunks nearest to `vector`, restricted by
    /// `filter`, ranked by ascending distance. A structurally valid query
    /// that matches nothing yields an empty vec, not an error.
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<&MetadataFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError>;

    /// The name of this index implementation.
    fn name(&self) -> &str;
}

/// Cosine similarity of two equal-length vectors; 0.0 when either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(course: &str, lesson: Option<u32>) -> ChunkRecord {
        ChunkRecord {
            content: "text".into(),
            course_title: course.into(),
            lesson_number: lesson,
            chunk_index: 0,
            vector: vec![1.0, 0.0],
        }
    }

    #[test]
    fn unrestricted_filter_matches_everything() {
        let filter = MetadataFilter::default();
        assert!(filter.is_unrestricted());
        assert!(filter.matches(&chunk("Any Course", None)));
        assert!(filter.matches(&chunk("Other", Some(7))));
    }

    #[test]
    fn course_only_filter() {
        let filter = MetadataFilter {
            course_title: Some("Introduction to MCP".into()),
            lesson_number: None,
        };
        assert!(filter.matches(&chunk("Introduction to MCP", Some(1))));
        assert!(filter.matches(&chunk("Introduction to MCP", None)));
        assert!(!filter.matches(&chunk("Other Course", Some(1))));
    }

    #[test]
    fn lesson_only_filter() {
        let filter = MetadataFilter {
            course_title: None,
            lesson_number: Some(2),
        };
        assert!(filter.matches(&chunk("Any", Some(2))));
        assert!(!filter.matches(&chunk("Any", Some(3))));
        assert!(!filter.matches(&chunk("Any", None)));
    }

    #[test]
    fn combined_filter_requires_both() {
        let filter = MetadataFilter {
            course_title: Some("Introduction to MCP".into()),
            lesson_number: Some(2),
        };
        assert!(filter.matches(&chunk("Introduction to MCP", Some(2))));
        assert!(!filter.matches(&chunk("Introduction to MCP", Some(3))));
        assert!(!filter.matches(&chunk("Other", Some(2))));
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
