//! In-memory vector index backed by brute-force cosine scan.
//!
//! The corpus for a course deployment is small enough that a linear scan
//! with a metadata pre-filter beats maintaining an ANN structure.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Ordering;
use tracing::debug;

use super::{cosine_similarity, ChunkRecord, IndexError, MetadataFilter, ScoredChunk, VectorIndex};

/// A vector index holding all chunk records in memory.
pub struct InMemoryIndex {
    records: RwLock<Vec<ChunkRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Add embedded chunks to the index. All vectors must share the
    /// dimension of whatever is already stored.
    pub fn add_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), IndexError> {
        let mut records = self.records.write();
        let expected = records
            .first()
            .map(|r| r.vector.len())
            .or_else(|| chunks.first().map(|c| c.vector.len()));
        if let Some(expected) = expected {
            for chunk in &chunks {
                if chunk.vector.len() != expected {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        actual: chunk.vector.len(),
                    });
                }
            }
        }
        records.extend(chunks);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<&MetadataFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let records = self.records.read();
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let expected = records[0].vector.len();
        if vector.len() != expected {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = records
            .iter()
            .filter(|record| filter.map_or(true, |f| f.matches(record)))
            .map(|record| ScoredChunk {
                chunk: record.clone(),
                distance: 1.0 - cosine_similarity(vector, &record.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(limit);

        debug!(hits = scored.len(), limit, "index query complete");
        Ok(scored)
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str, course: &str, lesson: Option<u32>, vector: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            content: content.into(),
            course_title: course.into(),
            lesson_number: lesson,
            chunk_index: 0,
            vector,
        }
    }

    fn seeded() -> InMemoryIndex {
        let index = InMemoryIndex::new();
        index
            .add_chunks(vec![
                record("servers", "Introduction to MCP", Some(1), vec![1.0, 0.0, 0.0]),
                record("clients", "Introduction to MCP", Some(2), vec![0.0, 1.0, 0.0]),
                record("loops", "Advanced Python", Some(1), vec![0.0, 0.0, 1.0]),
            ])
            .unwrap();
        index
    }

    #[tokio::test]
    async fn query_ranks_by_ascending_distance() {
        let index = seeded();
        let hits = index.query(&[1.0, 0.1, 0.0], None, 5).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.content, "servers");
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[tokio::test]
    async fn query_respects_limit() {
        let index = seeded();
        let hits = index.query(&[1.0, 0.0, 0.0], None, 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn filter_restricts_hits() {
        let index = seeded();
        let filter = MetadataFilter {
            course_title: Some("Introduction to MCP".into()),
            lesson_number: Some(2),
        };
        let hits = index.query(&[1.0, 0.0, 0.0], Some(&filter), 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.content, "clients");
    }

    #[tokio::test]
    async fn unmatched_filter_yields_empty_not_error() {
        let index = seeded();
        let filter = MetadataFilter {
            course_title: Some("No Such Course".into()),
            lesson_number: None,
        };
        let hits = index.query(&[1.0, 0.0, 0.0], Some(&filter), 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn empty_index_yields_empty() {
        let index = InMemoryIndex::new();
        let hits = index.query(&[1.0, 0.0], None, 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_error() {
        let index = seeded();
        let err = index.query(&[1.0, 0.0], None, 5).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn add_chunks_rejects_mixed_dimensions() {
        let index = InMemoryIndex::new();
        index
            .add_chunks(vec![record("a", "C", None, vec![1.0, 0.0])])
            .unwrap();
        let err = index
            .add_chunks(vec![record("b", "C", None, vec![1.0, 0.0, 0.0])])
            .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }
}
