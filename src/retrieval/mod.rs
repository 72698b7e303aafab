//! Retrieval backend: course-name resolution and filtered semantic search.
//!
//! A search request arrives with loose user-provided filters (a partial
//! course name, a lesson number). Resolution maps the loose name to a
//! canonical catalog title via nearest-neighbor matching over embedded
//! titles; search then runs the semantic query against the content index
//! restricted to the resolved filter.

pub mod corpus;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::embeddings::Embedder;
use crate::index::{cosine_similarity, IndexError, MetadataFilter, VectorIndex};

/// Default number of results when the caller does not override.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// One lesson within a course.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
}

/// Catalog entry for one course. The title is the primary key and the
/// canonical form used in filters and source descriptors.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CourseRecord {
    pub title: String,
    pub instructor: Option<String>,
    pub link: Option<String>,
    pub lessons: Vec<Lesson>,
}

/// A canonical course title produced by catalog resolution.
///
/// Only the catalog can mint one, so a course filter can never be built
/// from a raw user-supplied name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCourse(String);

impl ResolvedCourse {
    pub fn title(&self) -> &str {
        &self.0
    }
}

/// Retrieval failures. `CourseNotFound` is recoverable (rendered as an
/// informational tool result); `IndexFault` is fatal and propagates.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("no course found matching '{name}'")]
    CourseNotFound { name: String },
    #[error("index fault: {0}")]
    IndexFault(String),
}

impl From<IndexError> for RetrievalError {
    fn from(err: IndexError) -> Self {
        RetrievalError::IndexFault(err.to_string())
    }
}

/// One ranked hit from a semantic search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    /// Cosine distance; lower is more relevant.
    pub distance: f32,
    pub chunk_index: usize,
}

impl SearchResult {
    /// Human-readable attribution string for this hit.
    pub fn source_descriptor(&self) -> String {
        source_descriptor(&self.course_title, self.lesson_number)
    }
}

/// Format a source descriptor: `"<title> - Lesson <n>"`, or the title alone
/// when the lesson is absent.
pub fn source_descriptor(course_title: &str, lesson_number: Option<u32>) -> String {
    match lesson_number {
        Some(n) => format!("{course_title} - Lesson {n}"),
        None => course_title.to_string(),
    }
}

/// Parse a source descriptor back into its (course, lesson) parts.
pub fn parse_source_descriptor(descriptor: &str) -> (String, Option<u32>) {
    if let Some((course, lesson)) = descriptor.rsplit_once(" - Lesson ") {
        if let Ok(n) = lesson.trim().parse::<u32>() {
            return (course.to_string(), Some(n));
        }
    }
    (descriptor.to_string(), None)
}

struct CatalogEntry {
    vector: Vec<f32>,
    record: CourseRecord,
}

/// Read-only catalog of courses with pre-embedded titles.
pub struct CourseCatalog {
    entries: Vec<CatalogEntry>,
}

impl CourseCatalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Embed every course title once and build the catalog.
    pub async fn build(
        embedder: &dyn Embedder,
        records: Vec<CourseRecord>,
    ) -> anyhow::Result<Self> {
        let titles: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
        let vectors = embedder.embed_batch(&titles).await?;
        let entries = vectors
            .into_iter()
            .zip(records)
            .map(|(vector, record)| CatalogEntry { vector, record })
            .collect();
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn records(&self) -> impl Iterator<Item = &CourseRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Nearest catalog entry by cosine similarity, with its similarity.
    fn nearest(&self, vector: &[f32]) -> Option<(f32, &CourseRecord)> {
        self.entries
            .iter()
            .map(|entry| (cosine_similarity(vector, &entry.vector), &entry.record))
            .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// The retrieval backend: owns the course catalog and the content index.
///
/// All operations are read-only against both; calls are idempotent and
/// safely retryable.
pub struct RetrievalBackend {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    catalog: CourseCatalog,
    default_limit: usize,
    /// Optional minimum cosine similarity for course resolution. `None`
    /// accepts the nearest catalog entry unconditionally.
    min_similarity: Option<f32>,
}

impl RetrievalBackend {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        catalog: CourseCatalog,
    ) -> Self {
        Self {
            embedder,
            index,
            catalog,
            default_limit: DEFAULT_SEARCH_LIMIT,
            min_similarity: None,
        }
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub fn with_min_similarity(mut self, cutoff: Option<f32>) -> Self {
        self.min_similarity = cutoff;
        self
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    /// Resolve a loose course name to its canonical catalog title.
    ///
    /// The single nearest title wins. With no similarity cutoff configured
    /// that is unconditional; with one, a best match below the cutoff is
    /// reported as not found.
    pub async fn resolve_course(&self, raw_name: &str) -> Result<ResolvedCourse, RetrievalError> {
        if self.catalog.is_empty() {
            return Err(RetrievalError::CourseNotFound {
                name: raw_name.to_string(),
            });
        }

        let vector = self
            .embedder
            .embed(raw_name)
            .await
            .map_err(|e| RetrievalError::IndexFault(e.to_string()))?;

        let (similarity, record) =
            self.catalog
                .nearest(&vector)
                .ok_or_else(|| RetrievalError::CourseNotFound {
                    name: raw_name.to_string(),
                })?;

        if let Some(cutoff) = self.min_similarity {
            if similarity < cutoff {
                info!(
                    raw = raw_name,
                    best = %record.title,
                    similarity,
                    cutoff,
                    "best course match below similarity cutoff"
                );
                return Err(RetrievalError::CourseNotFound {
                    name: raw_name.to_string(),
                });
            }
        }

        debug!(raw = raw_name, resolved = %record.title, similarity, "resolved course name");
        Ok(ResolvedCourse(record.title.clone()))
    }

    /// Build the metadata filter for a search. `None` when unrestricted.
    pub fn build_filter(
        course: Option<&ResolvedCourse>,
        lesson_number: Option<u32>,
    ) -> Option<MetadataFilter> {
        if course.is_none() && lesson_number.is_none() {
            return None;
        }
        Some(MetadataFilter {
            course_title: course.map(|c| c.title().to_string()),
            lesson_number,
        })
    }

    /// Resolve loose filters and run the filtered semantic search.
    ///
    /// `limit` defaults to the configured value and is clamped to at least 1.
    /// An empty hit set is a valid outcome, not an error.
    pub async fn resolve_and_search(
        &self,
        query_text: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let resolved = match course_name {
            Some(name) => Some(self.resolve_course(name).await?),
            None => None,
        };
        let filter = Self::build_filter(resolved.as_ref(), lesson_number);
        let limit = limit.unwrap_or(self.default_limit).max(1);

        let query_vector = self
            .embedder
            .embed(query_text)
            .await
            .map_err(|e| RetrievalError::IndexFault(e.to_string()))?;

        let hits = self.index.query(&query_vector, filter.as_ref(), limit).await?;
        debug!(
            hits = hits.len(),
            filtered = filter.is_some(),
            "semantic search complete"
        );

        Ok(hits
            .into_iter()
            .map(|scored| SearchResult {
                content: scored.chunk.content,
                course_title: scored.chunk.course_title,
                lesson_number: scored.chunk.lesson_number,
                distance: scored.distance,
                chunk_index: scored.chunk.chunk_index,
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::index::{ChunkRecord, InMemoryIndex};
    use anyhow::Result;
    use async_trait::async_trait;

    /// Deterministic embedder: maps known phrases onto fixed axes so tests
    /// control which catalog entry or chunk is nearest.
    pub struct StubEmbedder;

    impl StubEmbedder {
        pub fn vector_for(text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            if lower.contains("mcp") {
                vec![1.0, 0.0, 0.0]
            } else if lower.contains("python") {
                vec![0.0, 1.0, 0.0]
            } else {
                vec![0.0, 0.0, 1.0]
            }
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(Self::vector_for(text))
        }
        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Embedder whose every call fails, for fault-path tests.
    pub struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            anyhow::bail!("embedding backend offline")
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    pub fn course(title: &str, lessons: &[(u32, &str)]) -> CourseRecord {
        CourseRecord {
            title: title.to_string(),
            instructor: Some("Staff".to_string()),
            link: None,
            lessons: lessons
                .iter()
                .map(|(number, title)| Lesson {
                    number: *number,
                    title: (*title).to_string(),
                })
                .collect(),
        }
    }

    pub fn seeded_index() -> InMemoryIndex {
        let index = InMemoryIndex::new();
        index
            .add_chunks(vec![
                ChunkRecord {
                    content: "MCP servers expose tools to clients.".into(),
                    course_title: "Introduction to MCP".into(),
                    lesson_number: Some(1),
                    chunk_index: 0,
                    vector: vec![0.9, 0.1, 0.0],
                },
                ChunkRecord {
                    content: "Lesson 2 covers MCP client sessions.".into(),
                    course_title: "Introduction to MCP".into(),
                    lesson_number: Some(2),
                    chunk_index: 1,
                    vector: vec![1.0, 0.0, 0.0],
                },
                ChunkRecord {
                    content: "Python generators yield lazily.".into(),
                    course_title: "Advanced Python".into(),
                    lesson_number: Some(1),
                    chunk_index: 0,
                    vector: vec![0.0, 1.0, 0.0],
                },
            ])
            .unwrap();
        index
    }

    pub async fn seeded_backend() -> RetrievalBackend {
        let embedder = Arc::new(StubEmbedder);
        let records = vec![
            course("Introduction to MCP", &[(1, "What is MCP"), (2, "Clients")]),
            course("Advanced Python", &[(1, "Generators")]),
        ];
        let catalog = CourseCatalog::build(embedder.as_ref(), records).await.unwrap();
        RetrievalBackend::new(embedder, Arc::new(seeded_index()), catalog)
    }
}
