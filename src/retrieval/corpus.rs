//! Corpus loading: populate the content index from pre-chunked course files.
//!
//! Chunking and ingestion happen upstream; this loader only reads the
//! resulting JSON, embeds chunk contents in batches, and fills the index.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use super::{CourseRecord, Lesson};
use crate::embeddings::Embedder;
use crate::index::{ChunkRecord, InMemoryIndex};

/// On-disk corpus: a list of courses with pre-chunked lesson content.
#[derive(Debug, Deserialize)]
pub struct CorpusFile {
    pub courses: Vec<CourseDoc>,
}

#[derive(Debug, Deserialize)]
pub struct CourseDoc {
    pub title: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonDoc>,
}

#[derive(Debug, Deserialize)]
pub struct LessonDoc {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub chunks: Vec<String>,
}

/// Load a corpus file, embed its chunks, and populate the index.
/// Returns the course records for catalog construction.
pub async fn load_corpus(
    path: &Path,
    embedder: &dyn Embedder,
    index: &InMemoryIndex,
) -> Result<Vec<CourseRecord>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read corpus file {}", path.display()))?;
    let corpus: CorpusFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse corpus file {}", path.display()))?;

    let mut records = Vec::with_capacity(corpus.courses.len());
    for course in corpus.courses {
        let mut contents = Vec::new();
        let mut metadata = Vec::new();
        let mut chunk_index = 0usize;
        for lesson in &course.lessons {
            for chunk in &lesson.chunks {
                contents.push(chunk.clone());
                metadata.push((Some(lesson.number), chunk_index));
                chunk_index += 1;
            }
        }

        let vectors = embedder
            .embed_batch(&contents)
            .await
            .with_context(|| format!("failed to embed chunks for course '{}'", course.title))?;

        let chunks = contents
            .into_iter()
            .zip(vectors)
            .zip(metadata)
            .map(|((content, vector), (lesson_number, chunk_index))| ChunkRecord {
                content,
                course_title: course.title.clone(),
                lesson_number,
                chunk_index,
                vector,
            })
            .collect::<Vec<_>>();
        index
            .add_chunks(chunks)
            .with_context(|| format!("failed to index course '{}'", course.title))?;

        records.push(CourseRecord {
            title: course.title,
            instructor: course.instructor,
            link: course.link,
            lessons: course
                .lessons
                .into_iter()
                .map(|l| Lesson {
                    number: l.number,
                    title: l.title,
                })
                .collect(),
        });
    }

    info!(
        courses = records.len(),
        chunks = index.len(),
        "corpus loaded"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VectorIndex;
    use crate::retrieval::test_support::StubEmbedder;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "courses": [
            {
                "title": "Introduction to MCP",
                "instructor": "Ada",
                "lessons": [
                    {"number": 1, "title": "What is MCP", "chunks": ["MCP overview."]},
                    {"number": 2, "title": "Clients", "chunks": ["Client sessions.", "Tool use."]}
                ]
            },
            {
                "title": "Advanced Python",
                "lessons": [
                    {"number": 1, "title": "Generators", "chunks": ["Python yield."]}
                ]
            }
        ]
    }"#;

    #[tokio::test]
    async fn loads_courses_and_populates_index() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let index = InMemoryIndex::new();
        let records = load_corpus(file.path(), &StubEmbedder, &index).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Introduction to MCP");
        assert_eq!(records[0].lessons.len(), 2);
        assert_eq!(index.len(), 4);
    }

    #[tokio::test]
    async fn chunk_indices_run_per_course() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let index = InMemoryIndex::new();
        load_corpus(file.path(), &StubEmbedder, &index).await.unwrap();

        let hits = index
            .query(&StubEmbedder::vector_for("mcp"), None, 10)
            .await
            .unwrap();
        let mcp_indices: Vec<usize> = hits
            .iter()
            .filter(|h| h.chunk.course_title == "Introduction to MCP")
            .map(|h| h.chunk.chunk_index)
            .collect();
        let mut sorted = mcp_indices.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let index = InMemoryIndex::new();
        let err = load_corpus(Path::new("/nonexistent/corpus.json"), &StubEmbedder, &index)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read corpus file"));
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let index = InMemoryIndex::new();
        let err = load_corpus(file.path(), &StubEmbedder, &index).await.unwrap_err();
        assert!(err.to_string().contains("failed to parse corpus file"));
    }
}
