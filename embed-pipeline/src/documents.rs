//! Input documents: built-in demo set and line-oriented files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::errors::Result;

/// Documents embedded when no `DOCUMENTS_PATH` is configured.
pub const DEMO_DOCUMENTS: [&str; 4] = [
    "passage: Hello, World!",
    "query: Hello, World!",
    "passage: This is an example passage.",
    "fastembed is supported by and maintained by Qdrant.",
];

/// Semantic role signalled to the embedding model by a text prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRole {
    /// `passage: ...`
    Passage,
    /// `query: ...`
    Query,
    /// No recognized prefix.
    Untagged,
}

/// An immutable input text. Its position in the input sequence becomes its point id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Original text, prefix included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn role(&self) -> DocumentRole {
        if self.text.starts_with("passage:") {
            DocumentRole::Passage
        } else if self.text.starts_with("query:") {
            DocumentRole::Query
        } else {
            DocumentRole::Untagged
        }
    }
}

/// The four built-in demo documents, in order.
pub fn demo_documents() -> Vec<Document> {
    DEMO_DOCUMENTS.iter().copied().map(Document::new).collect()
}

/// Reads one document per line. Blank lines are skipped so ids stay contiguous.
pub fn read_documents_from_file(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    debug!("Reading documents from {:?}", path);

    let reader = BufReader::new(File::open(path)?);
    let mut docs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        docs.push(Document::new(line));
    }

    info!("Loaded {} documents from {:?}", docs.len(), path);
    Ok(docs)
}

/// Resolves the document list for a run: file if configured, demo set otherwise.
pub fn load(cfg: &PipelineConfig) -> Result<Vec<Document>> {
    match &cfg.documents_path {
        Some(path) => read_documents_from_file(path),
        None => Ok(demo_documents()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn demo_set_keeps_order_and_roles() {
        let docs = demo_documents();
        assert_eq!(docs.len(), 4);
        assert_eq!(docs[0].text(), "passage: Hello, World!");
        assert_eq!(docs[0].role(), DocumentRole::Passage);
        assert_eq!(docs[1].role(), DocumentRole::Query);
        assert_eq!(docs[3].role(), DocumentRole::Untagged);
    }

    #[test]
    fn file_reader_skips_blank_lines() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "passage: first").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "   ").unwrap();
        writeln!(f, "query: second").unwrap();

        let docs = read_documents_from_file(f.path()).unwrap();
        assert_eq!(
            docs,
            vec![Document::new("passage: first"), Document::new("query: second")]
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_documents_from_file("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, crate::errors::PipelineError::Io(_)));
    }

    #[test]
    fn load_falls_back_to_demo_set() {
        let docs = load(&PipelineConfig::default()).unwrap();
        assert_eq!(docs, demo_documents());
    }
}
