//! Point records written to the store and hits read back from it.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::documents::Document;
use crate::errors::{PipelineError, Result};

/// Payload key holding the source document text.
pub const PAYLOAD_DOCUMENT_KEY: &str = "document";

/// Unit of storage: positional id, vector, and a payload with the source text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointRecord {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

impl PointRecord {
    /// Source document text stored in the payload.
    pub fn document(&self) -> Option<&str> {
        self.payload.get(PAYLOAD_DOCUMENT_KEY).and_then(Value::as_str)
    }
}

/// A single similarity hit.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    /// Numeric point id; `None` for UUID-keyed points.
    pub id: Option<u64>,
    pub score: f32,
    pub payload: Map<String, Value>,
}

impl SearchHit {
    pub fn document(&self) -> Option<&str> {
        self.payload.get(PAYLOAD_DOCUMENT_KEY).and_then(Value::as_str)
    }
}

/// Pairs documents with their vectors. Ids are the zero-based document positions.
///
/// # Errors
/// - [`PipelineError::VectorCountMismatch`] if the counts differ.
/// - [`PipelineError::VectorSizeMismatch`] if vector lengths are not uniform.
pub fn build_points(documents: &[Document], vectors: Vec<Vec<f32>>) -> Result<Vec<PointRecord>> {
    if documents.len() != vectors.len() {
        return Err(PipelineError::VectorCountMismatch {
            got: vectors.len(),
            want: documents.len(),
        });
    }
    check_uniform(&vectors)?;

    let points = documents
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (doc, vector))| {
            let mut payload = Map::new();
            payload.insert(
                PAYLOAD_DOCUMENT_KEY.to_string(),
                Value::String(doc.text().to_string()),
            );
            PointRecord {
                id: i as u64,
                vector,
                payload,
            }
        })
        .collect();

    Ok(points)
}

/// All vectors must share the first vector's length.
pub(crate) fn check_uniform(vectors: &[Vec<f32>]) -> Result<()> {
    let Some(want) = vectors.first().map(Vec::len) else {
        return Ok(());
    };
    for (index, v) in vectors.iter().enumerate() {
        if v.len() != want {
            return Err(PipelineError::VectorSizeMismatch {
                index,
                got: v.len(),
                want,
            });
        }
    }
    Ok(())
}
