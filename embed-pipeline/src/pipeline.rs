//! The runner: Init → Embed → Connect → EnsureCollection → Upsert → (Search) → Done.
//!
//! Stages run strictly in order on one task; each is wrapped by a
//! [`StageTimer`] measurement. Only collection creation has a tolerated
//! failure path, every other failure aborts the run.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::{EmbeddingConfig, PipelineConfig, StoreConfig, VectorSpace};
use crate::documents::Document;
use crate::embed::{self, Embedder};
use crate::errors::{EmbedError, PipelineError, Result, StoreError};
use crate::record::{PointRecord, SearchHit, build_points, check_uniform};
use crate::store::{self, VectorStore};
use crate::timing::{ReportSink, Stage, StageTimer, StageTiming, emit_line};

/// How the collection step ended. Every variant lets the run continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    Created,
    /// Carries the store's raw message.
    AlreadyExists(String),
    /// Any other failure, tolerated. Carries the raw error message.
    Failed(String),
}

impl CollectionOutcome {
    pub fn message(&self, collection: &str) -> String {
        match self {
            CollectionOutcome::Created => format!("Collection `{collection}` created!"),
            CollectionOutcome::AlreadyExists(detail) => {
                format!("Collection `{collection}` already exists: {detail}")
            }
            CollectionOutcome::Failed(detail) => {
                format!("Collection `{collection}` could not be created: {detail}")
            }
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub collection: String,
    pub timings: Vec<StageTiming>,
    /// `None` when there was nothing to embed and the store stages were skipped.
    pub collection_outcome: Option<CollectionOutcome>,
    pub points_written: u64,
    pub query: Option<String>,
    pub hits: Vec<SearchHit>,
}

impl RunReport {
    fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            timings: Vec::new(),
            collection_outcome: None,
            points_written: 0,
            query: None,
            hits: Vec::new(),
        }
    }

    pub fn timing(&self, stage: Stage) -> Option<&StageTiming> {
        self.timings.iter().find(|t| t.stage == stage)
    }

    /// Lines that follow the per-stage output: points written and query hits.
    pub fn summary(&self) -> Summary<'_> {
        Summary(self)
    }
}

/// Display adapter for [`RunReport::summary`].
pub struct Summary<'a>(&'a RunReport);

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.timings {
            if t.stage == Stage::EnsureCollection {
                if let Some(outcome) = &self.collection_outcome {
                    writeln!(f, "{}", outcome.message(&self.collection))?;
                }
            }
            writeln!(f, "{t}")?;
        }
        write!(f, "{}", self.summary())
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "Points written to `{}`: {}",
            report.collection, report.points_written
        )?;
        if let Some(q) = &report.query {
            writeln!(f, "Top {} hits for {q:?}:", report.hits.len())?;
            for h in &report.hits {
                let id = h.id.map(|i| i.to_string()).unwrap_or_else(|| "-".into());
                writeln!(
                    f,
                    "  {:>8.4}  #{id}  {}",
                    h.score,
                    h.document().unwrap_or("<no document>")
                )?;
            }
        }
        Ok(())
    }
}

/// Executes the pipeline for one configuration.
pub struct PipelineRunner {
    cfg: PipelineConfig,
    output: Option<ReportSink>,
}

impl PipelineRunner {
    /// # Errors
    /// Returns [`PipelineError::Config`] if `cfg` fails validation.
    pub fn new(cfg: PipelineConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg, output: None })
    }

    /// Streams stage timings and the collection outcome to `sink` while running.
    ///
    /// Lines already written survive a later fatal failure.
    pub fn with_output(mut self, sink: ReportSink) -> Self {
        self.output = Some(sink);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Runs against the configured embedder and store backends.
    pub async fn run(&self, documents: &[Document]) -> Result<RunReport> {
        self.run_with(documents, embed::init_embedder, store::connect)
            .await
    }

    /// Runs with caller-supplied constructors for the two collaborators.
    ///
    /// Constructors are invoked inside their timed stages.
    pub async fn run_with<FE, FS>(
        &self,
        documents: &[Document],
        init_embedder: FE,
        connect_store: FS,
    ) -> Result<RunReport>
    where
        FE: FnOnce(&EmbeddingConfig) -> std::result::Result<Box<dyn Embedder>, EmbedError>,
        FS: FnOnce(&StoreConfig) -> std::result::Result<Box<dyn VectorStore>, StoreError>,
    {
        let cfg = &self.cfg;
        let collection = cfg.store.collection.as_str();
        let mut timer = StageTimer::with_sink(self.output.clone());
        let mut report = RunReport::new(collection);

        let embedder = timer.measure(Stage::InitEmbedder, || init_embedder(&cfg.embedding))?;
        info!("Embedder ready: {}", embedder.describe());

        let vectors = timer
            .measure_async(Stage::Embed, embed_documents(embedder.as_ref(), documents))
            .await?;

        let store = timer.measure(Stage::Connect, || connect_store(&cfg.store))?;

        let Some(dim) = vectors.first().map(Vec::len) else {
            warn!("No documents to embed; skipping collection and upsert stages");
            report.timings = timer.into_timings();
            return Ok(report);
        };

        let space = VectorSpace {
            size: dim,
            distance: cfg.store.distance,
        };
        let outcome = timer
            .measure_async(Stage::EnsureCollection, async {
                let outcome =
                    ensure_collection(store.as_ref(), collection, space, cfg.strict_collection)
                        .await?;
                emit_line(self.output.as_ref(), &outcome.message(collection));
                Ok::<_, StoreError>(outcome)
            })
            .await?;
        report.collection_outcome = Some(outcome);

        report.points_written = timer
            .measure_async(Stage::Upsert, async {
                let points = build_points(documents, vectors)?;
                upsert_points(store.as_ref(), collection, points).await
            })
            .await?;

        if let Some(query) = cfg.query.as_deref() {
            report.hits = timer
                .measure_async(
                    Stage::Search,
                    search(embedder.as_ref(), store.as_ref(), collection, query, cfg.top_k),
                )
                .await?;
            report.query = Some(query.to_string());
        }

        report.timings = timer.into_timings();
        info!(
            "Pipeline finished: {} points in '{}'",
            report.points_written, collection
        );
        Ok(report)
    }
}

/// Embeds documents in order. Empty input yields empty output without calling the embedder.
///
/// # Errors
/// Embedding failures, or a result that breaks the one-vector-per-document
/// contract or has ragged vector lengths.
pub async fn embed_documents(
    embedder: &dyn Embedder,
    documents: &[Document],
) -> Result<Vec<Vec<f32>>> {
    if documents.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = documents.iter().map(|d| d.text().to_string()).collect();
    let vectors = embedder.embed(&texts).await?;

    if vectors.len() != texts.len() {
        return Err(PipelineError::VectorCountMismatch {
            got: vectors.len(),
            want: texts.len(),
        });
    }
    check_uniform(&vectors)?;

    debug!(
        "Embedded {} documents, dim={}",
        vectors.len(),
        vectors.first().map_or(0, Vec::len)
    );
    Ok(vectors)
}

/// Attempts to create the collection.
///
/// "Already exists" always continues. Any other failure is checked against
/// [`VectorStore::collection_exists`]: a collection that is there after all
/// counts as "already exists". Remaining failures continue unless `strict`,
/// in which case they are returned.
pub async fn ensure_collection(
    store: &dyn VectorStore,
    name: &str,
    space: VectorSpace,
    strict: bool,
) -> std::result::Result<CollectionOutcome, StoreError> {
    let err = match store.create_collection(name, space).await {
        Ok(()) => {
            info!("Collection `{name}` created!");
            return Ok(CollectionOutcome::Created);
        }
        Err(StoreError::AlreadyExists { detail, .. }) => {
            warn!("Collection `{name}` already exists: {detail}");
            return Ok(CollectionOutcome::AlreadyExists(detail));
        }
        Err(err) => err,
    };

    match store.collection_exists(name).await {
        Ok(true) => {
            let detail = err.to_string();
            warn!("Collection `{name}` already exists: {detail}");
            return Ok(CollectionOutcome::AlreadyExists(detail));
        }
        Ok(false) => {}
        Err(e) => debug!("Existence check for `{name}` failed: {e}"),
    }

    if strict {
        error!("Collection `{name}` could not be created: {err}");
        return Err(err);
    }
    error!("Collection `{name}` could not be created, continuing: {err}");
    Ok(CollectionOutcome::Failed(err.to_string()))
}

/// Single batch write; no retry.
pub async fn upsert_points(
    store: &dyn VectorStore,
    name: &str,
    points: Vec<PointRecord>,
) -> Result<u64> {
    Ok(store.upsert(name, points).await?)
}

/// Embeds `query` and returns the `top_k` closest points.
pub async fn search(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    name: &str,
    query: &str,
    top_k: u64,
) -> Result<Vec<SearchHit>> {
    let texts = [query.to_string()];
    let vector = embedder
        .embed(&texts)
        .await?
        .into_iter()
        .next()
        .ok_or(PipelineError::VectorCountMismatch { got: 0, want: 1 })?;

    let hits = store.search(name, vector, top_k).await?;
    for h in &hits {
        info!(
            "hit score={:.4} id={:?} document={:?}",
            h.score,
            h.id,
            h.document()
        );
    }
    Ok(hits)
}
