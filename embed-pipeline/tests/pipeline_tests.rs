use embed_pipeline::documents::{demo_documents, read_documents_from_file};
use embed_pipeline::embed::EmbedFuture;
use embed_pipeline::store::StoreFuture;
use embed_pipeline::{
    CollectionOutcome, Document, EmbedError, Embedder, HashingEmbedder, InMemoryStore,
    PipelineConfig, PipelineError, PipelineRunner, PointRecord, ReportSink, SearchHit, Stage,
    StoreError, StoreKind, VectorSpace, VectorStore,
};
use std::io::Write;
use std::sync::{Arc, Mutex};

const DIM: usize = 256;

fn config() -> PipelineConfig {
    let mut cfg = PipelineConfig::default();
    cfg.store.kind = StoreKind::Memory;
    cfg
}

fn hashing(_: &embed_pipeline::EmbeddingConfig) -> Result<Box<dyn Embedder>, EmbedError> {
    Ok(Box::new(HashingEmbedder::new(DIM)))
}

async fn run(
    runner: &PipelineRunner,
    docs: &[Document],
    store: &InMemoryStore,
) -> Result<embed_pipeline::RunReport, PipelineError> {
    let store = store.clone();
    runner
        .run_with(docs, hashing, move |_| {
            Ok(Box::new(store) as Box<dyn VectorStore>)
        })
        .await
}

#[tokio::test]
async fn fresh_collection_is_created_and_filled() {
    let runner = PipelineRunner::new(config()).unwrap();
    let store = InMemoryStore::new();
    let docs = demo_documents();

    let report = run(&runner, &docs, &store).await.unwrap();

    assert_eq!(report.collection_outcome, Some(CollectionOutcome::Created));
    assert_eq!(report.points_written, 4);
    assert_eq!(store.point_count("test"), Some(4));
    assert_eq!(store.space("test").map(|s| s.size), Some(DIM));

    for (i, doc) in docs.iter().enumerate() {
        let p = store.point("test", i as u64).unwrap();
        assert_eq!(p.id, i as u64);
        assert_eq!(p.document(), Some(doc.text()));
        assert_eq!(p.vector.len(), DIM);
    }
}

#[tokio::test]
async fn stages_are_timed_in_order() {
    let runner = PipelineRunner::new(config()).unwrap();
    let report = run(&runner, &demo_documents(), &InMemoryStore::new())
        .await
        .unwrap();

    let stages: Vec<Stage> = report.timings.iter().map(|t| t.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::InitEmbedder,
            Stage::Embed,
            Stage::Connect,
            Stage::EnsureCollection,
            Stage::Upsert,
        ]
    );
    assert!(report.to_string().contains("Collection `test` created!"));
}

#[tokio::test]
async fn rerun_against_existing_collection_still_completes() {
    let runner = PipelineRunner::new(config()).unwrap();
    let store = InMemoryStore::new();
    let docs = demo_documents();

    run(&runner, &docs, &store).await.unwrap();
    let second = run(&runner, &docs, &store).await.unwrap();

    assert!(matches!(
        second.collection_outcome,
        Some(CollectionOutcome::AlreadyExists(_))
    ));
    assert_eq!(second.points_written, 4);
    assert_eq!(store.point_count("test"), Some(4));
}

#[tokio::test]
async fn strict_mode_still_accepts_existing_collection() {
    let mut cfg = config();
    cfg.strict_collection = true;
    let runner = PipelineRunner::new(cfg).unwrap();
    let store = InMemoryStore::new();

    run(&runner, &demo_documents(), &store).await.unwrap();
    let second = run(&runner, &demo_documents(), &store).await.unwrap();
    assert!(matches!(
        second.collection_outcome,
        Some(CollectionOutcome::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn schema_mismatch_is_tolerated_then_upsert_fails() {
    // Existing collection with a different size: creation is tolerated
    // as "already exists", the write itself is fatal.
    let store = InMemoryStore::new();
    store
        .create_collection(
            "test",
            embed_pipeline::VectorSpace {
                size: DIM + 1,
                distance: embed_pipeline::DistanceKind::Cosine,
            },
        )
        .await
        .unwrap();

    let runner = PipelineRunner::new(config()).unwrap();
    let err = run(&runner, &demo_documents(), &store).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Store(StoreError::VectorSizeMismatch { .. })
    ));
}

#[tokio::test]
async fn embedder_init_failure_aborts() {
    let runner = PipelineRunner::new(config()).unwrap();
    let err = runner
        .run_with(
            &demo_documents(),
            |_| Err(EmbedError::InvalidEndpoint("nope".into())),
            |_| Ok(Box::new(InMemoryStore::new()) as Box<dyn VectorStore>),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Embed(EmbedError::InvalidEndpoint(_))
    ));
}

#[tokio::test]
async fn empty_documents_skip_store_stages() {
    let runner = PipelineRunner::new(config()).unwrap();
    let store = InMemoryStore::new();

    let report = run(&runner, &[], &store).await.unwrap();

    assert_eq!(report.points_written, 0);
    assert!(report.collection_outcome.is_none());
    assert!(report.timing(Stage::Upsert).is_none());
    assert_eq!(store.point_count("test"), None);
}

#[tokio::test]
async fn follow_up_query_returns_closest_document() {
    let mut cfg = config();
    cfg.query = Some("an example passage".into());
    cfg.top_k = 2;
    let runner = PipelineRunner::new(cfg).unwrap();

    let report = run(&runner, &demo_documents(), &InMemoryStore::new())
        .await
        .unwrap();

    assert_eq!(report.hits.len(), 2);
    assert_eq!(report.hits[0].id, Some(2));
    assert_eq!(
        report.hits[0].document(),
        Some("passage: This is an example passage.")
    );
    assert!(report.timing(Stage::Search).is_some());
}

#[tokio::test]
async fn documents_file_ids_are_contiguous() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "passage: one").unwrap();
    writeln!(f).unwrap();
    writeln!(f, "passage: two").unwrap();
    writeln!(f, "query: three").unwrap();
    let docs = read_documents_from_file(f.path()).unwrap();

    let runner = PipelineRunner::new(config()).unwrap();
    let store = InMemoryStore::new();
    let report = run(&runner, &docs, &store).await.unwrap();

    assert_eq!(report.points_written, 3);
    assert_eq!(
        store.point("test", 1).unwrap().document(),
        Some("passage: two")
    );
    assert!(store.point("test", 3).is_none());
}

/// Embedder returning one vector too few.
struct Lossy;

impl Embedder for Lossy {
    fn embed<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a> {
        let n = texts.len() - 1;
        Box::pin(async move { Ok(vec![vec![0.5; 3]; n]) })
    }
    fn describe(&self) -> String {
        "lossy".into()
    }
}

#[tokio::test]
async fn vector_count_mismatch_aborts_before_store_stages() {
    let runner = PipelineRunner::new(config()).unwrap();
    let store = InMemoryStore::new();
    let handle = store.clone();

    let err = runner
        .run_with(
            &demo_documents(),
            |_| Ok(Box::new(Lossy) as Box<dyn Embedder>),
            move |_| Ok(Box::new(handle) as Box<dyn VectorStore>),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::VectorCountMismatch { got: 3, want: 4 }
    ));
    assert_eq!(store.point_count("test"), None);
}

/// Store that refuses everything, like a Qdrant URL nobody listens on.
struct Unreachable;

impl VectorStore for Unreachable {
    fn create_collection<'a>(&'a self, _: &'a str, _: VectorSpace) -> StoreFuture<'a, ()> {
        Box::pin(async { Err(StoreError::Backend("connection refused".into())) })
    }
    fn collection_exists<'a>(&'a self, _: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async { Err(StoreError::Backend("connection refused".into())) })
    }
    fn upsert<'a>(&'a self, _: &'a str, _: Vec<PointRecord>) -> StoreFuture<'a, u64> {
        Box::pin(async { Err(StoreError::Backend("upsert_points: connection refused".into())) })
    }
    fn search<'a>(&'a self, _: &'a str, _: Vec<f32>, _: u64) -> StoreFuture<'a, Vec<SearchHit>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

#[tokio::test]
async fn stage_lines_are_written_before_a_failed_upsert() {
    let buf = Arc::new(Mutex::new(Vec::<u8>::new()));
    let runner = PipelineRunner::new(config())
        .unwrap()
        .with_output(buf.clone() as ReportSink);

    let err = runner
        .run_with(&demo_documents(), hashing, |_| {
            Ok(Box::new(Unreachable) as Box<dyn VectorStore>)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Store(StoreError::Backend(_))));

    let out = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 6, "{out}");
    assert!(lines[0].starts_with("Model initialization took: "));
    assert!(lines[1].starts_with("Embedding generation took: "));
    assert!(lines[2].starts_with("Vector store connection took: "));
    assert_eq!(
        lines[3],
        "Collection `test` could not be created: vector store error: connection refused"
    );
    assert!(lines[4].starts_with("Collection creation took: "));
    assert!(lines[5].starts_with("Upsert operation took: "));
}

#[tokio::test]
async fn streamed_lines_match_the_report() {
    let buf = Arc::new(Mutex::new(Vec::<u8>::new()));
    let runner = PipelineRunner::new(config())
        .unwrap()
        .with_output(buf.clone() as ReportSink);

    let report = run(&runner, &demo_documents(), &InMemoryStore::new())
        .await
        .unwrap();

    let streamed = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
    assert_eq!(format!("{streamed}{}", report.summary()), report.to_string());
}
