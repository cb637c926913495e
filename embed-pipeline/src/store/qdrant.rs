//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! All Qdrant interactions live here behind [`VectorStore`], hiding the
//! verbose builder pattern from the rest of the crate.

use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, ScoredPoint, SearchParamsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::{DistanceKind, StoreConfig, VectorSpace};
use crate::errors::StoreError;
use crate::record::{PointRecord, SearchHit};
use crate::store::{StoreFuture, VectorStore};

pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    /// Builds a gRPC client for `cfg.url`, with the API key if one is set.
    ///
    /// This call does **not** touch the server: the client's version
    /// handshake is skipped, so reachability shows up on the first request.
    pub fn connect(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let mut builder = Qdrant::from_url(&cfg.url).skip_compatibility_check();
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Backend(format!("client build: {e}")))?;
        Ok(Self { client })
    }
}

impl VectorStore for QdrantStore {
    fn create_collection<'a>(
        &'a self,
        name: &'a str,
        space: VectorSpace,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            info!(
                "Creating collection '{}' with size={} distance={:?}",
                name, space.size, space.distance
            );
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
                        space.size as u64,
                        to_qdrant_distance(space.distance),
                    )),
                )
                .await
                .map_err(|e| classify_create_error(name, e.to_string()))?;
            Ok(())
        })
    }

    fn collection_exists<'a>(&'a self, name: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.client
                .collection_exists(name)
                .await
                .map_err(|e| StoreError::Backend(format!("collection_exists: {e}")))
        })
    }

    fn upsert<'a>(&'a self, name: &'a str, points: Vec<PointRecord>) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            if points.is_empty() {
                debug!("No points provided for upsert");
                return Ok(0);
            }

            let count = points.len() as u64;
            let points = points
                .into_iter()
                .map(to_point_struct)
                .collect::<Result<Vec<_>, _>>()?;

            info!("Upserting {} points into collection '{}'", count, name);
            let res = self
                .client
                .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
                .await
                .map_err(|e| StoreError::Backend(format!("upsert_points: {e}")))?;
            debug!("Upsert operation result={:?}", res.result);

            Ok(count)
        })
    }

    fn search<'a>(
        &'a self,
        name: &'a str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> StoreFuture<'a, Vec<SearchHit>> {
        Box::pin(async move {
            let res = self
                .client
                .search_points(
                    SearchPointsBuilder::new(name, vector, top_k)
                        .with_payload(true)
                        .params(SearchParamsBuilder::default().exact(true)),
                )
                .await
                .map_err(|e| StoreError::Backend(format!("search_points: {e}")))?;

            let hits: Vec<SearchHit> = res.result.into_iter().map(to_search_hit).collect();
            debug!("Search completed: {} hits returned", hits.len());
            Ok(hits)
        })
    }
}

fn to_qdrant_distance(d: DistanceKind) -> Distance {
    match d {
        DistanceKind::Cosine => Distance::Cosine,
        DistanceKind::Dot => Distance::Dot,
        DistanceKind::Euclid => Distance::Euclid,
    }
}

/// Qdrant answers a duplicate create with a status whose message says
/// "already exists"; everything else is a backend failure.
fn classify_create_error(collection: &str, message: String) -> StoreError {
    if message.to_lowercase().contains("already exists") {
        StoreError::AlreadyExists {
            collection: collection.to_string(),
            detail: message,
        }
    } else {
        StoreError::Backend(format!("create_collection: {message}"))
    }
}

fn to_point_struct(p: PointRecord) -> Result<PointStruct, StoreError> {
    let payload: Payload = Value::Object(p.payload)
        .try_into()
        .map_err(|e| StoreError::Payload(format!("{e}")))?;
    Ok(PointStruct::new(p.id, p.vector, payload))
}

fn to_search_hit(sp: ScoredPoint) -> SearchHit {
    let id = sp
        .id
        .and_then(|pid| pid.point_id_options)
        .and_then(|opt| match opt {
            PointIdOptions::Num(n) => Some(n),
            PointIdOptions::Uuid(_) => None,
        });

    let payload: Map<String, Value> = sp
        .payload
        .into_iter()
        .map(|(k, v)| (k, v.into_json()))
        .collect();

    SearchHit {
        id,
        score: sp.score,
        payload,
    }
}
