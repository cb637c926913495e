//! Process-local vector store.
//!
//! Mirrors the Qdrant contract closely enough to dry-run the pipeline:
//! duplicate creation fails with [`StoreError::AlreadyExists`], upserts are
//! validated as a whole before anything is written, and search is exact.
//! Cloning shares the underlying collections.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::config::{DistanceKind, VectorSpace};
use crate::errors::StoreError;
use crate::record::{PointRecord, SearchHit};
use crate::store::{StoreFuture, VectorStore};

#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<Mutex<HashMap<String, Collection>>>,
}

struct Collection {
    space: VectorSpace,
    points: BTreeMap<u64, PointRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points stored in `name`, if the collection exists.
    pub fn point_count(&self, name: &str) -> Option<usize> {
        self.lock().ok()?.get(name).map(|c| c.points.len())
    }

    /// Copy of one stored point.
    pub fn point(&self, name: &str, id: u64) -> Option<PointRecord> {
        self.lock().ok()?.get(name)?.points.get(&id).cloned()
    }

    /// Vector space `name` was created with.
    pub fn space(&self, name: &str) -> Option<VectorSpace> {
        self.lock().ok()?.get(name).map(|c| c.space)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Collection>>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    fn create_sync(&self, name: &str, space: VectorSpace) -> Result<(), StoreError> {
        let mut cols = self.lock()?;
        if cols.contains_key(name) {
            return Err(StoreError::AlreadyExists {
                collection: name.to_string(),
                detail: format!("Collection `{name}` already exists!"),
            });
        }
        cols.insert(
            name.to_string(),
            Collection {
                space,
                points: BTreeMap::new(),
            },
        );
        info!(
            "Created in-memory collection '{}' size={} distance={:?}",
            name, space.size, space.distance
        );
        Ok(())
    }

    fn upsert_sync(&self, name: &str, points: Vec<PointRecord>) -> Result<u64, StoreError> {
        let mut cols = self.lock()?;
        let col = cols
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        if let Some(bad) = points.iter().find(|p| p.vector.len() != col.space.size) {
            return Err(StoreError::VectorSizeMismatch {
                got: bad.vector.len(),
                want: col.space.size,
            });
        }

        let count = points.len() as u64;
        for p in points {
            col.points.insert(p.id, p);
        }
        debug!("Upserted {} points into '{}'", count, name);
        Ok(count)
    }

    fn search_sync(
        &self,
        name: &str,
        vector: &[f32],
        top_k: u64,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let cols = self.lock()?;
        let col = cols
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        if vector.len() != col.space.size {
            return Err(StoreError::VectorSizeMismatch {
                got: vector.len(),
                want: col.space.size,
            });
        }

        let distance = col.space.distance;
        let mut hits: Vec<SearchHit> = col
            .points
            .values()
            .map(|p| SearchHit {
                id: Some(p.id),
                score: score(distance, vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        // Euclid scores are distances: smaller is closer.
        match distance {
            DistanceKind::Euclid => hits.sort_by(|a, b| a.score.total_cmp(&b.score)),
            _ => hits.sort_by(|a, b| b.score.total_cmp(&a.score)),
        }
        hits.truncate(top_k as usize);
        Ok(hits)
    }
}

impl VectorStore for InMemoryStore {
    fn create_collection<'a>(
        &'a self,
        name: &'a str,
        space: VectorSpace,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move { self.create_sync(name, space) })
    }

    fn collection_exists<'a>(&'a self, name: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move { Ok(self.lock()?.contains_key(name)) })
    }

    fn upsert<'a>(&'a self, name: &'a str, points: Vec<PointRecord>) -> StoreFuture<'a, u64> {
        Box::pin(async move { self.upsert_sync(name, points) })
    }

    fn search<'a>(
        &'a self,
        name: &'a str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> StoreFuture<'a, Vec<SearchHit>> {
        Box::pin(async move { self.search_sync(name, &vector, top_k) })
    }
}

fn score(distance: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match distance {
        DistanceKind::Dot => dot,
        DistanceKind::Cosine => {
            let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if na == 0.0 || nb == 0.0 {
                0.0
            } else {
                dot / (na * nb)
            }
        }
        DistanceKind::Euclid => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}
