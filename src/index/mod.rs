// Vector index module
// Persisted (vector, metadata) store with nearest-neighbor query over a
// single JSON-serializable snapshot


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{AssistError, Result};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemMetadata {
    /// Path of the file the embedded content came from
    pub file_path: String,
    /// The embedded text content
    pub content: String,
}

/// A single stored embedding with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorItem {
    /// Unique identifier, generated on insert
    pub id: String,
    /// The embedding vector; fixed dimensionality per index instance
    pub vector: Vec<f32>,
    pub metadata: ItemMetadata,
}

/// Index-level settings carried inside the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataConfig {
    pub distance_metric: String,
    pub saved_at: DateTime<Utc>,
}

impl Default for MetadataConfig {
    #[inline]
    fn default() -> Self {
        Self {
            distance_metric: "cosine".to_string(),
            saved_at: Utc::now(),
        }
    }
}

/// The sole persisted representation of the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSnapshot {
    pub version: u32,
    pub metadata_config: MetadataConfig,
    pub items: Vec<VectorItem>,
}

/// Result of a nearest-neighbor query. Scores may be negative; consumers
/// normalize via absolute value before thresholding.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub item: VectorItem,
    pub score: f32,
}

/// Vector store backed by a JSON snapshot file. All operations fail with
/// `IndexNotReady` until `create_if_absent` has run.
#[derive(Debug)]
pub struct VectorIndex {
    path: PathBuf,
    items: Option<Vec<VectorItem>>,
}

impl VectorIndex {
    /// Create a handle for the index persisted at `path`. No storage is
    /// touched until `create_if_absent`.
    #[inline]
    pub fn new(path: PathBuf) -> Self {
        Self { path, items: None }
    }

    /// Idempotently create the persistent storage location, loading any
    /// existing data. A corrupt persisted file is logged and treated as
    /// empty rather than propagated.
    #[inline]
    pub fn create_if_absent(&mut self) -> Result<()> {
        if self.items.is_some() {
            return Ok(());
        }

        if self.path.exists() {
            self.items = Some(self.load_existing());
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.items = Some(Vec::new());
        self.persist()?;

        info!("Created vector index at {}", self.path.display());
        Ok(())
    }

    fn load_existing(&self) -> Vec<VectorItem> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Failed to read index file {}, starting empty: {}",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<IndexSnapshot>(&content) {
            Ok(snapshot) => {
                debug!(
                    "Loaded {} items from {}",
                    snapshot.items.len(),
                    self.path.display()
                );
                snapshot.items
            }
            Err(e) => {
                warn!(
                    "Corrupt index file {}, starting empty: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn ready(&self) -> Result<&Vec<VectorItem>> {
        self.items.as_ref().ok_or_else(|| {
            AssistError::IndexNotReady("index accessed before create_if_absent".to_string())
        })
    }

    fn ready_mut(&mut self) -> Result<&mut Vec<VectorItem>> {
        self.items.as_mut().ok_or_else(|| {
            AssistError::IndexNotReady("index accessed before create_if_absent".to_string())
        })
    }

    /// Append a new item and return its generated id. Content is not
    /// deduplicated; the vector must match the index dimensionality.
    #[inline]
    pub fn insert(&mut self, vector: Vec<f32>, metadata: ItemMetadata) -> Result<String> {
        if vector.is_empty() {
            return Err(AssistError::Format(
                "cannot insert an empty vector".to_string(),
            ));
        }

        let items = self.ready()?;
        if let Some(existing) = items.first() {
            if existing.vector.len() != vector.len() {
                return Err(AssistError::Format(format!(
                    "vector dimension {} does not match index dimension {}",
                    vector.len(),
                    existing.vector.len()
                )));
            }
        }

        let id = Uuid::new_v4().to_string();
        self.ready_mut()?.push(VectorItem {
            id: id.clone(),
            vector,
            metadata,
        });
        self.persist()?;

        debug!("Inserted vector item {}", id);
        Ok(id)
    }

    /// Nearest-neighbor query ordered by descending similarity. An empty
    /// query vector yields an empty result set rather than an error.
    #[inline]
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        let items = self.ready()?;

        if vector.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<QueryResult> = items
            .iter()
            .filter(|item| item.vector.len() == vector.len())
            .map(|item| QueryResult {
                item: item.clone(),
                score: cosine_similarity(&item.vector, vector),
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        Ok(results)
    }

    /// Delete the item with the given id, if present.
    #[inline]
    pub fn delete_by_id(&mut self, id: &str) -> Result<()> {
        let items = self.ready_mut()?;
        let before = items.len();
        items.retain(|item| item.id != id);

        if items.len() < before {
            debug!("Deleted vector item {}", id);
            self.persist()?;
        }
        Ok(())
    }

    /// Replace all items at once. Used when filenames change or files are
    /// deleted: callers fetch the item list, transform it in memory, and
    /// write the result back.
    #[inline]
    pub fn replace_all(&mut self, items: Vec<VectorItem>) -> Result<()> {
        validate_items(&items)?;

        let count = items.len();
        *self.ready_mut()? = items;
        self.persist()?;

        debug!("Replaced index contents with {} items", count);
        Ok(())
    }

    /// Clone of the current item list, for bulk-transform callers.
    #[inline]
    pub fn items(&self) -> Result<Vec<VectorItem>> {
        Ok(self.ready()?.clone())
    }

    /// Full serializable snapshot of the current state.
    #[inline]
    pub fn snapshot(&self) -> Result<IndexSnapshot> {
        Ok(IndexSnapshot {
            version: SNAPSHOT_VERSION,
            metadata_config: MetadataConfig::default(),
            items: self.ready()?.clone(),
        })
    }

    /// Replace all in-memory state from a snapshot atomically: on any
    /// validation failure the original state is left untouched.
    #[inline]
    pub fn restore(&mut self, snapshot: IndexSnapshot) -> Result<()> {
        self.ready()?;
        validate_items(&snapshot.items)?;

        self.items = Some(snapshot.items);
        self.persist()?;

        info!("Restored index from snapshot");
        Ok(())
    }

    /// Empty the persisted state, retaining the file itself.
    #[inline]
    pub fn clear(&mut self) -> Result<()> {
        self.ready_mut()?.clear();
        self.persist()?;

        info!("Cleared vector index");
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let snapshot = self.snapshot()?;
        let content = serde_json::to_string(&snapshot)
            .map_err(|e| AssistError::Format(format!("failed to serialize snapshot: {}", e)))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

fn validate_items(items: &[VectorItem]) -> Result<()> {
    let mut ids = HashSet::with_capacity(items.len());
    for item in items {
        if !ids.insert(item.id.as_str()) {
            return Err(AssistError::CorruptState(format!(
                "duplicate item id {}",
                item.id
            )));
        }
    }

    if let Some(first) = items.first() {
        let dim = first.vector.len();
        if items.iter().any(|item| item.vector.len() != dim) {
            return Err(AssistError::CorruptState(
                "items have mixed vector dimensions".to_string(),
            ));
        }
    }

    Ok(())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
