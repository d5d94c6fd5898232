// Indexer module
// Keeps the vector index consistent with file create/rename/delete/edit events


use tracing::{debug, info, warn};

use crate::Result;
use crate::chunking::window_lines;
use crate::embeddings::EmbeddingClient;
use crate::index::{ItemMetadata, VectorIndex};

/// Embeds file contents in bounded line windows and applies file-system
/// events to the index via fetch-transform-`replace_all`.
pub struct WorkspaceIndexer {
    embedder: EmbeddingClient,
    chunk_lines: usize,
}

impl WorkspaceIndexer {
    #[inline]
    pub fn new(embedder: EmbeddingClient, chunk_lines: usize) -> Self {
        Self {
            embedder,
            chunk_lines,
        }
    }

    /// Embed `text` in line windows and insert one item per window. Windows
    /// whose embedding comes back empty are skipped rather than failing the
    /// whole file.
    #[inline]
    pub fn index_file(&self, index: &mut VectorIndex, path: &str, text: &str) -> Result<usize> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let windows = window_lines(&lines, self.chunk_lines);

        let mut inserted = 0;
        for window in windows {
            let content = window.join("\n");
            if content.trim().is_empty() {
                continue;
            }

            let vector = self.embedder.embed(&content);
            if vector.is_empty() {
                warn!("Skipping window of {} (embedding unavailable)", path);
                continue;
            }

            index.insert(
                vector,
                ItemMetadata {
                    file_path: path.to_string(),
                    content,
                },
            )?;
            inserted += 1;
        }

        info!("Indexed {} window(s) for {}", inserted, path);
        Ok(inserted)
    }

    /// Drop all items for `path`, then index the new contents.
    #[inline]
    pub fn reindex_file(&self, index: &mut VectorIndex, path: &str, text: &str) -> Result<usize> {
        self.handle_delete(index, path)?;
        self.index_file(index, path, text)
    }

    /// Rewrite the `file_path` of every item for `old` to `new`.
    #[inline]
    pub fn handle_rename(&self, index: &mut VectorIndex, old: &str, new: &str) -> Result<()> {
        let items = index.items()?;
        let mut renamed = 0;

        let updated = items
            .into_iter()
            .map(|mut item| {
                if item.metadata.file_path == old {
                    item.metadata.file_path = new.to_string();
                    renamed += 1;
                }
                item
            })
            .collect();

        index.replace_all(updated)?;
        debug!("Renamed {} item(s): {} -> {}", renamed, old, new);
        Ok(())
    }

    /// Remove every item for `path`.
    #[inline]
    pub fn handle_delete(&self, index: &mut VectorIndex, path: &str) -> Result<()> {
        let items = index.items()?;
        let before = items.len();

        let remaining: Vec<_> = items
            .into_iter()
            .filter(|item| item.metadata.file_path != path)
            .collect();
        let removed = before - remaining.len();

        index.replace_all(remaining)?;
        debug!("Removed {} item(s) for {}", removed, path);
        Ok(())
    }
}
