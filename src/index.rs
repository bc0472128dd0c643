//! Incremental directory indexing.
//!
//! Walks a repository, chunks and embeds files whose content hash
//! changed since the last run, deletes points belonging to the old
//! hash, and upserts the new ones. File reads mmap large files rather
//! than loading them into a `Vec`, the same 1MB threshold this crate's
//! reference file reader used before this module replaced it.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde_json::json;

use crate::chunk::chunk_file;
use crate::embed::Embedder;
use crate::error::Result;
use crate::sparse::lexical_sparse_vector;
use crate::store::{Distance, PayloadFilter, Point, VectorStore};
use crate::types::{Chunk, FileHashIndex};

/// Threshold above which a file is mmap'd rather than read into memory.
const MMAP_THRESHOLD: u64 = 1024 * 1024;
/// Files above this size are skipped entirely.
const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let len = fs::metadata(path)?.len();
    if len > MAX_FILE_SIZE {
        return Ok(Vec::new());
    }
    if len > MMAP_THRESHOLD {
        let file = fs::File::open(path)?;
        // SAFETY: the file is not concurrently truncated by this process;
        // mmap is read-only and the mapping is dropped before returning.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Ok(mmap.to_vec())
    } else {
        fs::read(path).map_err(Into::into)
    }
}

fn should_skip(path: &Path) -> bool {
    path.components().any(|c| matches!(c.as_os_str().to_str(), Some(".git" | "target" | "node_modules" | ".venv")))
}

fn walk(root: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if should_skip(&path) {
                continue;
            }
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                out.push(path);
            }
        }
    }
    out
}

/// Indexes files under `root` into `collection`, skipping files whose
/// content hash matches `known_hashes`, and returns the updated
/// `FileHashIndex` for the caller to persist for the next run.
pub async fn index_directory(
    root: &Path,
    collection: &str,
    known_hashes: &FileHashIndex,
    embedder: &Arc<dyn Embedder>,
    store: &Arc<dyn VectorStore>,
    max_chunk_size: usize,
) -> Result<FileHashIndex> {
    store.create_collection(collection, embedder.dimensions(), Distance::Cosine).await?;

    let files = walk(root);
    let mut updated: FileHashIndex = known_hashes.clone();

    // Chunking is CPU-bound and does not suspend; fan it out with rayon.
    let chunked: Vec<(String, String, Vec<Chunk>)> = files
        .par_iter()
        .filter_map(|path| {
            let rel = path.strip_prefix(root).ok()?.to_string_lossy().to_string();
            let bytes = read_file(path).ok()?;
            if bytes.is_empty() {
                return None;
            }
            let file_hash = Chunk::short_hash(&bytes);
            if known_hashes.get(&rel) == Some(&file_hash) {
                return None;
            }
            let chunks = chunk_file(&rel, &bytes, max_chunk_size).ok()?;
            Some((rel, file_hash, chunks))
        })
        .collect();

    for (rel, file_hash, chunks) in chunked {
        if let Some(old_hash) = known_hashes.get(&rel) {
            store
                .delete_by_filter(collection, &PayloadFilter { field: "file_hash".into(), value: json!(old_hash) })
                .await?;
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let dense_vectors = embedder.embed_batch(&texts).await?;
        let mut points = Vec::with_capacity(chunks.len());
        for (chunk, dense) in chunks.into_iter().zip(dense_vectors) {
            let sparse = lexical_sparse_vector(&chunk.text);
            points.push(Point::from_chunk(&chunk, dense, sparse));
        }
        store.upsert(collection, points).await?;
        updated.insert(rel, file_hash);
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::fallback::FallbackEmbedder;
    use crate::store::memory::MemoryStore;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn indexes_new_files_and_records_their_hash() {
        let dir = tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("a.rs")).unwrap();
        writeln!(f, "fn hello() {{ println!(\"hi\"); }}").unwrap();

        let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::new(32));
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());

        let index = index_directory(dir.path(), "c", &FileHashIndex::new(), &embedder, &store, 2_000)
            .await
            .unwrap();

        assert_eq!(index.len(), 1);
        assert!(store.stats("c").await.unwrap().points_count > 0);
    }

    #[tokio::test]
    async fn reindexing_unchanged_files_is_a_no_op() {
        let dir = tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("a.rs")).unwrap();
        writeln!(f, "fn hello() {{}}").unwrap();

        let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::new(32));
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());

        let first = index_directory(dir.path(), "c", &FileHashIndex::new(), &embedder, &store, 2_000)
            .await
            .unwrap();
        let before = store.stats("c").await.unwrap().points_count;
        let second = index_directory(dir.path(), "c", &first, &embedder, &store, 2_000).await.unwrap();
        let after = store.stats("c").await.unwrap().points_count;

        assert_eq!(first, second);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn changed_file_content_replaces_old_chunks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.rs");
        fs::write(&path, "fn one() {}").unwrap();

        let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::new(32));
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());

        let first = index_directory(dir.path(), "c", &FileHashIndex::new(), &embedder, &store, 2_000)
            .await
            .unwrap();

        fs::write(&path, "fn one() {}\nfn two() {}").unwrap();
        let second = index_directory(dir.path(), "c", &first, &embedder, &store, 2_000).await.unwrap();

        assert_ne!(first.get("a.rs"), second.get("a.rs"));
        assert_eq!(store.stats("c").await.unwrap().points_count, 2);
    }

    #[tokio::test]
    async fn skips_vcs_and_dependency_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "fn x() {}").unwrap();

        let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::new(32));
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        let index = index_directory(dir.path(), "c", &FileHashIndex::new(), &embedder, &store, 2_000)
            .await
            .unwrap();
        assert!(index.is_empty());
    }
}
