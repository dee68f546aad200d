//! Snapshot persistence: the whole tree serialized as one JSON blob under
//! the data directory, file contents inline. `load(save(tree))` round-trips
//! names, contents, structure, and timestamps to second precision.

use std::collections::HashMap;
use std::fs as hostfs;

use serde::{Deserialize, Serialize};

use super::error::{FsError, FsResult};
use super::node::{DirNode, FileNode, NodeId};
use super::tree::{FsTree, FS_OWNER};
use crate::memory::{MemToken, MemoryPool};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileBlob {
    name: String,
    content: String,
    created_at: i64,
    modified_at: i64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirBlob {
    name: String,
    created_at: i64,
    modified_at: i64,
    files: Vec<FileBlob>,
    subfolders: Vec<DirBlob>,
}

fn blob_path(tree: &FsTree, name: &str) -> std::path::PathBuf {
    let file = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    };
    tree.data_dir.join(file)
}

impl FsTree {
    /// Serialize the entire tree to `<data-dir>/<name>.json`.
    pub fn save_to_disk(&self, pool: &MemoryPool, name: &str) -> FsResult {
        let blob = self.to_blob(pool, self.root())?;
        hostfs::create_dir_all(&self.data_dir).map_err(|_| FsError::Io)?;
        let text = serde_json::to_string_pretty(&blob).map_err(|_| FsError::Io)?;
        hostfs::write(blob_path(self, name), text).map_err(|_| FsError::Io)?;
        log::info!("Storage saved to snapshot '{}'", name);
        Ok(())
    }

    /// Replace the current tree with the snapshot called `name` and reset
    /// the cursor to the new root. The current tree is only discarded once
    /// the snapshot has been fully rebuilt, so a failed load changes
    /// nothing.
    pub fn load_from_disk(&mut self, pool: &mut MemoryPool, name: &str) -> FsResult {
        let path = blob_path(self, name);
        if !path.exists() {
            log::error!("Snapshot not found: {}", path.display());
            return Err(FsError::NotFound);
        }
        let text = hostfs::read_to_string(&path).map_err(|_| FsError::Io)?;
        let blob: DirBlob = serde_json::from_str(&text).map_err(|_| FsError::Io)?;

        let mut builder = TreeBuilder::new();
        match builder.build(pool, &blob, None) {
            Ok(root) => {
                let TreeBuilder { dirs, files, next_id, .. } = builder;
                self.install(dirs, files, root, next_id, pool);
                log::info!("Storage loaded from snapshot '{}'", name);
                Ok(())
            }
            Err(e) => {
                builder.discard(pool);
                Err(e)
            }
        }
    }

    /// Names of the snapshots available in the data directory.
    pub fn list_data_files(&self) -> FsResult<Vec<String>> {
        let entries = hostfs::read_dir(&self.data_dir).map_err(|_| FsError::NotFound)?;
        let mut names = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        if names.is_empty() {
            return Err(FsError::NotFound);
        }
        names.sort();
        Ok(names)
    }

    fn to_blob(&self, pool: &MemoryPool, id: NodeId) -> FsResult<DirBlob> {
        let dir = self.node_dir(id).ok_or(FsError::NotFound)?;
        let mut files = Vec::new();
        for file_id in &dir.files {
            let file = self.node_file(*file_id).ok_or(FsError::NotFound)?;
            let content = match file.token {
                Some(token) => {
                    let bytes = pool.read(token).ok_or(FsError::Io)?;
                    String::from_utf8_lossy(&bytes).into_owned()
                }
                None => String::new(),
            };
            files.push(FileBlob {
                name: file.name.clone(),
                content,
                created_at: file.created_at,
                modified_at: file.modified_at,
            });
        }
        let mut subfolders = Vec::new();
        for sub in &dir.dirs {
            subfolders.push(self.to_blob(pool, *sub)?);
        }
        Ok(DirBlob {
            name: dir.name.clone(),
            created_at: dir.created_at,
            modified_at: dir.modified_at,
            files,
            subfolders,
        })
    }
}

/// Rebuilds an arena from a blob, tracking the pool tokens it allocated so
/// a failed load can hand them all back.
struct TreeBuilder {
    dirs: HashMap<NodeId, DirNode>,
    files: HashMap<NodeId, FileNode>,
    next_id: u64,
    tokens: Vec<MemToken>,
}

impl TreeBuilder {
    fn new() -> Self {
        TreeBuilder {
            dirs: HashMap::new(),
            files: HashMap::new(),
            next_id: 0,
            tokens: Vec::new(),
        }
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn build(
        &mut self,
        pool: &mut MemoryPool,
        blob: &DirBlob,
        parent: Option<NodeId>,
    ) -> FsResult<NodeId> {
        let id = self.alloc_id();
        let mut node = DirNode::new(&blob.name, parent);
        node.created_at = blob.created_at;
        node.modified_at = blob.modified_at;

        for fb in &blob.files {
            let body = fb.content.as_bytes();
            let token = if body.is_empty() {
                None
            } else {
                let t = pool.allocate(body.len(), FS_OWNER).ok_or(FsError::OutOfMemory)?;
                pool.write(t, body);
                self.tokens.push(t);
                Some(t)
            };
            let file_id = self.alloc_id();
            self.files.insert(file_id, FileNode {
                name: fb.name.clone(),
                parent: id,
                token,
                size: body.len(),
                created_at: fb.created_at,
                modified_at: fb.modified_at,
            });
            node.files.push(file_id);
        }

        for sub in &blob.subfolders {
            let sub_id = self.build(pool, sub, Some(id))?;
            node.dirs.push(sub_id);
        }

        self.dirs.insert(id, node);
        Ok(id)
    }

    fn discard(self, pool: &mut MemoryPool) {
        for token in self.tokens {
            pool.deallocate(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn setup(dir: &tempfile::TempDir) -> (FsTree, MemoryPool) {
        (
            FsTree::new(PathBuf::from(dir.path())),
            MemoryPool::new(64 * 1024),
        )
    }

    #[test]
    fn save_and_load_round_trips_the_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut fs, mut pool) = setup(&tmp);

        fs.make_dir("docs").unwrap();
        fs.create_file("docs/a.txt").unwrap();
        fs.write_file(&mut pool, "docs/a.txt", "hello").unwrap();
        fs.make_dir("docs/nested").unwrap();
        fs.create_file("empty").unwrap();
        let listing_before = fs.list_dir("docs").unwrap();

        fs.save_to_disk(&pool, "snap").unwrap();

        // mutate, then restore
        fs.change_dir("docs").unwrap();
        fs.delete_file(&mut pool, "a.txt").unwrap();
        fs.load_from_disk(&mut pool, "snap").unwrap();

        assert_eq!(fs.working_dir(), "/");
        assert_eq!(fs.read_file(&pool, "docs/a.txt").unwrap(), "hello\n");
        assert_eq!(fs.read_file(&pool, "empty").unwrap(), "");
        assert_eq!(fs.list_dir("docs").unwrap(), listing_before);
    }

    #[test]
    fn load_accounts_bodies_in_the_pool() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut fs, mut pool) = setup(&tmp);

        fs.create_file("f").unwrap();
        fs.write_file(&mut pool, "f", "0123456789").unwrap();
        let used = pool.used();
        fs.save_to_disk(&pool, "snap").unwrap();

        fs.reset(&mut pool);
        assert_eq!(pool.used(), 0);
        fs.load_from_disk(&mut pool, "snap").unwrap();
        assert_eq!(pool.used(), used);
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut fs, mut pool) = setup(&tmp);
        assert_eq!(fs.load_from_disk(&mut pool, "nope"), Err(FsError::NotFound));
    }

    #[test]
    fn failed_load_leaves_current_tree_intact() {
        let tmp = tempfile::tempdir().unwrap();
        let mut fs = FsTree::new(PathBuf::from(tmp.path()));
        let mut pool = MemoryPool::new(32);

        fs.create_file("keep").unwrap();
        fs.write_file(&mut pool, "keep", "abc").unwrap();
        fs.save_to_disk(&pool, "snap").unwrap();

        // shrink the pool's headroom so the load cannot fit the body again
        let hog = pool.allocate(26, crate::process::Pid(42)).unwrap();
        assert_eq!(fs.load_from_disk(&mut pool, "snap"), Err(FsError::OutOfMemory));
        assert_eq!(fs.read_file(&pool, "keep").unwrap(), "abc\n");

        pool.deallocate(hog);
    }

    #[test]
    fn list_data_files_reports_snapshots() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut fs, mut pool) = setup(&tmp);

        assert_eq!(fs.list_data_files(), Err(FsError::NotFound));

        fs.create_file("f").unwrap();
        fs.write_file(&mut pool, "f", "x").unwrap();
        fs.save_to_disk(&pool, "one").unwrap();
        fs.save_to_disk(&pool, "two").unwrap();

        assert_eq!(fs.list_data_files().unwrap(), vec!["one", "two"]);
    }
}
