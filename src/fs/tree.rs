use std::collections::HashMap;
use std::path::PathBuf;

use super::error::{FsError, FsResult};
use super::node::{format_time, now_secs, DirNode, FileNode, NodeId};
use super::path;
use crate::memory::MemoryPool;
use crate::process::Pid;

/// File bodies are accounted to the kernel, not to any user process.
pub(super) const FS_OWNER: Pid = Pid(0);

/// The in-memory filesystem tree.
///
/// Nodes live in two id-keyed arenas (directories and files); directories
/// hold insertion-ordered child id lists and every non-root node points back
/// at its parent. A single cursor (`cwd`) is the working directory all
/// relative paths resolve against.
pub struct FsTree {
    dirs: HashMap<NodeId, DirNode>,
    files: HashMap<NodeId, FileNode>,
    next_id: u64,
    root: NodeId,
    cwd: NodeId,
    pub(super) data_dir: PathBuf,
}

impl FsTree {
    pub fn new(data_dir: PathBuf) -> Self {
        let root = NodeId(0);
        let mut dirs = HashMap::new();
        dirs.insert(root, DirNode::new("/", None));
        FsTree {
            dirs,
            files: HashMap::new(),
            next_id: 1,
            root,
            cwd: root,
            data_dir,
        }
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(super) fn root(&self) -> NodeId {
        self.root
    }

    fn dir(&self, id: NodeId) -> FsResult<&DirNode> {
        self.dirs.get(&id).ok_or(FsError::NotFound)
    }

    fn dir_mut(&mut self, id: NodeId) -> FsResult<&mut DirNode> {
        self.dirs.get_mut(&id).ok_or(FsError::NotFound)
    }

    fn file(&self, id: NodeId) -> FsResult<&FileNode> {
        self.files.get(&id).ok_or(FsError::NotFound)
    }

    fn file_mut(&mut self, id: NodeId) -> FsResult<&mut FileNode> {
        self.files.get_mut(&id).ok_or(FsError::NotFound)
    }

    fn find_subdir(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        let d = self.dirs.get(&dir)?;
        d.dirs
            .iter()
            .copied()
            .find(|id| self.dirs.get(id).map(|s| s.name == name).unwrap_or(false))
    }

    fn find_file(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        let d = self.dirs.get(&dir)?;
        d.files
            .iter()
            .copied()
            .find(|id| self.files.get(id).map(|f| f.name == name).unwrap_or(false))
    }

    fn touch_dir(&mut self, id: NodeId) {
        if let Some(d) = self.dirs.get_mut(&id) {
            d.modified_at = now_secs();
        }
    }

    /// Resolve a path to its parent directory and final name.
    ///
    /// `..` above the root clamps to the root here; only `change_dir`
    /// treats that as an error. A final `.` or `..` segment yields an
    /// empty name, which the callers reject where a real name is needed.
    fn resolve_parent(&self, p: &str) -> FsResult<(NodeId, String)> {
        if p.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        let absolute = p.starts_with('/');
        let mut cur = if absolute { self.root } else { self.cwd };

        let parts = path::split(p);
        if parts.is_empty() {
            // "/" or a run of slashes
            return if absolute {
                Ok((self.root, String::new()))
            } else {
                Err(FsError::InvalidArgument)
            };
        }

        for seg in &parts[..parts.len() - 1] {
            match *seg {
                "." => {}
                ".." => {
                    if let Some(parent) = self.dir(cur)?.parent {
                        cur = parent;
                    }
                }
                name => {
                    cur = self.find_subdir(cur, name).ok_or(FsError::NotFound)?;
                }
            }
        }

        match parts[parts.len() - 1] {
            ".." => {
                let parent = self.dir(cur)?.parent.unwrap_or(cur);
                Ok((parent, String::new()))
            }
            "." => Ok((cur, String::new())),
            name => Ok((cur, name.to_string())),
        }
    }

    /// Validate a raw path and resolve it to (parent, name), requiring a
    /// usable final name.
    fn resolve_named(&self, p: &str) -> FsResult<(NodeId, String)> {
        if path::is_invalid_name(p) {
            return Err(FsError::InvalidArgument);
        }
        let (dir, name) = self.resolve_parent(p)?;
        if path::is_invalid_name(&name) {
            return Err(FsError::InvalidArgument);
        }
        Ok((dir, name))
    }

    /// True if `node` is `ancestor` or lives anywhere below it.
    fn is_descendant_or_same(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == ancestor {
                return true;
            }
            match self.dirs.get(&cur).and_then(|d| d.parent) {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    // ---- file operations ----

    pub fn file_exists(&self, p: &str) -> FsResult {
        let (dir, name) = self.resolve_named(p)?;
        match self.find_file(dir, &name) {
            Some(_) => Ok(()),
            None => Err(FsError::NotFound),
        }
    }

    pub fn create_file(&mut self, p: &str) -> FsResult {
        let (dir, name) = self.resolve_named(p)?;
        if self.find_file(dir, &name).is_some() {
            log::error!("File already exists: {}", p);
            return Err(FsError::AlreadyExists);
        }

        let now = now_secs();
        let id = self.alloc_id();
        self.files.insert(id, FileNode {
            name,
            parent: dir,
            token: None,
            size: 0,
            created_at: now,
            modified_at: now,
        });
        let d = self.dir_mut(dir)?;
        d.files.push(id);
        d.modified_at = now;
        log::info!("Created file: {}", p);
        Ok(())
    }

    /// Update the timestamp of an existing file, or create it when absent.
    pub fn touch_file(&mut self, p: &str) -> FsResult {
        let (dir, name) = self.resolve_named(p)?;
        if let Some(id) = self.find_file(dir, &name) {
            let now = now_secs();
            self.file_mut(id)?.modified_at = now;
            self.touch_dir(dir);
            log::info!("File already exists, timestamp updated: {}", p);
            return Ok(());
        }
        self.create_file(p)
    }

    pub fn delete_file(&mut self, pool: &mut MemoryPool, p: &str) -> FsResult {
        let (dir, name) = self.resolve_named(p)?;
        let id = self.find_file(dir, &name).ok_or(FsError::NotFound)?;

        if let Some(token) = self.file(id)?.token {
            if !pool.deallocate(token) {
                log::error!("Failed to release memory for file: {}", name);
                return Err(FsError::Io);
            }
        }
        self.files.remove(&id);
        let d = self.dir_mut(dir)?;
        d.files.retain(|f| *f != id);
        d.modified_at = now_secs();
        log::info!("Deleted file: {}", p);
        Ok(())
    }

    /// Replace the whole body of a file with `content` plus a trailing
    /// newline. The new body is allocated before the old one is released,
    /// so a failed write leaves the file unchanged.
    pub fn write_file(&mut self, pool: &mut MemoryPool, p: &str, content: &str) -> FsResult {
        let (dir, name) = self.resolve_named(p)?;
        let id = self.find_file(dir, &name).ok_or(FsError::NotFound)?;

        let body = format!("{}\n", content);
        self.replace_body(pool, id, body.as_bytes())?;

        let now = now_secs();
        self.file_mut(id)?.modified_at = now;
        self.touch_dir(dir);
        log::info!("Wrote to file: {}", p);
        Ok(())
    }

    pub fn read_file(&self, pool: &MemoryPool, p: &str) -> FsResult<String> {
        let (dir, name) = self.resolve_named(p)?;
        let id = self.find_file(dir, &name).ok_or(FsError::NotFound)?;
        let file = self.file(id)?;
        match file.token {
            Some(token) => {
                let bytes = pool.read(token).ok_or(FsError::Io)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            None => Ok(String::new()),
        }
    }

    /// Append `suffix` to the existing body (read-modify-write).
    pub fn edit_file(&mut self, pool: &mut MemoryPool, p: &str, suffix: &str) -> FsResult {
        let (dir, name) = self.resolve_named(p)?;
        let id = self.find_file(dir, &name).ok_or(FsError::NotFound)?;

        let mut body = match self.file(id)?.token {
            Some(token) => pool.read(token).ok_or(FsError::Io)?,
            None => Vec::new(),
        };
        body.extend_from_slice(suffix.as_bytes());
        self.replace_body(pool, id, &body)?;

        let now = now_secs();
        self.file_mut(id)?.modified_at = now;
        self.touch_dir(dir);
        log::info!("Edited file: {}", p);
        Ok(())
    }

    /// Swap in a new body for `id`: allocate first, free the old token
    /// after, keep the token-iff-nonempty invariant.
    fn replace_body(&mut self, pool: &mut MemoryPool, id: NodeId, body: &[u8]) -> FsResult {
        let new_token = if body.is_empty() {
            None
        } else {
            let token = pool.allocate(body.len(), FS_OWNER).ok_or_else(|| {
                log::error!("Out of memory for file body ({} bytes)", body.len());
                FsError::OutOfMemory
            })?;
            pool.write(token, body);
            Some(token)
        };

        let file = self.file_mut(id)?;
        let old = file.token.take();
        file.token = new_token;
        file.size = body.len();
        if let Some(old) = old {
            pool.deallocate(old);
        }
        Ok(())
    }

    /// Copy a file. When `dest` names an existing directory the source is
    /// copied into it under its own name; otherwise a new file called
    /// `dest`'s final segment is created under `dest`'s parent.
    pub fn copy_file(&mut self, pool: &mut MemoryPool, src: &str, dest: &str) -> FsResult {
        let (sdir, sname) = self.resolve_named(src)?;
        let src_id = self.find_file(sdir, &sname).ok_or(FsError::NotFound)?;
        let (ddir, dname) = self.resolve_named(dest)?;

        let (target_dir, new_name) = match self.find_subdir(ddir, &dname) {
            Some(into) => (into, sname.clone()),
            None => (ddir, dname),
        };
        if self.find_file(target_dir, &new_name).is_some() {
            log::error!("File already exists: {}", new_name);
            return Err(FsError::AlreadyExists);
        }

        let body = match self.file(src_id)?.token {
            Some(token) => pool.read(token).ok_or(FsError::Io)?,
            None => Vec::new(),
        };
        let token = if body.is_empty() {
            None
        } else {
            let t = pool.allocate(body.len(), FS_OWNER).ok_or(FsError::OutOfMemory)?;
            pool.write(t, &body);
            Some(t)
        };

        let now = now_secs();
        let id = self.alloc_id();
        self.files.insert(id, FileNode {
            name: new_name,
            parent: target_dir,
            token,
            size: body.len(),
            created_at: now,
            modified_at: now,
        });
        let d = self.dir_mut(target_dir)?;
        d.files.push(id);
        d.modified_at = now;
        log::info!("Copied file '{}' to '{}'", src, dest);
        Ok(())
    }

    /// Move (or rename) a file; same destination disambiguation as copy.
    pub fn move_file(&mut self, src: &str, dest: &str) -> FsResult {
        let (sdir, sname) = self.resolve_named(src)?;
        let src_id = self.find_file(sdir, &sname).ok_or(FsError::NotFound)?;
        let (ddir, dname) = self.resolve_named(dest)?;

        let (target_dir, new_name, renamed) = match self.find_subdir(ddir, &dname) {
            Some(into) => (into, sname.clone(), false),
            None => (ddir, dname, true),
        };
        if self.find_file(target_dir, &new_name).is_some() {
            log::error!("File already exists: {}", new_name);
            return Err(FsError::AlreadyExists);
        }

        let now = now_secs();
        {
            let d = self.dir_mut(sdir)?;
            d.files.retain(|f| *f != src_id);
            d.modified_at = now;
        }
        {
            let file = self.file_mut(src_id)?;
            file.parent = target_dir;
            file.name = new_name;
            if renamed {
                file.modified_at = now;
            }
        }
        let d = self.dir_mut(target_dir)?;
        d.files.push(src_id);
        d.modified_at = now;
        log::info!("Moved file '{}' to '{}'", src, dest);
        Ok(())
    }

    // ---- directory operations ----

    pub fn make_dir(&mut self, p: &str) -> FsResult {
        let (dir, name) = self.resolve_named(p)?;
        if self.find_subdir(dir, &name).is_some() {
            log::error!("Directory already exists: {}", p);
            return Err(FsError::AlreadyExists);
        }

        let id = self.alloc_id();
        self.dirs.insert(id, DirNode::new(&name, Some(dir)));
        let d = self.dir_mut(dir)?;
        d.dirs.push(id);
        d.modified_at = now_secs();
        log::info!("Created directory: {}", p);
        Ok(())
    }

    /// Remove a directory and everything below it, releasing every file
    /// body back to the pool. If the cursor is inside the removed subtree
    /// it jumps to the removed directory's parent.
    pub fn remove_dir(&mut self, pool: &mut MemoryPool, p: &str) -> FsResult {
        let (dir, name) = self.resolve_named(p)?;
        let target = self.find_subdir(dir, &name).ok_or(FsError::NotFound)?;

        if self.is_descendant_or_same(target, self.cwd) {
            self.cwd = dir;
        }

        self.delete_subtree(pool, target)?;
        let d = self.dir_mut(dir)?;
        d.dirs.retain(|s| *s != target);
        d.modified_at = now_secs();
        log::info!("Removed directory: {}", p);
        Ok(())
    }

    fn delete_subtree(&mut self, pool: &mut MemoryPool, id: NodeId) -> FsResult {
        let (sub_dirs, sub_files) = {
            let d = self.dir(id)?;
            (d.dirs.clone(), d.files.clone())
        };
        for file_id in sub_files {
            if let Some(file) = self.files.remove(&file_id) {
                if let Some(token) = file.token {
                    if !pool.deallocate(token) {
                        log::error!("Failed to release memory for file: {}", file.name);
                        return Err(FsError::Io);
                    }
                }
            }
        }
        for sub in sub_dirs {
            self.delete_subtree(pool, sub)?;
        }
        self.dirs.remove(&id);
        Ok(())
    }

    /// Move the working-directory cursor. `..` at the root is `AtRoot`.
    pub fn change_dir(&mut self, p: &str) -> FsResult {
        if path::is_invalid_name(p) {
            return Err(FsError::InvalidArgument);
        }
        if p == "/" {
            self.cwd = self.root;
            return Ok(());
        }

        let absolute = p.starts_with('/');
        let mut cur = if absolute { self.root } else { self.cwd };
        for seg in path::split(p) {
            match seg {
                "." => {}
                ".." => match self.dir(cur)?.parent {
                    Some(parent) => cur = parent,
                    None => return Err(FsError::AtRoot),
                },
                name => {
                    cur = self.find_subdir(cur, name).ok_or_else(|| {
                        log::error!("Directory not found: {}", p);
                        FsError::NotFound
                    })?;
                }
            }
        }
        self.cwd = cur;
        Ok(())
    }

    /// List a directory: child directories first, then files, both in
    /// insertion order, rendered with timestamps (and sizes for files).
    pub fn list_dir(&self, p: &str) -> FsResult<Vec<String>> {
        let target = if p.is_empty() || p == "." {
            self.cwd
        } else if p == ".." {
            self.dir(self.cwd)?.parent.unwrap_or(self.cwd)
        } else {
            let (dir, name) = self.resolve_parent(p)?;
            if name.is_empty() {
                dir
            } else {
                self.find_subdir(dir, &name).ok_or(FsError::NotFound)?
            }
        };

        let d = self.dir(target)?;
        let mut entries = Vec::new();
        for id in &d.dirs {
            let sub = self.dir(*id)?;
            entries.push(format!(
                "[D] {} | created: {} | modified: {}",
                sub.name,
                format_time(sub.created_at),
                format_time(sub.modified_at)
            ));
        }
        for id in &d.files {
            let file = self.file(*id)?;
            entries.push(format!(
                "[F] {} | created: {} | modified: {} | size: {} bytes",
                file.name,
                format_time(file.created_at),
                format_time(file.modified_at),
                file.size
            ));
        }
        Ok(entries)
    }

    /// Render the cursor as a `/`-joined absolute path by walking parent
    /// back-references up to the root.
    pub fn working_dir(&self) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(self.cwd);
        while let Some(id) = cur {
            match self.dirs.get(&id) {
                Some(d) => {
                    if d.parent.is_some() {
                        parts.push(d.name.clone());
                    }
                    cur = d.parent;
                }
                None => break,
            }
        }
        if parts.is_empty() {
            return String::from("/");
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    pub fn copy_dir(&mut self, pool: &mut MemoryPool, src: &str, dest: &str) -> FsResult {
        let (sdir, sname) = self.resolve_named(src)?;
        let src_id = self.find_subdir(sdir, &sname).ok_or(FsError::NotFound)?;
        let (ddir, dname) = self.resolve_named(dest)?;

        let (target_dir, new_name) = match self.find_subdir(ddir, &dname) {
            Some(into) => (into, sname.clone()),
            None => (ddir, dname),
        };
        if self.find_subdir(target_dir, &new_name).is_some() {
            log::error!("Directory already exists: {}", new_name);
            return Err(FsError::AlreadyExists);
        }

        let copy = self.copy_subtree(pool, src_id, target_dir, &new_name)?;
        let d = self.dir_mut(target_dir)?;
        d.dirs.push(copy);
        d.modified_at = now_secs();
        log::info!("Copied directory '{}' to '{}'", src, dest);
        Ok(())
    }

    /// Deep-copy `src` as a child of `parent` called `name`. On allocation
    /// failure the partially built subtree is torn down again before the
    /// error propagates.
    fn copy_subtree(
        &mut self,
        pool: &mut MemoryPool,
        src: NodeId,
        parent: NodeId,
        name: &str,
    ) -> FsResult<NodeId> {
        let id = self.alloc_id();
        self.dirs.insert(id, DirNode::new(name, Some(parent)));

        let (src_dirs, src_files) = {
            let d = self.dir(src)?;
            (d.dirs.clone(), d.files.clone())
        };

        for file_id in src_files {
            let (fname, body) = {
                let file = self.file(file_id)?;
                let body = match file.token {
                    Some(token) => pool.read(token).ok_or(FsError::Io)?,
                    None => Vec::new(),
                };
                (file.name.clone(), body)
            };
            let token = if body.is_empty() {
                None
            } else {
                match pool.allocate(body.len(), FS_OWNER) {
                    Some(t) => {
                        pool.write(t, &body);
                        Some(t)
                    }
                    None => {
                        self.delete_subtree(pool, id)?;
                        return Err(FsError::OutOfMemory);
                    }
                }
            };
            let now = now_secs();
            let copy_id = self.alloc_id();
            self.files.insert(copy_id, FileNode {
                name: fname,
                parent: id,
                token,
                size: body.len(),
                created_at: now,
                modified_at: now,
            });
            self.dir_mut(id)?.files.push(copy_id);
        }

        for sub in src_dirs {
            let sub_name = self.dir(sub)?.name.clone();
            match self.copy_subtree(pool, sub, id, &sub_name) {
                Ok(copy) => self.dir_mut(id)?.dirs.push(copy),
                Err(e) => {
                    self.delete_subtree(pool, id)?;
                    return Err(e);
                }
            }
        }
        Ok(id)
    }

    /// Move a directory. Rejected when the destination sits inside the
    /// moved subtree (or is the subtree itself).
    pub fn move_dir(&mut self, src: &str, dest: &str) -> FsResult {
        let (sdir, sname) = self.resolve_named(src)?;
        let src_id = self.find_subdir(sdir, &sname).ok_or(FsError::NotFound)?;
        let (ddir, dname) = self.resolve_named(dest)?;

        let (target_dir, new_name, renamed) = match self.find_subdir(ddir, &dname) {
            Some(into) => (into, sname.clone(), false),
            None => (ddir, dname, true),
        };
        if self.is_descendant_or_same(src_id, target_dir) {
            log::error!("Cannot move '{}' to a subdirectory of itself, '{}'", sname, dest);
            return Err(FsError::InvalidArgument);
        }
        if self.find_subdir(target_dir, &new_name).is_some() {
            log::error!("Directory already exists: {}", new_name);
            return Err(FsError::AlreadyExists);
        }

        let now = now_secs();
        {
            let d = self.dir_mut(sdir)?;
            d.dirs.retain(|s| *s != src_id);
            d.modified_at = now;
        }
        {
            let moved = self.dir_mut(src_id)?;
            moved.parent = Some(target_dir);
            moved.name = new_name;
            if renamed {
                moved.modified_at = now;
            }
        }
        let d = self.dir_mut(target_dir)?;
        d.dirs.push(src_id);
        d.modified_at = now;
        log::info!("Moved directory '{}' to '{}'", src, dest);
        Ok(())
    }

    /// Drop the whole tree and start over with an empty root. Every file
    /// body goes back to the pool.
    pub fn reset(&mut self, pool: &mut MemoryPool) {
        for file in self.files.values() {
            if let Some(token) = file.token {
                pool.deallocate(token);
            }
        }
        self.files.clear();
        self.dirs.clear();
        let root = NodeId(0);
        self.dirs.insert(root, DirNode::new("/", None));
        self.next_id = 1;
        self.root = root;
        self.cwd = root;
        log::info!("Storage reset");
    }

    // ---- snapshot support (see snapshot.rs) ----

    pub(super) fn node_dir(&self, id: NodeId) -> Option<&DirNode> {
        self.dirs.get(&id)
    }

    pub(super) fn node_file(&self, id: NodeId) -> Option<&FileNode> {
        self.files.get(&id)
    }

    pub(super) fn install(
        &mut self,
        dirs: HashMap<NodeId, DirNode>,
        files: HashMap<NodeId, FileNode>,
        root: NodeId,
        next_id: u64,
        pool: &mut MemoryPool,
    ) {
        // Release the old tree's bodies before swapping the arenas in.
        for file in self.files.values() {
            if let Some(token) = file.token {
                pool.deallocate(token);
            }
        }
        self.dirs = dirs;
        self.files = files;
        self.root = root;
        self.cwd = root;
        self.next_id = next_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (FsTree, MemoryPool) {
        (FsTree::new(PathBuf::from("data")), MemoryPool::new(64 * 1024))
    }

    #[test]
    fn create_write_read_round_trip() {
        let (mut fs, mut pool) = setup();
        fs.create_file("story.txt").unwrap();
        fs.write_file(&mut pool, "story.txt", "Chapter 1").unwrap();
        assert_eq!(fs.read_file(&pool, "story.txt").unwrap(), "Chapter 1\n");
    }

    #[test]
    fn create_existing_file_collides() {
        let (mut fs, _) = setup();
        fs.create_file("a.txt").unwrap();
        assert_eq!(fs.create_file("a.txt"), Err(FsError::AlreadyExists));
    }

    #[test]
    fn edit_appends_verbatim() {
        let (mut fs, mut pool) = setup();
        fs.create_file("story.txt").unwrap();
        fs.write_file(&mut pool, "story.txt", "Chapter 1").unwrap();
        fs.edit_file(&mut pool, "story.txt", "Chapter 2\n").unwrap();
        assert_eq!(fs.read_file(&pool, "story.txt").unwrap(), "Chapter 1\nChapter 2\n");
    }

    #[test]
    fn read_of_empty_file_is_empty_string() {
        let (mut fs, _) = setup();
        let pool = MemoryPool::new(64);
        fs.create_file("empty").unwrap();
        assert_eq!(fs.read_file(&pool, "empty").unwrap(), "");
    }

    #[test]
    fn delete_then_exists_reports_not_found() {
        let (mut fs, mut pool) = setup();
        fs.create_file("f").unwrap();
        fs.delete_file(&mut pool, "f").unwrap();
        assert_eq!(fs.file_exists("f"), Err(FsError::NotFound));
    }

    #[test]
    fn write_failure_leaves_file_unchanged() {
        let mut fs = FsTree::new(PathBuf::from("data"));
        let mut pool = MemoryPool::new(16);
        fs.create_file("f").unwrap();
        fs.write_file(&mut pool, "f", "tiny").unwrap();

        // 32 bytes of content cannot fit next to the live 5-byte body
        let big = "x".repeat(32);
        assert_eq!(fs.write_file(&mut pool, "f", &big), Err(FsError::OutOfMemory));
        assert_eq!(fs.read_file(&pool, "f").unwrap(), "tiny\n");
        assert_eq!(pool.used(), 5);
    }

    #[test]
    fn file_bodies_return_to_the_pool() {
        let (mut fs, mut pool) = setup();
        fs.create_file("f").unwrap();
        fs.write_file(&mut pool, "f", "some data").unwrap();
        assert!(pool.used() > 0);
        fs.delete_file(&mut pool, "f").unwrap();
        assert_eq!(pool.used(), 0);
    }

    #[test]
    fn copy_into_directory_keeps_source_name() {
        let (mut fs, mut pool) = setup();
        fs.make_dir("sub").unwrap();
        fs.create_file("a.txt").unwrap();
        fs.write_file(&mut pool, "a.txt", "data").unwrap();

        fs.copy_file(&mut pool, "a.txt", "sub").unwrap();
        assert_eq!(fs.read_file(&pool, "sub/a.txt").unwrap(), "data\n");
        assert_eq!(fs.read_file(&pool, "a.txt").unwrap(), "data\n");
    }

    #[test]
    fn copy_then_delete_matches_move() {
        let (mut fs, mut pool) = setup();
        fs.create_file("src").unwrap();
        fs.write_file(&mut pool, "src", "payload").unwrap();

        fs.copy_file(&mut pool, "src", "dest").unwrap();
        fs.delete_file(&mut pool, "src").unwrap();

        assert_eq!(fs.file_exists("src"), Err(FsError::NotFound));
        assert_eq!(fs.read_file(&pool, "dest").unwrap(), "payload\n");
    }

    #[test]
    fn move_renames_across_directories() {
        let (mut fs, mut pool) = setup();
        fs.make_dir("a").unwrap();
        fs.create_file("a/f").unwrap();
        fs.write_file(&mut pool, "a/f", "v").unwrap();

        fs.move_file("a/f", "g").unwrap();
        assert_eq!(fs.file_exists("a/f"), Err(FsError::NotFound));
        assert_eq!(fs.read_file(&pool, "g").unwrap(), "v\n");
    }

    #[test]
    fn move_collision_is_rejected() {
        let (mut fs, _) = setup();
        fs.create_file("a").unwrap();
        fs.create_file("b").unwrap();
        assert_eq!(fs.move_file("a", "b"), Err(FsError::AlreadyExists));
        assert!(fs.file_exists("a").is_ok());
    }

    #[test]
    fn change_dir_at_root_returns_at_root() {
        let (mut fs, _) = setup();
        assert_eq!(fs.change_dir(".."), Err(FsError::AtRoot));
        assert_eq!(fs.working_dir(), "/");
    }

    #[test]
    fn change_dir_resolves_dot_and_dotdot() {
        let (mut fs, _) = setup();
        fs.make_dir("a").unwrap();
        fs.make_dir("a/b").unwrap();

        fs.change_dir("a/b").unwrap();
        assert_eq!(fs.working_dir(), "/a/b");
        fs.change_dir("..").unwrap();
        assert_eq!(fs.working_dir(), "/a");
        fs.change_dir("./b").unwrap();
        assert_eq!(fs.working_dir(), "/a/b");
        fs.change_dir("/").unwrap();
        assert_eq!(fs.working_dir(), "/");
    }

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let (mut fs, mut pool) = setup();
        fs.make_dir("home").unwrap();
        fs.change_dir("home").unwrap();
        fs.create_file("notes").unwrap();
        fs.write_file(&mut pool, "notes", "hi").unwrap();

        fs.change_dir("/").unwrap();
        assert_eq!(fs.read_file(&pool, "home/notes").unwrap(), "hi\n");
        assert_eq!(fs.read_file(&pool, "/home//notes").unwrap(), "hi\n");
    }

    #[test]
    fn list_dir_orders_dirs_then_files_by_insertion() {
        let (mut fs, _) = setup();
        fs.create_file("z.txt").unwrap();
        fs.make_dir("beta").unwrap();
        fs.make_dir("alpha").unwrap();
        fs.create_file("a.txt").unwrap();

        let entries = fs.list_dir("").unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries[0].starts_with("[D] beta"));
        assert!(entries[1].starts_with("[D] alpha"));
        assert!(entries[2].starts_with("[F] z.txt"));
        assert!(entries[3].starts_with("[F] a.txt"));
    }

    #[test]
    fn remove_dir_frees_bodies_and_resets_cursor() {
        let (mut fs, mut pool) = setup();
        fs.make_dir("a").unwrap();
        fs.make_dir("a/b").unwrap();
        fs.create_file("a/b/f").unwrap();
        fs.write_file(&mut pool, "a/b/f", "deep").unwrap();
        fs.change_dir("a/b").unwrap();

        fs.remove_dir(&mut pool, "/a").unwrap();
        assert_eq!(pool.used(), 0);
        assert_eq!(fs.working_dir(), "/");
        assert_eq!(fs.change_dir("a"), Err(FsError::NotFound));
    }

    #[test]
    fn move_dir_into_descendant_is_rejected() {
        let (mut fs, _) = setup();
        fs.make_dir("a").unwrap();
        fs.make_dir("a/b").unwrap();

        assert_eq!(fs.move_dir("a", "a/b/c"), Err(FsError::InvalidArgument));
        assert_eq!(fs.move_dir("a", "a"), Err(FsError::InvalidArgument));
        // tree unchanged
        fs.change_dir("a/b").unwrap();
    }

    #[test]
    fn copy_dir_is_recursive() {
        let (mut fs, mut pool) = setup();
        fs.make_dir("src").unwrap();
        fs.make_dir("src/inner").unwrap();
        fs.create_file("src/inner/f").unwrap();
        fs.write_file(&mut pool, "src/inner/f", "deep").unwrap();

        fs.copy_dir(&mut pool, "src", "twin").unwrap();
        assert_eq!(fs.read_file(&pool, "twin/inner/f").unwrap(), "deep\n");
        assert_eq!(fs.read_file(&pool, "src/inner/f").unwrap(), "deep\n");
    }

    #[test]
    fn move_dir_reparents_subtree() {
        let (mut fs, _) = setup();
        fs.make_dir("a").unwrap();
        fs.make_dir("dest").unwrap();
        fs.make_dir("a/inner").unwrap();

        fs.move_dir("a", "dest").unwrap();
        fs.change_dir("dest/a/inner").unwrap();
        assert_eq!(fs.working_dir(), "/dest/a/inner");
    }

    #[test]
    fn empty_and_whitespace_paths_are_invalid() {
        let (mut fs, _) = setup();
        assert_eq!(fs.create_file(""), Err(FsError::InvalidArgument));
        assert_eq!(fs.create_file("   "), Err(FsError::InvalidArgument));
        assert_eq!(fs.change_dir(""), Err(FsError::InvalidArgument));
        assert_eq!(fs.make_dir("/"), Err(FsError::InvalidArgument));
    }

    #[test]
    fn reset_clears_tree_and_pool_usage() {
        let (mut fs, mut pool) = setup();
        fs.make_dir("d").unwrap();
        fs.create_file("d/f").unwrap();
        fs.write_file(&mut pool, "d/f", "x").unwrap();

        fs.reset(&mut pool);
        assert_eq!(pool.used(), 0);
        assert_eq!(fs.working_dir(), "/");
        assert_eq!(fs.change_dir("d"), Err(FsError::NotFound));
    }
}
