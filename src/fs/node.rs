use crate::memory::MemToken;

/// Stable identifier of a node in the tree arena.
///
/// Nodes reference each other by id rather than by pointer: directories keep
/// insertion-ordered child id lists, every non-root node keeps a parent id,
/// and the tree owns the arena. Ownership stays strictly tree-shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// A regular file. The body lives in the memory pool; `token` is `Some`
/// iff `size > 0`.
#[derive(Debug)]
pub struct FileNode {
    pub name: String,
    pub parent: NodeId,
    pub token: Option<MemToken>,
    pub size: usize,
    pub created_at: i64,
    pub modified_at: i64,
}

/// A directory. Children are kept in insertion order, names unique within
/// a directory per kind.
#[derive(Debug)]
pub struct DirNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub dirs: Vec<NodeId>,
    pub files: Vec<NodeId>,
    pub created_at: i64,
    pub modified_at: i64,
}

impl DirNode {
    pub fn new(name: &str, parent: Option<NodeId>) -> Self {
        let now = now_secs();
        DirNode {
            name: name.to_string(),
            parent,
            dirs: Vec::new(),
            files: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }
}

/// Current wall-clock time as epoch seconds (the timestamp granularity
/// the snapshot format round-trips).
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Render an epoch-second timestamp for directory listings.
pub fn format_time(secs: i64) -> String {
    match chrono::DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::from("????-??-?? ??:??:??"),
    }
}
