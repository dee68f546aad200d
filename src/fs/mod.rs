pub mod error;
pub mod node;
pub mod path;
pub mod snapshot;
pub mod tree;

pub use self::error::{FsError, FsResult};
pub use self::node::NodeId;
pub use self::tree::FsTree;
