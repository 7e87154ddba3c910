// File tree module for the lazily loaded drive/directory hierarchy
//
// Nodes live in an arena owned by `FileTree`; parents hold child ids and
// children hold a parent id, so there is no shared ownership.

pub mod node;
pub mod sort;
pub mod tree;

pub use node::{NodeId, NodeKind, NodeState, TreeNode};
pub use sort::{compare_drive_roots, natural_cmp, natural_order, NaturalSortKey};
pub use tree::{ChildEntry, FileTree};
