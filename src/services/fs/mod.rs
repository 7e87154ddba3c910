//! Asynchronous filesystem access
//!
//! All disk access of the explorer goes through [`FsBackend`]. The
//! [`FsManager`] adds request de-duplication and the visibility rules
//! (hidden entries, unreadable directories) the tree and list use.

pub mod backend;
pub mod instrumented;
pub mod local;
pub mod manager;

pub use backend::{EntryKind, FileAttributes, FsBackend, FsEntry, FsMetadata};
pub use instrumented::{BackendMetrics, InstrumentedFsBackend};
pub use local::LocalFsBackend;
pub use manager::FsManager;
