//! Services that touch the outside world
//!
//! Filesystem access, shell collaborators, drive discovery, icons and the
//! channel that carries background results back to the owning task.

pub mod async_bridge;
pub mod clipboard;
pub mod drives;
pub mod file_ops;
pub mod fs;
pub mod icons;
pub mod shortcut;
pub mod tracing_setup;
