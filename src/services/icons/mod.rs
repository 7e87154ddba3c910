//! Icon resolution and caching

pub mod cache;
pub mod provider;

pub use cache::IconCache;
pub use provider::{
    GenericIconProvider, IconImage, IconRequest, IconSize, ShellFileInfo, ShellIconProvider,
    ATTR_LINK, LINK_OVERLAY,
};
