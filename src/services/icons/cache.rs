//! Two-tier icon cache
//!
//! Icons are cached by `(system icon index, overlay mask)` and, optionally,
//! by file extension. Both maps live as long as the cache and are never
//! evicted. Cached images are shared through `Arc` and never mutated, so
//! two lookups that hit the same key return the same allocation.

use super::provider::{IconImage, IconRequest, IconSize, ShellIconProvider, LINK_OVERLAY};
use crate::view::file_tree::NodeKind;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Extensions whose icon depends on the file itself
const INSTANCE_ICON_EXTENSIONS: &[&str] = &["exe", "ico", "lnk", "scr"];
/// Extensions that get the shortcut badge
const SHORTCUT_EXTENSIONS: &[&str] = &["lnk", "url"];

type IndexKey = (i32, u32);

/// Lowercased extension without the dot; `.txt` yields `txt`.
pub fn extension_key(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let dot = name.rfind('.')?;
    let ext = &name[dot + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// True for extensions that must always be resolved from the real file
pub fn bypasses_extension_cache(ext: &str) -> bool {
    INSTANCE_ICON_EXTENSIONS.contains(&ext)
}

pub struct IconCache {
    provider: Arc<dyn ShellIconProvider>,
    size: IconSize,
    cache_by_extension: bool,
    index_cache: Mutex<HashMap<IndexKey, Arc<IconImage>>>,
    extension_cache: Mutex<HashMap<String, Arc<IconImage>>>,
    unknown: OnceCell<Arc<IconImage>>,
    directory: OnceCell<Arc<IconImage>>,
}

impl std::fmt::Debug for IconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconCache")
            .field("size", &self.size)
            .field("cache_by_extension", &self.cache_by_extension)
            .field("index_entries", &self.index_len())
            .field("extension_entries", &self.extension_len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl IconCache {
    /// Index-keyed caching only
    pub fn new(provider: Arc<dyn ShellIconProvider>, size: IconSize) -> Self {
        Self {
            provider,
            size,
            cache_by_extension: false,
            index_cache: Mutex::new(HashMap::new()),
            extension_cache: Mutex::new(HashMap::new()),
            unknown: OnceCell::new(),
            directory: OnceCell::new(),
        }
    }

    /// Also remember icons per extension
    ///
    /// Faster for large listings, but the first file seen for an extension
    /// decides the icon of every later file with that extension.
    pub fn with_extension_cache(mut self, enabled: bool) -> Self {
        self.cache_by_extension = enabled;
        self
    }

    pub fn size(&self) -> IconSize {
        self.size
    }

    /// Icon for `path`
    ///
    /// With `by_extension` only the extension matters and the path does not
    /// have to exist. Otherwise the real file is inspected, which picks up
    /// per-file overlays, and the extension cache is left untouched.
    pub fn get_icon(&self, path: &Path, by_extension: bool) -> Arc<IconImage> {
        if by_extension {
            self.icon_by_extension(path)
        } else {
            self.icon_by_path(path)
        }
    }

    fn icon_by_extension(&self, path: &Path) -> Arc<IconImage> {
        let Some(ext) = extension_key(path) else {
            return self.unknown_icon();
        };
        let use_extension_cache = self.cache_by_extension && !bypasses_extension_cache(&ext);
        if use_extension_cache {
            if let Some(icon) = lock(&self.extension_cache).get(&ext) {
                return Arc::clone(icon);
            }
        }

        let probe = format!("file.{}", ext);
        let Some(info) = self
            .provider
            .file_info(Path::new(&probe), IconRequest::probe(self.size))
        else {
            tracing::debug!("No shell icon for extension {:?}", ext);
            return self.unknown_icon();
        };
        let overlay = if SHORTCUT_EXTENSIONS.contains(&ext.as_str()) || info.is_link() {
            LINK_OVERLAY
        } else {
            0
        };

        match self.icon_for_index(info.icon_index, overlay, info.image) {
            Some(icon) => {
                if use_extension_cache {
                    lock(&self.extension_cache).insert(ext, Arc::clone(&icon));
                }
                icon
            }
            None => self.unknown_icon(),
        }
    }

    fn icon_by_path(&self, path: &Path) -> Arc<IconImage> {
        let Some(info) = self.provider.file_info(path, IconRequest::new(self.size)) else {
            tracing::debug!("No shell icon for {:?}", path);
            return self.unknown_icon();
        };
        let overlay = if info.is_link() { LINK_OVERLAY } else { 0 };
        self.icon_for_index(info.icon_index, overlay, info.image)
            .unwrap_or_else(|| self.unknown_icon())
    }

    /// Index cache lookup, filling it from the provider on a miss
    fn icon_for_index(
        &self,
        index: i32,
        overlay: u32,
        ready: Option<IconImage>,
    ) -> Option<Arc<IconImage>> {
        let key = (index, overlay);
        if let Some(icon) = lock(&self.index_cache).get(&key) {
            return Some(Arc::clone(icon));
        }

        let image = match ready {
            Some(image) => image,
            None => self.provider.system_image(index, overlay, self.size)?,
        };
        let mut cache = lock(&self.index_cache);
        // Another caller may have filled the slot meanwhile; keep the first
        let icon = cache.entry(key).or_insert_with(|| Arc::new(image));
        Some(Arc::clone(icon))
    }

    /// Icon shown when nothing better can be resolved
    pub fn unknown_icon(&self) -> Arc<IconImage> {
        Arc::clone(self.unknown.get_or_init(|| {
            let image = self
                .provider
                .file_info(Path::new("file"), IconRequest::probe(self.size))
                .and_then(|info| {
                    info.image
                        .or_else(|| self.provider.system_image(info.icon_index, 0, self.size))
                })
                .unwrap_or_else(|| IconImage::solid(self.size.pixels(), [0, 0, 0, 0]));
            Arc::new(image)
        }))
    }

    /// Shared icon for every directory
    pub fn directory_icon(&self) -> Arc<IconImage> {
        let icon = self.directory.get_or_init(|| {
            self.provider
                .file_info(Path::new("folder"), IconRequest::directory_probe(self.size))
                .and_then(|info| self.icon_for_index(info.icon_index, 0, info.image))
                .unwrap_or_else(|| self.unknown_icon())
        });
        Arc::clone(icon)
    }

    /// Icon of a drive root
    ///
    /// Drive icons reflect the medium (an empty card reader looks different
    /// from a full one), so they bypass both caches. Callers keep the result
    /// on the drive's node.
    pub fn drive_icon(&self, root: &Path) -> Arc<IconImage> {
        let image = self
            .provider
            .file_info(root, IconRequest::new(self.size))
            .and_then(|info| {
                let overlay = if info.is_link() { LINK_OVERLAY } else { 0 };
                info.image
                    .or_else(|| self.provider.system_image(info.icon_index, overlay, self.size))
            });
        match image {
            Some(image) => Arc::new(image),
            None => self.unknown_icon(),
        }
    }

    /// Icon for a tree node of the given kind
    pub fn icon_for(&self, kind: NodeKind, path: &Path) -> Arc<IconImage> {
        match kind {
            NodeKind::Drive => self.drive_icon(path),
            NodeKind::Directory => self.directory_icon(),
            NodeKind::File => {
                let by_extension = self.cache_by_extension
                    && extension_key(path).is_some_and(|ext| !bypasses_extension_cache(&ext));
                self.get_icon(path, by_extension)
            }
        }
    }

    /// Number of `(index, overlay)` entries
    pub fn index_len(&self) -> usize {
        lock(&self.index_cache).len()
    }

    /// Number of extension entries
    pub fn extension_len(&self) -> usize {
        lock(&self.extension_cache).len()
    }
}
