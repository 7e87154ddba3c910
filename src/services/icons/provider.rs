//! Shell icon lookup collaborator
//!
//! The cache never talks to the OS directly. It asks a [`ShellIconProvider`]
//! for a system icon index (plus attribute bits) and for the bitmap behind
//! an index. [`GenericIconProvider`] is a portable implementation that maps
//! file types to a fixed icon table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Attribute bit reported for links (shortcut overlay)
pub const ATTR_LINK: u32 = 0x0001_0000;
/// Overlay mask of the shortcut arrow badge
pub const LINK_OVERLAY: u32 = 1;

/// Decoded icon bitmap (RGBA8, row major)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl IconImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Single-color square image
    pub fn solid(size: u32, color: [u8; 4]) -> Self {
        let pixels = (size * size) as usize;
        let mut rgba = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            rgba.extend_from_slice(&color);
        }
        Self::new(size, size, rgba)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum IconSize {
    /// 16x16
    Small,
    /// 32x32
    #[default]
    Large,
}

impl IconSize {
    pub fn pixels(self) -> u32 {
        match self {
            IconSize::Small => 16,
            IconSize::Large => 32,
        }
    }
}

/// How a lookup should be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconRequest {
    pub size: IconSize,
    /// Ask for the "open" variant (folders)
    pub open: bool,
    /// The path may not exist; derive the icon from its name only
    pub probe_only: bool,
    /// With `probe_only`, describe the probe as a directory
    pub directory: bool,
}

impl IconRequest {
    pub fn new(size: IconSize) -> Self {
        Self {
            size,
            open: false,
            probe_only: false,
            directory: false,
        }
    }

    pub fn probe(size: IconSize) -> Self {
        Self {
            probe_only: true,
            ..Self::new(size)
        }
    }

    pub fn directory_probe(size: IconSize) -> Self {
        Self {
            directory: true,
            ..Self::probe(size)
        }
    }
}

/// Result of a shell lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellFileInfo {
    /// Index into the system icon table
    pub icon_index: i32,
    /// Attribute bits, see [`ATTR_LINK`]
    pub attributes: u32,
    /// Some providers hand back a ready bitmap together with the index
    pub image: Option<IconImage>,
}

impl ShellFileInfo {
    pub fn is_link(&self) -> bool {
        self.attributes & ATTR_LINK != 0
    }
}

pub trait ShellIconProvider: Send + Sync {
    /// Look up index and attributes for a real path or a synthetic probe
    /// path such as `file.txt`. `None` means the shell has no answer.
    fn file_info(&self, path: &Path, request: IconRequest) -> Option<ShellFileInfo>;

    /// Render the icon at `index`, with an optional overlay badge.
    fn system_image(&self, index: i32, overlay: u32, size: IconSize) -> Option<IconImage>;
}

/// Icon table entries of [`GenericIconProvider`]
pub mod generic_index {
    pub const UNKNOWN: i32 = 0;
    pub const FOLDER: i32 = 1;
    pub const FOLDER_OPEN: i32 = 2;
    pub const DRIVE: i32 = 3;
    pub const TEXT: i32 = 4;
    pub const IMAGE: i32 = 5;
    pub const AUDIO: i32 = 6;
    pub const VIDEO: i32 = 7;
    pub const ARCHIVE: i32 = 8;
    pub const EXECUTABLE: i32 = 9;
    pub const DOCUMENT: i32 = 10;
    pub const SHORTCUT: i32 = 11;
    /// One past the last valid index
    pub const COUNT: i32 = 12;
}

/// Portable provider that classifies files by extension and MIME type
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericIconProvider;

impl GenericIconProvider {
    pub fn new() -> Self {
        Self
    }

    fn index_for_extension(ext: &str) -> i32 {
        use generic_index::*;
        match ext {
            "exe" | "com" | "bat" | "cmd" | "msi" | "scr" | "sh" => return EXECUTABLE,
            "lnk" | "url" => return SHORTCUT,
            "zip" | "7z" | "rar" | "tar" | "gz" | "xz" | "bz2" => return ARCHIVE,
            "pdf" | "doc" | "docx" | "odt" | "rtf" | "xls" | "xlsx" => return DOCUMENT,
            _ => {}
        }
        let mime = mime_guess2::from_ext(ext).first_or_octet_stream();
        match mime.type_().as_str() {
            "text" => TEXT,
            "image" => IMAGE,
            "audio" => AUDIO,
            "video" => VIDEO,
            _ => UNKNOWN,
        }
    }

    fn palette(index: i32) -> [u8; 4] {
        // Spread the hues so neighbouring indices look different
        let i = index.rem_euclid(generic_index::COUNT) as u8;
        [
            40u8.wrapping_add(i.wrapping_mul(53)),
            90u8.wrapping_add(i.wrapping_mul(31)),
            160u8.wrapping_add(i.wrapping_mul(17)),
            255,
        ]
    }
}

impl ShellIconProvider for GenericIconProvider {
    fn file_info(&self, path: &Path, request: IconRequest) -> Option<ShellFileInfo> {
        use generic_index::*;

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let mut attributes = 0;
        if matches!(ext.as_str(), "lnk" | "url") {
            attributes |= ATTR_LINK;
        }

        if request.probe_only && request.directory {
            return Some(ShellFileInfo {
                icon_index: if request.open { FOLDER_OPEN } else { FOLDER },
                attributes,
                image: None,
            });
        }

        if !request.probe_only {
            let metadata = std::fs::symlink_metadata(path).ok()?;
            if metadata.file_type().is_symlink() {
                attributes |= ATTR_LINK;
            }
            let is_dir = metadata.is_dir() || std::fs::metadata(path).is_ok_and(|m| m.is_dir());
            if is_dir {
                let icon_index = if path.parent().is_none() {
                    DRIVE
                } else if request.open {
                    FOLDER_OPEN
                } else {
                    FOLDER
                };
                return Some(ShellFileInfo {
                    icon_index,
                    attributes,
                    image: None,
                });
            }
        }

        let icon_index = if ext.is_empty() {
            UNKNOWN
        } else {
            Self::index_for_extension(&ext)
        };
        Some(ShellFileInfo {
            icon_index,
            attributes,
            image: None,
        })
    }

    fn system_image(&self, index: i32, overlay: u32, size: IconSize) -> Option<IconImage> {
        if !(0..generic_index::COUNT).contains(&index) {
            return None;
        }
        let mut image = IconImage::solid(size.pixels(), Self::palette(index));
        if overlay & LINK_OVERLAY != 0 {
            // Darken the lower-left quarter as the shortcut badge
            let side = image.width;
            for y in side / 2..side {
                for x in 0..side / 2 {
                    let offset = ((y * side + x) * 4) as usize;
                    for channel in &mut image.rgba[offset..offset + 3] {
                        *channel /= 2;
                    }
                }
            }
        }
        Some(image)
    }
}
