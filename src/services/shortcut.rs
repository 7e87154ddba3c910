//! Shortcut (`.lnk`) resolution
//!
//! [`LnkFileResolver`] reads the Shell Link binary format directly, so
//! shortcuts can be followed without COM and on any host. Only the parts
//! needed to find the target are decoded: the header, the LinkInfo block
//! and the relative-path string.

use crate::error::{ExplorerError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const HEADER_SIZE: usize = 0x4C;
const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

const HAS_LINK_TARGET_ID_LIST: u32 = 0x0001;
const HAS_LINK_INFO: u32 = 0x0002;
const HAS_NAME: u32 = 0x0004;
const HAS_RELATIVE_PATH: u32 = 0x0008;
const IS_UNICODE: u32 = 0x0080;

const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 0x1;
const COMMON_NETWORK_RELATIVE_LINK: u32 = 0x2;

const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;

/// Result of resolving a shortcut
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortcutInfo {
    pub success: bool,
    pub target_path: Option<PathBuf>,
    pub is_directory: bool,
    pub error: Option<String>,
}

impl ShortcutInfo {
    pub fn resolved(target_path: PathBuf, is_directory: bool) -> Self {
        Self {
            success: true,
            target_path: Some(target_path),
            is_directory,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            target_path: None,
            is_directory: false,
            error: Some(error.into()),
        }
    }

    /// Target path and directory flag, or [`ExplorerError::Shortcut`]
    pub fn into_result(self, link: &Path) -> Result<(PathBuf, bool)> {
        match (self.success, self.target_path) {
            (true, Some(target)) => Ok((target, self.is_directory)),
            _ => Err(ExplorerError::Shortcut {
                path: link.to_path_buf(),
                reason: self
                    .error
                    .unwrap_or_else(|| "shortcut has no target".to_string()),
            }),
        }
    }
}

/// Shortcut-resolution collaborator
pub trait ShortcutResolver: Send + Sync {
    fn resolve(&self, link: &Path) -> ShortcutInfo;
}

/// Whether the path names a `.lnk` file (case-insensitive)
pub fn is_shortcut(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("lnk"))
}

/// Parsed target of a link file
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkTarget {
    path: String,
    /// Relative paths are resolved against the link's directory
    relative: bool,
    attributes: u32,
}

struct Reader<'a> {
    data: &'a [u8],
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

impl<'a> Reader<'a> {
    fn u16_at(&self, offset: usize) -> io::Result<u16> {
        self.data
            .get(offset..offset + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .ok_or_else(|| invalid(format!("truncated at offset {}", offset)))
    }

    fn u32_at(&self, offset: usize) -> io::Result<u32> {
        self.data
            .get(offset..offset + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| invalid(format!("truncated at offset {}", offset)))
    }

    /// NUL-terminated single-byte string
    fn ansi_at(&self, offset: usize) -> io::Result<String> {
        let rest = self
            .data
            .get(offset..)
            .ok_or_else(|| invalid(format!("string offset {} out of range", offset)))?;
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| invalid("unterminated string"))?;
        Ok(String::from_utf8_lossy(&rest[..end]).into_owned())
    }

    /// NUL-terminated UTF-16LE string
    fn unicode_at(&self, offset: usize) -> io::Result<String> {
        let mut units = Vec::new();
        let mut pos = offset;
        loop {
            let unit = self.u16_at(pos)?;
            if unit == 0 {
                break;
            }
            units.push(unit);
            pos += 2;
        }
        Ok(String::from_utf16_lossy(&units))
    }
}

fn parse_link_info(block: &[u8]) -> io::Result<Option<String>> {
    let r = Reader { data: block };
    let header_size = r.u32_at(4)? as usize;
    let flags = r.u32_at(8)?;
    let local_base_offset = r.u32_at(16)? as usize;
    let network_offset = r.u32_at(20)? as usize;
    let suffix_offset = r.u32_at(24)? as usize;
    let unicode = header_size >= 0x24;

    let suffix = if unicode {
        r.unicode_at(r.u32_at(32)? as usize)?
    } else {
        r.ansi_at(suffix_offset)?
    };

    if flags & VOLUME_ID_AND_LOCAL_BASE_PATH != 0 {
        let base = if unicode {
            r.unicode_at(r.u32_at(28)? as usize)?
        } else {
            r.ansi_at(local_base_offset)?
        };
        return Ok(Some(format!("{}{}", base, suffix)));
    }

    if flags & COMMON_NETWORK_RELATIVE_LINK != 0 {
        let net = Reader {
            data: block
                .get(network_offset..)
                .ok_or_else(|| invalid("network link offset out of range"))?,
        };
        let net_name_offset = net.u32_at(8)? as usize;
        let net_name = if net_name_offset > 0x14 {
            net.unicode_at(net.u32_at(20)? as usize)?
        } else {
            net.ansi_at(net_name_offset)?
        };
        if suffix.is_empty() {
            return Ok(Some(net_name));
        }
        return Ok(Some(format!("{}\\{}", net_name, suffix)));
    }

    Ok(None)
}

/// Read one counted StringData entry, returning it and the next offset
fn string_data_at(r: &Reader<'_>, offset: usize, unicode: bool) -> io::Result<(String, usize)> {
    let count = r.u16_at(offset)? as usize;
    let start = offset + 2;
    if unicode {
        let bytes = r
            .data
            .get(start..start + count * 2)
            .ok_or_else(|| invalid("truncated string data"))?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok((String::from_utf16_lossy(&units), start + count * 2))
    } else {
        let bytes = r
            .data
            .get(start..start + count)
            .ok_or_else(|| invalid("truncated string data"))?;
        Ok((String::from_utf8_lossy(bytes).into_owned(), start + count))
    }
}

fn parse_link(data: &[u8]) -> io::Result<LinkTarget> {
    let r = Reader { data };
    if data.len() < HEADER_SIZE || r.u32_at(0)? as usize != HEADER_SIZE {
        return Err(invalid("not a shell link"));
    }
    if data[4..20] != LINK_CLSID {
        return Err(invalid("unexpected link class id"));
    }
    let flags = r.u32_at(20)?;
    let attributes = r.u32_at(24)?;

    let mut offset = HEADER_SIZE;
    if flags & HAS_LINK_TARGET_ID_LIST != 0 {
        offset += 2 + r.u16_at(offset)? as usize;
    }

    if flags & HAS_LINK_INFO != 0 {
        let size = r.u32_at(offset)? as usize;
        let block = data
            .get(offset..offset + size)
            .ok_or_else(|| invalid("truncated link info"))?;
        if let Some(path) = parse_link_info(block)? {
            return Ok(LinkTarget {
                path,
                relative: false,
                attributes,
            });
        }
        offset += size;
    }

    let unicode = flags & IS_UNICODE != 0;
    if flags & HAS_NAME != 0 {
        offset = string_data_at(&r, offset, unicode)?.1;
    }
    if flags & HAS_RELATIVE_PATH != 0 {
        let (path, _) = string_data_at(&r, offset, unicode)?;
        return Ok(LinkTarget {
            path,
            relative: true,
            attributes,
        });
    }

    Ok(LinkTarget {
        path: String::new(),
        relative: false,
        attributes,
    })
}

/// [`ShortcutResolver`] that decodes `.lnk` files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LnkFileResolver;

impl LnkFileResolver {
    pub fn new() -> Self {
        Self
    }
}

impl ShortcutResolver for LnkFileResolver {
    fn resolve(&self, link: &Path) -> ShortcutInfo {
        let data = match fs::read(link) {
            Ok(data) => data,
            Err(e) => return ShortcutInfo::failed(format!("cannot read shortcut: {}", e)),
        };
        let target = match parse_link(&data) {
            Ok(target) => target,
            Err(e) => return ShortcutInfo::failed(format!("cannot parse shortcut: {}", e)),
        };
        if target.path.trim().is_empty() {
            return ShortcutInfo::failed("target path is empty");
        }

        let target_path = if target.relative {
            let normalized = target.path.replace('\\', std::path::MAIN_SEPARATOR_STR);
            link.parent()
                .unwrap_or_else(|| Path::new(""))
                .join(normalized)
        } else {
            PathBuf::from(&target.path)
        };

        match fs::metadata(&target_path) {
            Ok(metadata) => ShortcutInfo::resolved(target_path, metadata.is_dir()),
            Err(e) => match e.kind() {
                io::ErrorKind::NotFound => ShortcutInfo::failed("target does not exist"),
                io::ErrorKind::PermissionDenied => {
                    ShortcutInfo::failed("access to the target path is denied")
                }
                // Unreachable target that still names a directory in the link
                _ if target.attributes & FILE_ATTRIBUTE_DIRECTORY != 0 => {
                    ShortcutInfo::failed(format!("directory target unavailable: {}", e))
                }
                _ => ShortcutInfo::failed(format!("cannot access target: {}", e)),
            },
        }
    }
}
