//! Drive enumeration and hot-plug detection
//!
//! A [`DriveProvider`] reports the currently mounted roots. Arrival and
//! removal are expressed as [`DriveEvent`]s; the [`DrivePoller`] produces
//! them by diffing successive snapshots when the platform offers no
//! notification of its own.

use super::async_bridge::AsyncMessage;
use crate::primitives::path_utils::{drive_designator, paths_equal_ignore_case};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveKind {
    Fixed,
    Removable,
    Network,
    Optical,
    Ram,
    Unknown,
}

/// One mounted (or announced) drive root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveInfo {
    pub root: PathBuf,
    /// Volume label; `None` when the volume could not be queried
    pub label: Option<String>,
    pub kind: DriveKind,
    /// Media present and readable
    pub is_ready: bool,
}

impl DriveInfo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            label: None,
            kind: DriveKind::Fixed,
            is_ready: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: DriveKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.is_ready = ready;
        self
    }

    /// `"<label> (C:)"`, or the raw root when the volume has no answer
    pub fn display_name(&self) -> String {
        let Some(label) = &self.label else {
            return self.root.to_string_lossy().into_owned();
        };
        let designator = drive_designator(&self.root)
            .unwrap_or_else(|| self.root.to_string_lossy().into_owned());
        format!("{} ({})", label, designator).trim_start().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveEvent {
    Arrived(PathBuf),
    Removed(PathBuf),
}

pub trait DriveProvider: Send + Sync {
    /// All drives currently known, ready or not
    fn list_drives(&self) -> Vec<DriveInfo>;

    /// Query one drive; `None` if it is not mounted
    fn drive_info(&self, root: &Path) -> Option<DriveInfo> {
        self.list_drives()
            .into_iter()
            .find(|d| paths_equal_ignore_case(&d.root, root))
    }
}

/// Drive set kept in memory, changed by hand
///
/// Used for configured extra roots and to script hot-plug in tests.
#[derive(Debug, Default)]
pub struct StaticDriveProvider {
    drives: Mutex<Vec<DriveInfo>>,
}

impl StaticDriveProvider {
    pub fn new(drives: Vec<DriveInfo>) -> Self {
        Self {
            drives: Mutex::new(drives),
        }
    }

    /// Add or replace a drive
    pub fn insert(&self, drive: DriveInfo) {
        let mut drives = self.drives.lock().unwrap_or_else(|e| e.into_inner());
        drives.retain(|d| !paths_equal_ignore_case(&d.root, &drive.root));
        drives.push(drive);
    }

    pub fn remove(&self, root: &Path) -> Option<DriveInfo> {
        let mut drives = self.drives.lock().unwrap_or_else(|e| e.into_inner());
        let index = drives
            .iter()
            .position(|d| paths_equal_ignore_case(&d.root, root))?;
        Some(drives.remove(index))
    }
}

impl DriveProvider for StaticDriveProvider {
    fn list_drives(&self) -> Vec<DriveInfo> {
        self.drives
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Drives of the running system plus any configured extra roots
#[derive(Debug, Default)]
pub struct SystemDriveProvider {
    extra_roots: Vec<PathBuf>,
}

impl SystemDriveProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.extra_roots = roots;
        self
    }

    fn extra_drives(&self) -> impl Iterator<Item = DriveInfo> + '_ {
        self.extra_roots.iter().map(|root| {
            DriveInfo::new(root.clone())
                .with_kind(DriveKind::Unknown)
                .with_ready(root.is_dir())
        })
    }
}

impl DriveProvider for SystemDriveProvider {
    fn list_drives(&self) -> Vec<DriveInfo> {
        let mut drives = platform::system_drives();
        for extra in self.extra_drives() {
            if !drives
                .iter()
                .any(|d| paths_equal_ignore_case(&d.root, &extra.root))
            {
                drives.push(extra);
            }
        }
        drives
    }
}

#[cfg(windows)]
mod platform {
    use super::{DriveInfo, DriveKind};
    use std::ptr;
    use windows_sys::Win32::Storage::FileSystem::{
        GetDriveTypeW, GetLogicalDrives, GetVolumeInformationW,
    };

    const DRIVE_REMOVABLE: u32 = 2;
    const DRIVE_FIXED: u32 = 3;
    const DRIVE_REMOTE: u32 = 4;
    const DRIVE_CDROM: u32 = 5;
    const DRIVE_RAMDISK: u32 = 6;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    pub(super) fn system_drives() -> Vec<DriveInfo> {
        // SAFETY: no arguments, returns a bitmask
        let mask = unsafe { GetLogicalDrives() };
        let mut drives = Vec::new();
        for bit in 0..26u32 {
            if mask & (1 << bit) == 0 {
                continue;
            }
            let letter = char::from(b'A' + bit as u8);
            let root = format!("{}:\\", letter);
            let root_w = wide(&root);

            // SAFETY: root_w is NUL-terminated and outlives the call
            let kind = match unsafe { GetDriveTypeW(root_w.as_ptr()) } {
                DRIVE_REMOVABLE => DriveKind::Removable,
                DRIVE_FIXED => DriveKind::Fixed,
                DRIVE_REMOTE => DriveKind::Network,
                DRIVE_CDROM => DriveKind::Optical,
                DRIVE_RAMDISK => DriveKind::Ram,
                _ => DriveKind::Unknown,
            };

            let mut label = [0u16; 261];
            // SAFETY: buffer length matches the size passed in
            let ok = unsafe {
                GetVolumeInformationW(
                    root_w.as_ptr(),
                    label.as_mut_ptr(),
                    label.len() as u32,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    0,
                )
            } != 0;

            let mut info = DriveInfo::new(root).with_kind(kind).with_ready(ok);
            if ok {
                let len = label.iter().position(|&c| c == 0).unwrap_or(label.len());
                info = info.with_label(String::from_utf16_lossy(&label[..len]));
            }
            drives.push(info);
        }
        drives
    }
}

#[cfg(not(windows))]
mod platform {
    use super::DriveInfo;

    pub(super) fn system_drives() -> Vec<DriveInfo> {
        vec![DriveInfo::new("/")]
    }
}

/// Events that turn `before` into `after`, removals first
pub fn diff_drives(before: &[DriveInfo], after: &[DriveInfo]) -> Vec<DriveEvent> {
    let present = |set: &[DriveInfo], drive: &DriveInfo| {
        set.iter()
            .any(|d| d.is_ready && paths_equal_ignore_case(&d.root, &drive.root))
    };

    let mut events: Vec<DriveEvent> = before
        .iter()
        .filter(|d| d.is_ready && !present(after, d))
        .map(|d| DriveEvent::Removed(d.root.clone()))
        .collect();
    events.extend(
        after
            .iter()
            .filter(|d| d.is_ready && !present(before, d))
            .map(|d| DriveEvent::Arrived(d.root.clone())),
    );
    events
}

/// Detects drive arrival and removal by polling a provider
pub struct DrivePoller {
    provider: std::sync::Arc<dyn DriveProvider>,
    known: Vec<DriveInfo>,
}

impl DrivePoller {
    pub fn new(provider: std::sync::Arc<dyn DriveProvider>) -> Self {
        let known = provider.list_drives();
        Self { provider, known }
    }

    /// Take a fresh snapshot and report what changed since the last one
    pub fn poll(&mut self) -> Vec<DriveEvent> {
        let current = self.provider.list_drives();
        let events = diff_drives(&self.known, &current);
        self.known = current;
        events
    }

    /// Poll on the tokio runtime, forwarding events until the receiver is gone
    pub fn spawn(
        mut self,
        handle: &tokio::runtime::Handle,
        every: Duration,
        sender: mpsc::Sender<AsyncMessage>,
    ) -> tokio::task::JoinHandle<()> {
        handle.spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                for event in self.poll() {
                    tracing::debug!("Drive change detected: {:?}", event);
                    if sender.send(AsyncMessage::DriveChanged(event)).is_err() {
                        return;
                    }
                }
            }
        })
    }
}
