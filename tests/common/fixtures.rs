// Drive layouts on disk for end-to-end tests

use fresh_explorer::app::{Collaborators, Explorer, Opener};
use fresh_explorer::config::Config;
use fresh_explorer::model::event::ExplorerEvent;
use fresh_explorer::services::drives::{DriveInfo, DriveKind, StaticDriveProvider};
use fresh_explorer::services::file_ops::{DeleteMode, LocalFileOps};
use fresh_explorer::view::file_tree::NodeId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Opener that only remembers what it was asked to open
#[derive(Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<PathBuf>>,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl Opener for RecordingOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Two fake drives under a temp dir:
///
/// ```text
/// C/Users/Alice/{Music/, notes.txt, track2.mp3, track10.mp3}
/// C/Windows/
/// E/Photos/
/// ```
///
/// `C` is a fixed disk, `E` removable. Nothing is started.
pub struct DriveLayout {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub drives: Arc<StaticDriveProvider>,
    pub opener: Arc<RecordingOpener>,
}

impl DriveLayout {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path().to_path_buf();

        fs::create_dir_all(root.join("C/Users/Alice/Music"))?;
        fs::create_dir_all(root.join("C/Windows"))?;
        fs::create_dir_all(root.join("E/Photos"))?;
        for name in ["notes.txt", "track2.mp3", "track10.mp3"] {
            fs::write(root.join("C/Users/Alice").join(name), name)?;
        }

        let drives = Arc::new(StaticDriveProvider::new(vec![
            DriveInfo::new(root.join("C")).with_label("System"),
            DriveInfo::new(root.join("E"))
                .with_label("USB")
                .with_kind(DriveKind::Removable),
        ]));

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            drives,
            opener: Arc::new(RecordingOpener::default()),
        })
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// An explorer over this layout with local backends
    pub fn explorer(&self, config: Config) -> Explorer {
        let mut collaborators = Collaborators::local(&config);
        collaborators.drives = self.drives.clone();
        collaborators.opener = self.opener.clone();
        collaborators.file_ops = Arc::new(LocalFileOps::new(DeleteMode::Permanent));
        Explorer::new(config, collaborators)
    }

    /// Explorer with default config, already started
    pub async fn started(&self) -> anyhow::Result<Explorer> {
        let mut explorer = self.explorer(Config::default());
        explorer.start().await?;
        Ok(explorer)
    }
}

/// Resolve a path under the layout to its tree node
pub async fn node(explorer: &mut Explorer, path: &Path) -> NodeId {
    explorer
        .navigator_mut()
        .tree_mut()
        .find_by_path(path)
        .await
        .unwrap_or_else(|| panic!("{:?} not in tree", path))
}

/// Paths of every `CurrentDirectoryChanged` event, oldest first
pub fn visited(explorer: &Explorer) -> Vec<PathBuf> {
    explorer
        .events()
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            ExplorerEvent::CurrentDirectoryChanged { path, .. } => Some(path),
            _ => None,
        })
        .collect()
}
