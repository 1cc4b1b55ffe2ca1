//! Deciding which change events matter, and reading the changed document.

use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Marker editors put in the extension of the file they save through
/// (`MainPage.xaml~`). Only those writes are final enough to push.
pub const DEFAULT_GENERATION_MARKER: &str = "~";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Which change events lead to a broadcast, and of which file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Every changed file is pushed.
    Any,
    /// Only files whose extension contains the marker are pushed.
    Marker(String),
    /// Any change re-pushes this one file.
    Exact(PathBuf),
}

impl Default for DocumentFilter {
    fn default() -> Self {
        DocumentFilter::Marker(DEFAULT_GENERATION_MARKER.to_string())
    }
}

impl DocumentFilter {
    /// The document to read for a change reported at `changed`, or `None`
    /// if the change should be ignored.
    pub fn resolve(&self, changed: &Path) -> Option<PathBuf> {
        match self {
            DocumentFilter::Any => Some(changed.to_path_buf()),
            DocumentFilter::Marker(marker) => changed
                .extension()
                .filter(|ext| ext.to_string_lossy().contains(marker.as_str()))
                .map(|_| changed.to_path_buf()),
            DocumentFilter::Exact(path) => Some(path.clone()),
        }
    }
}

/// Read the whole document at `path` as text.
///
/// The file is opened for shared access so that an editor still holding it
/// open for writing does not make the read fail. A leading UTF-8 byte order
/// mark is dropped and invalid UTF-8 is replaced, so the result is always
/// valid text for the wire.
pub fn read_document(path: &Path) -> std::io::Result<String> {
    let mut file = open_shared(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    Ok(String::from_utf8_lossy(body).into_owned())
}

#[cfg(windows)]
fn open_shared(path: &Path) -> std::io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    use windows_sys::Win32::Storage::FileSystem::{
        FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE,
    };

    OpenOptions::new()
        .read(true)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE)
        .open(path)
}

#[cfg(not(windows))]
fn open_shared(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().read(true).open(path)
}
