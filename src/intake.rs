// intake.rs - Turning user selections into a batch of images

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use walkdir::WalkDir;

use crate::error::{Error, Result};

const IMAGE_PREFIX: &str = "image/";

/// A user-provided file: display name, declared media type and contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    media_type: String,
    data: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Reads a file from disk, declaring its media type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| Error::io(path, e))?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(Self::new(name, media_type_for(path), data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with(IMAGE_PREFIX)
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Declared media type of a path, judged by extension only.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Keeps the image files of a selection, in their original order.
pub fn filter_images<I>(files: I) -> Result<Vec<SelectedFile>>
where
    I: IntoIterator<Item = SelectedFile>,
{
    let images: Vec<SelectedFile> = files.into_iter().filter(SelectedFile::is_image).collect();
    if images.is_empty() {
        return Err(Error::NoValidImages);
    }
    Ok(images)
}

/// Every regular file below `root` (or `root` itself when it is a file).
pub fn collect_paths(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    paths
}

/// Loads the given paths, skipping those that cannot be read.
pub fn load_files(paths: &[PathBuf]) -> Vec<SelectedFile> {
    paths
        .iter()
        .filter_map(|path| match SelectedFile::from_path(path) {
            Ok(file) => Some(file),
            Err(e) => {
                log::warn!("skipping selection: {e}");
                None
            }
        })
        .collect()
}

/// Paths of one drag-and-drop gesture, kept in drop order.
///
/// The window reports one event per file. A gesture stays open while files
/// keep arriving and is taken as a whole once [`DropGesture::settle`] is
/// called with the ticket of its last drop. A hover after that starts a new
/// gesture.
#[derive(Debug, Default)]
pub struct DropGesture {
    paths: Vec<PathBuf>,
    ticket: u64,
    open: bool,
}

impl DropGesture {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_if_closed(&mut self) {
        if !self.open {
            self.paths.clear();
            self.open = true;
        }
    }

    pub fn hovered(&mut self) {
        self.begin_if_closed();
    }

    /// Adds a dropped path and returns the ticket to settle the gesture with.
    pub fn dropped(&mut self, path: PathBuf) -> u64 {
        self.begin_if_closed();
        self.paths.push(path);
        self.ticket += 1;
        self.ticket
    }

    /// Closes the gesture if `ticket` belongs to its latest drop.
    ///
    /// A stale ticket means more files arrived since; the gesture stays open.
    pub fn settle(&mut self, ticket: u64) -> Option<Vec<PathBuf>> {
        if !self.open || ticket != self.ticket || self.paths.is_empty() {
            return None;
        }
        self.open = false;
        Some(std::mem::take(&mut self.paths))
    }
}
