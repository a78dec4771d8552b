//! Image folder listing and stem lookup by extension priority.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{CatalogError, Result};

/// Image files present in one directory.
#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    /// Lowercased stem -> (extension priority, actual filename).
    by_stem: BTreeMap<String, (usize, String)>,
    /// Lowercased full filenames.
    names: HashSet<String>,
}

impl ImageIndex {
    /// Keep names whose extension is in `extensions` (highest priority first).
    pub fn from_filenames<I, S>(filenames: I, extensions: &[String]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = ImageIndex::default();
        for filename in filenames {
            let filename = filename.as_ref();
            let path = Path::new(filename);
            let (Some(stem), Some(ext)) = (path.file_stem(), path.extension()) else {
                continue;
            };
            let ext = ext.to_string_lossy();
            let Some(priority) = extensions.iter().position(|e| e.eq_ignore_ascii_case(&ext)) else {
                continue;
            };

            index.names.insert(filename.to_lowercase());
            let stem = stem.to_string_lossy().to_lowercase();
            let better = match index.by_stem.get(&stem) {
                Some((p, existing)) => (priority, filename) < (*p, existing.as_str()),
                None => true,
            };
            if better {
                index.by_stem.insert(stem, (priority, filename.to_string()));
            }
        }
        index
    }

    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }

    /// Actual filename for a stem, preferring the earliest listed extension.
    pub fn resolve(&self, stem: &str) -> Option<&str> {
        self.by_stem
            .get(&stem.to_lowercase())
            .map(|(_, name)| name.as_str())
    }

    /// One filename per stem, ordered by stem.
    pub fn preferred(&self) -> impl Iterator<Item = &str> {
        self.by_stem.values().map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_stem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_stem.is_empty()
    }
}

pub fn scan_images(dir: &Path, extensions: &[String]) -> Result<ImageIndex> {
    if !dir.is_dir() {
        return Err(CatalogError::MissingInput {
            path: dir.to_path_buf(),
        });
    }
    let mut filenames = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))? {
        let entry = entry.map_err(|e| CatalogError::io(dir, e))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            filenames.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    let index = ImageIndex::from_filenames(filenames, extensions);
    debug!(dir = %dir.display(), images = index.len(), "scanned image directory");
    Ok(index)
}
