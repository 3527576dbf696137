use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::utils;

/// In-memory index of the audio library keyed by external id.
///
/// Built from a single directory walk per cycle.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    root: PathBuf,
    files: HashMap<String, PathBuf>,
}

impl LibraryIndex {
    /// Walks `root` once and records every audio file carrying an id marker.
    ///
    /// A missing root yields an empty index. When two files carry the same
    /// id the first one seen in walk order wins.
    pub fn scan(root: &Path) -> Self {
        let mut files = HashMap::new();

        if root.is_dir() {
            let walker = WalkDir::new(root)
                .min_depth(1)
                .follow_links(false)
                .sort_by_file_name();

            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() || !utils::is_audio_file(entry.path()) {
                    continue;
                }
                if let Some(id) = utils::external_id_from_path(entry.path()) {
                    files
                        .entry(id.to_string())
                        .or_insert_with(|| entry.path().to_path_buf());
                }
            }
        }

        Self {
            root: root.to_path_buf(),
            files,
        }
    }

    pub fn resolve(&self, external_id: &str) -> Option<&Path> {
        self.files.get(external_id).map(PathBuf::as_path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
