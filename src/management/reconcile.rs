use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    management::{PathMapping, manifest},
    utils, warning,
};

/// Frozen set of local paths that must survive an eviction pass.
#[derive(Debug, Clone, Default)]
pub struct ProtectionSet {
    paths: HashSet<PathBuf>,
}

impl ProtectionSet {
    /// Unions the remote-protected files with every manifest entry on disk.
    ///
    /// Remote paths that fall outside the media server mount are ignored since
    /// they cannot name a local file. Unreadable manifests are reported in
    /// `errors` and contribute nothing.
    pub fn build(
        mapping: &PathMapping,
        protected_remote_files: &[String],
        playlists_dir: &Path,
        errors: &mut Vec<String>,
    ) -> Self {
        let mut paths = HashSet::new();

        for remote in protected_remote_files {
            if let Some(local) = mapping.to_local(remote) {
                paths.insert(local);
            }
        }

        let manifests = match manifest::list_manifests(playlists_dir) {
            Ok(manifests) => manifests,
            Err(e) => {
                errors.push(format!(
                    "Cannot list manifests in {}: {}",
                    playlists_dir.display(),
                    e
                ));
                Vec::new()
            }
        };

        for path in manifests {
            match manifest::read_manifest(&path) {
                Ok(entries) => {
                    for entry in entries {
                        if let Some(local) = mapping.to_local(&entry) {
                            paths.insert(local);
                        }
                    }
                }
                Err(e) => errors.push(format!("Cannot read manifest {}: {}", path.display(), e)),
            }
        }

        Self { paths }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvictionReport {
    /// `false` when eviction is configured off and nothing was inspected.
    pub enabled: bool,
    pub dry_run: bool,
    pub protected: usize,
    pub deleted_files: Vec<PathBuf>,
    pub deleted_dirs: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl EvictionReport {
    pub fn is_empty(&self) -> bool {
        self.deleted_files.is_empty() && self.deleted_dirs.is_empty()
    }
}

/// The eviction engine: deletes library files no manifest or protected
/// remote playlist references, then prunes directories left without audio.
#[derive(Debug, Clone)]
pub struct StorageReconciler {
    library_root: PathBuf,
    playlists_dir: PathBuf,
    mapping: PathMapping,
    enabled: bool,
}

impl StorageReconciler {
    /// Creates a reconciler over one library.
    ///
    /// # Arguments
    ///
    /// * `library_root` - Directory whose audio files are candidates for eviction
    /// * `playlists_dir` - Manifests here decide which files are referenced;
    ///   it is never pruned, even inside `library_root`
    /// * `mapping` - Turns manifest and Plex paths back into local ones
    /// * `enabled` - When false every run is a no-op with an empty report
    pub fn new(
        library_root: PathBuf,
        playlists_dir: PathBuf,
        mapping: PathMapping,
        enabled: bool,
    ) -> Self {
        Self {
            library_root,
            playlists_dir,
            mapping,
            enabled,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Deletes every audio file that no manifest and no protected Plex
    /// playlist references, then prunes directories left empty.
    ///
    /// # Arguments
    ///
    /// * `protected_remote_files` - Member files of protected Plex playlists,
    ///   in the media server's namespace
    ///
    /// # Returns
    ///
    /// What was deleted, plus any per-file errors. Failures never abort the pass.
    pub fn reconcile(&self, protected_remote_files: &[String]) -> EvictionReport {
        self.run(protected_remote_files, false)
    }

    /// Reports what [`StorageReconciler::reconcile`] would delete without deleting.
    pub fn plan(&self, protected_remote_files: &[String]) -> EvictionReport {
        self.run(protected_remote_files, true)
    }

    fn run(&self, protected_remote_files: &[String], dry_run: bool) -> EvictionReport {
        if !self.enabled {
            return EvictionReport::default();
        }

        let mut report = EvictionReport {
            enabled: true,
            dry_run,
            ..Default::default()
        };

        // The set is complete before the first delete.
        let protection = ProtectionSet::build(
            &self.mapping,
            protected_remote_files,
            &self.playlists_dir,
            &mut report.errors,
        );
        report.protected = protection.len();

        if !self.library_root.is_dir() {
            return report;
        }

        let mut surviving_audio: Vec<PathBuf> = Vec::new();
        let mut dirs: Vec<PathBuf> = Vec::new();

        // The manifest directory is never evicted, even when it sits inside
        // the library root.
        let walker = WalkDir::new(&self.library_root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.path() != self.playlists_dir);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.errors.push(format!("Walk error: {}", e));
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_dir() {
                dirs.push(path.to_path_buf());
                continue;
            }
            if !utils::is_audio_file(path) {
                continue;
            }
            if protection.contains(path) {
                surviving_audio.push(path.to_path_buf());
                continue;
            }

            if dry_run {
                report.deleted_files.push(path.to_path_buf());
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => report.deleted_files.push(path.to_path_buf()),
                Err(e) => {
                    warning!("Could not delete {}: {}", path.display(), e);
                    report
                        .errors
                        .push(format!("Cannot delete {}: {}", path.display(), e));
                    surviving_audio.push(path.to_path_buf());
                }
            }
        }

        // Every ancestor of a surviving audio file, or of a nested manifest
        // directory, has to stay.
        let nested_playlists = self
            .playlists_dir
            .starts_with(&self.library_root)
            .then_some(&self.playlists_dir);
        let mut keep_dirs: HashSet<PathBuf> = HashSet::new();
        for file in surviving_audio.iter().chain(nested_playlists) {
            for ancestor in file.ancestors().skip(1) {
                if ancestor == self.library_root || !keep_dirs.insert(ancestor.to_path_buf()) {
                    break;
                }
            }
        }

        // Deepest first.
        dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
        for dir in dirs {
            if keep_dirs.contains(&dir) {
                continue;
            }
            if dry_run {
                report.deleted_dirs.push(dir);
                continue;
            }
            match fs::remove_dir_all(&dir) {
                Ok(()) => report.deleted_dirs.push(dir),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warning!("Could not remove directory {}: {}", dir.display(), e);
                    report
                        .errors
                        .push(format!("Cannot remove {}: {}", dir.display(), e));
                }
            }
        }

        report
    }
}
