use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathMappingError {
    #[error("{0} prefix must not be empty")]
    Empty(&'static str),
    #[error("{side} prefix must be absolute, got '{value}'")]
    NotAbsolute { side: &'static str, value: String },
    #[error("{0} must not contain '..' components")]
    ParentComponent(String),
    #[error("{0} is not located under the local mount")]
    OutsideLocalRoot(PathBuf),
    #[error("{0} is not valid UTF-8")]
    NonUtf8(PathBuf),
}

/// Two-way mapping between the local library namespace and the media
/// server's view of the same files.
///
/// Both sides name the same mount: `local_root` is where this process sees
/// it, `remote_root` is where the media server sees it. Remote paths always
/// use `/` as separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    local_root: PathBuf,
    remote_root: String,
}

impl PathMapping {
    pub fn new(local_root: impl AsRef<Path>, remote_root: &str) -> Result<Self, PathMappingError> {
        let local_root = local_root.as_ref();
        if local_root.as_os_str().is_empty() {
            return Err(PathMappingError::Empty("local"));
        }
        if !local_root.is_absolute() {
            return Err(PathMappingError::NotAbsolute {
                side: "local",
                value: local_root.display().to_string(),
            });
        }
        if local_root
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(PathMappingError::ParentComponent(
                local_root.display().to_string(),
            ));
        }

        let remote_root = remote_root.trim();
        if remote_root.is_empty() {
            return Err(PathMappingError::Empty("remote"));
        }
        if !remote_root.starts_with('/') {
            return Err(PathMappingError::NotAbsolute {
                side: "remote",
                value: remote_root.to_string(),
            });
        }
        if remote_root.split('/').any(|segment| segment == "..") {
            return Err(PathMappingError::ParentComponent(remote_root.to_string()));
        }

        let trimmed = remote_root.trim_end_matches('/');
        Ok(Self {
            local_root: local_root.components().collect(),
            remote_root: if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            },
        })
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn remote_root(&self) -> &str {
        &self.remote_root
    }

    pub fn contains_local(&self, path: &Path) -> bool {
        path.starts_with(&self.local_root)
            && !path.components().any(|c| matches!(c, Component::ParentDir))
    }

    /// Translates a local path into the media server's namespace.
    pub fn to_remote(&self, local: &Path) -> Result<String, PathMappingError> {
        let relative = local
            .strip_prefix(&self.local_root)
            .map_err(|_| PathMappingError::OutsideLocalRoot(local.to_path_buf()))?;

        let mut remote = self.remote_root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| PathMappingError::NonUtf8(local.to_path_buf()))?;
                    if !remote.ends_with('/') {
                        remote.push('/');
                    }
                    remote.push_str(part);
                }
                Component::CurDir => {}
                _ => return Err(PathMappingError::ParentComponent(local.display().to_string())),
            }
        }
        Ok(remote)
    }

    /// Translates a media server path back into the local namespace.
    ///
    /// Paths outside the remote mount cannot refer to local files and yield
    /// `None`.
    pub fn to_local(&self, remote: &str) -> Option<PathBuf> {
        let rest = if self.remote_root == "/" {
            remote.strip_prefix('/')?
        } else {
            let rest = remote.strip_prefix(self.remote_root.as_str())?;
            if rest.is_empty() {
                ""
            } else {
                rest.strip_prefix('/')?
            }
        };

        let mut local = self.local_root.clone();
        for segment in rest.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." {
                return None;
            }
            local.push(segment);
        }
        Some(local)
    }
}
