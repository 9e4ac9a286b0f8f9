//! Scoped workspace directories

use crate::error::{PorterError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

enum Dir {
    Temp(TempDir),
    Caller(PathBuf),
}

/// A directory exclusively owned by one harness run
///
/// Removed on drop unless `keep` was called.
pub struct Workspace {
    dir: Option<Dir>,
}

impl Workspace {
    /// A fresh directory under `root` (system temp dir when `None`)
    pub fn temporary(root: Option<&Path>) -> Result<Self> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("porter-");
            b
        };
        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root).map_err(|e| PorterError::workspace(root, e))?;
                let root = absolute(root)?;
                builder
                    .tempdir_in(&root)
                    .map_err(|e| PorterError::workspace(&root, e))?
            }
            None => builder
                .tempdir()
                .map_err(|e| PorterError::workspace(std::env::temp_dir(), e))?,
        };
        Ok(Self {
            dir: Some(Dir::Temp(dir)),
        })
    }

    /// Take over a caller-chosen path, which must be absent or empty
    ///
    /// The stored path is absolute so programs started inside the workspace
    /// resolve it the same way as this process.
    pub fn at(path: &Path) -> Result<Self> {
        if path.exists() {
            let mut entries = fs::read_dir(path).map_err(|e| PorterError::workspace(path, e))?;
            if entries.next().is_some() {
                return Err(PorterError::workspace(
                    path,
                    std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "workspace directory is not empty",
                    ),
                ));
            }
        } else {
            fs::create_dir_all(path).map_err(|e| PorterError::workspace(path, e))?;
        }
        Ok(Self {
            dir: Some(Dir::Caller(absolute(path)?)),
        })
    }

    /// `at(path)` when a path is given, otherwise `temporary(root)`
    pub fn acquire(requested: Option<&Path>, root: Option<&Path>) -> Result<Self> {
        match requested {
            Some(path) => Self::at(path),
            None => Self::temporary(root),
        }
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(Dir::Temp(dir)) => dir.path(),
            Some(Dir::Caller(path)) => path,
            None => Path::new(""),
        }
    }

    /// Write a file into the workspace
    pub fn write(&self, filename: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(filename);
        fs::write(&path, contents).map_err(|e| PorterError::workspace(&path, e))?;
        Ok(path)
    }

    /// Leave the directory on disk and return where it is
    #[allow(deprecated)]
    pub fn keep(mut self) -> PathBuf {
        match self.dir.take() {
            Some(Dir::Temp(dir)) => dir.into_path(),
            Some(Dir::Caller(path)) => path,
            None => PathBuf::new(),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| PorterError::workspace(path, e))
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // TempDir removes itself
        if let Some(Dir::Caller(path)) = self.dir.take() {
            if let Err(e) = fs::remove_dir_all(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove workspace");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let ws = Workspace::temporary(Some(root.path())).unwrap();
            ws.write("brain.c", "int main() { return 0; }").unwrap();
            assert!(ws.path().join("brain.c").exists());
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_kept_workspace_survives() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::temporary(Some(root.path())).unwrap();
        ws.write("brain.rb", "puts 1").unwrap();
        let kept = ws.keep();
        assert!(kept.join("brain.rb").exists());
        assert!(kept.starts_with(root.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_caller_path_must_be_empty() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("other.txt"), "x").unwrap();
        let err = Workspace::at(root.path()).err().unwrap();
        assert!(matches!(err, PorterError::Workspace { .. }));
        // untouched
        assert!(root.path().join("other.txt").exists());
    }

    #[test]
    fn test_caller_path_created_and_removed() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("run");
        {
            let ws = Workspace::acquire(Some(&target), None).unwrap();
            assert!(target.is_dir());
            assert_eq!(ws.path(), target.canonicalize().unwrap());
        }
        assert!(!target.exists());
    }

    /// `path` spelled relative to the current directory
    #[cfg(unix)]
    fn relative_to_cwd(path: &Path) -> PathBuf {
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        let path = path.canonicalize().unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        relative.push(path.strip_prefix("/").unwrap());
        relative
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_caller_path_made_absolute() {
        let root = tempfile::tempdir().unwrap();
        let target = relative_to_cwd(root.path()).join("run");
        assert!(target.is_relative());
        {
            let ws = Workspace::at(&target).unwrap();
            assert!(ws.path().is_absolute());
            assert_eq!(ws.path(), root.path().canonicalize().unwrap().join("run"));
        }
        assert!(!root.path().join("run").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_root_gives_absolute_temporary() {
        let root = tempfile::tempdir().unwrap();
        let relative = relative_to_cwd(root.path());
        let ws = Workspace::temporary(Some(&relative)).unwrap();
        assert!(ws.path().is_absolute());
        assert!(ws.path().starts_with(root.path().canonicalize().unwrap()));
    }
}
