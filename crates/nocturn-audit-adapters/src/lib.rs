#![forbid(unsafe_code)]

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    EffectDenied {
        effect: &'static str,
        detail: String,
    },
    PathViolation {
        path: PathBuf,
        detail: String,
    },
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EffectDenied { effect, detail } => {
                write!(f, "effect denied: {effect} ({detail})")
            }
            Self::PathViolation { path, detail } => {
                write!(f, "path violation: {} ({detail})", path.display())
            }
            Self::Io { op, path, detail } => {
                write!(f, "io error: {op} {} ({detail})", path.display())
            }
        }
    }
}

impl std::error::Error for AdapterError {}

pub fn canonicalize_from_repo_root(repo_root: &Path, path: &Path) -> Result<PathBuf, AdapterError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    };
    joined.canonicalize().map_err(|err| AdapterError::Io {
        op: "canonicalize",
        path: joined,
        detail: err.to_string(),
    })
}

/// Report artifacts may only land under `artifacts/audit/<run_id>/`.
pub fn ensure_write_path_under_artifacts(
    repo_root: &Path,
    run_id: &str,
    target: &Path,
) -> Result<PathBuf, AdapterError> {
    let write_root = repo_root.join("artifacts").join("audit").join(run_id);
    fs::create_dir_all(&write_root).map_err(|err| AdapterError::Io {
        op: "create_dir_all",
        path: write_root.clone(),
        detail: err.to_string(),
    })?;

    let absolute_target = if target.is_absolute() {
        target.to_path_buf()
    } else {
        repo_root.join(target)
    };

    if let Some(parent) = absolute_target.parent() {
        fs::create_dir_all(parent).map_err(|err| AdapterError::Io {
            op: "create_dir_all",
            path: parent.to_path_buf(),
            detail: err.to_string(),
        })?;
    }

    let normalized_root = normalize_path(&write_root);
    let normalized_target = normalize_path(&absolute_target);

    if !normalized_target.starts_with(&normalized_root) {
        return Err(AdapterError::PathViolation {
            path: absolute_target,
            detail: format!("writes allowed only under {}", normalized_root.display()),
        });
    }
    Ok(absolute_target)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub trait Fs {
    fn read_text(&self, repo_root: &Path, path: &Path) -> Result<String, AdapterError>;
    fn exists(&self, repo_root: &Path, path: &Path) -> bool;
    fn canonicalize(&self, repo_root: &Path, path: &Path) -> Result<PathBuf, AdapterError>;
}

pub trait FsWrite {
    fn write_text(
        &self,
        repo_root: &Path,
        run_id: &str,
        path: &Path,
        content: &str,
    ) -> Result<PathBuf, AdapterError>;
}

#[derive(Debug, Default)]
pub struct RealFs;

impl Fs for RealFs {
    fn read_text(&self, repo_root: &Path, path: &Path) -> Result<String, AdapterError> {
        let target = canonicalize_from_repo_root(repo_root, path)?;
        fs::read_to_string(&target).map_err(|err| AdapterError::Io {
            op: "read_to_string",
            path: target,
            detail: err.to_string(),
        })
    }

    fn exists(&self, repo_root: &Path, path: &Path) -> bool {
        let target = if path.is_absolute() {
            path.to_path_buf()
        } else {
            repo_root.join(path)
        };
        target.exists()
    }

    fn canonicalize(&self, repo_root: &Path, path: &Path) -> Result<PathBuf, AdapterError> {
        canonicalize_from_repo_root(repo_root, path)
    }
}

impl FsWrite for RealFs {
    fn write_text(
        &self,
        repo_root: &Path,
        run_id: &str,
        path: &Path,
        content: &str,
    ) -> Result<PathBuf, AdapterError> {
        let target = ensure_write_path_under_artifacts(repo_root, run_id, path)?;
        fs::write(&target, content).map_err(|err| AdapterError::Io {
            op: "write",
            path: target.clone(),
            detail: err.to_string(),
        })?;
        Ok(target)
    }
}

/// Denies artifact writes; used when `--allow-write` is absent.
#[derive(Debug, Default)]
pub struct DeniedFsWrite;

impl FsWrite for DeniedFsWrite {
    fn write_text(
        &self,
        _repo_root: &Path,
        _run_id: &str,
        path: &Path,
        _content: &str,
    ) -> Result<PathBuf, AdapterError> {
        Err(AdapterError::EffectDenied {
            effect: "fs_write",
            detail: format!("attempted to write `{}`", path.display()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub fs_write: bool,
}

impl Capabilities {
    pub fn deny_all() -> Self {
        Self { fs_write: false }
    }

    pub fn from_cli_flags(allow_fs_write: bool) -> Self {
        Self {
            fs_write: allow_fs_write,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_guard_allows_only_artifacts_run_root() {
        let repo = TempDir::new().expect("tempdir");
        let fs_adapter = RealFs;
        let allowed = PathBuf::from("artifacts/audit/run_one/report.json");
        let denied = PathBuf::from("ops/out.json");

        let ok = fs_adapter.write_text(repo.path(), "run_one", &allowed, "{}");
        assert!(ok.is_ok());

        let fail = fs_adapter.write_text(repo.path(), "run_one", &denied, "{}");
        assert!(matches!(fail, Err(AdapterError::PathViolation { .. })));
    }

    #[test]
    fn write_guard_rejects_parent_escapes() {
        let repo = TempDir::new().expect("tempdir");
        let fs_adapter = RealFs;
        let escape = PathBuf::from("artifacts/audit/run_one/../../../etc/report.json");
        let fail = fs_adapter.write_text(repo.path(), "run_one", &escape, "{}");
        assert!(matches!(fail, Err(AdapterError::PathViolation { .. })));
    }

    #[test]
    fn denied_fs_write_blocks_artifacts() {
        let writer = DeniedFsWrite;
        let err = writer
            .write_text(Path::new("."), "run_one", Path::new("report.json"), "{}")
            .expect_err("must fail");
        assert!(matches!(
            err,
            AdapterError::EffectDenied {
                effect: "fs_write",
                ..
            }
        ));
    }

    #[test]
    fn real_fs_reads_relative_to_repo_root() {
        let repo = TempDir::new().expect("tempdir");
        fs::write(repo.path().join("robots.txt"), "User-agent: *\n").expect("write");
        let fs_adapter = RealFs;
        let text = fs_adapter
            .read_text(repo.path(), Path::new("robots.txt"))
            .expect("read");
        assert!(text.starts_with("User-agent"));
        assert!(fs_adapter.exists(repo.path(), Path::new("robots.txt")));
        assert!(!fs_adapter.exists(repo.path(), Path::new("missing.txt")));
    }

    #[test]
    fn capabilities_from_cli_flags_maps_fs_write() {
        assert!(Capabilities::from_cli_flags(true).fs_write);
        assert!(!Capabilities::from_cli_flags(false).fs_write);
        assert!(!Capabilities::deny_all().fs_write);
    }
}
