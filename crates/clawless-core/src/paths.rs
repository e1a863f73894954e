//! Path roots and the sandbox every filesystem-touching tool goes through.
//!
//! A caller-supplied relative path is joined onto one of three fixed roots,
//! canonicalized (`.`, `..` and symlinks resolved), and only then compared
//! against the root. Nothing is read or written before that check passes.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::config::PathsConfig;

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SandboxError {
    /// The resolved path is not a descendant of the root.
    #[error("Path escapes sandbox root: {path} is outside {root}")]
    Escape { root: PathBuf, path: PathBuf },

    /// A root or a symlink along the path could not be resolved.
    #[error("cannot resolve {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ─────────────────────────────────────────────
// PathRoots
// ─────────────────────────────────────────────

/// The three canonical sandbox roots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathRoots {
    pub config_root: PathBuf,
    pub internal_root: PathBuf,
    pub shared_root: PathBuf,
}

impl PathRoots {
    /// Canonicalize three existing directories.
    pub fn new(
        config_root: impl AsRef<Path>,
        internal_root: impl AsRef<Path>,
        shared_root: impl AsRef<Path>,
    ) -> Result<Self, SandboxError> {
        Ok(Self {
            config_root: canonical_root(config_root.as_ref())?,
            internal_root: canonical_root(internal_root.as_ref())?,
            shared_root: canonical_root(shared_root.as_ref())?,
        })
    }

    /// Build from config. The directories must already exist (see `PathsConfig::ensure`).
    pub fn from_config(paths: &PathsConfig) -> Result<Self, SandboxError> {
        Self::new(paths.config_root(), paths.internal_root(), paths.shared_root())
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf, SandboxError> {
    std::fs::canonicalize(root).map_err(|source| SandboxError::Io {
        path: root.to_path_buf(),
        source,
    })
}

// ─────────────────────────────────────────────
// PathSandbox
// ─────────────────────────────────────────────

/// Resolves relative paths against the roots, rejecting escapes.
#[derive(Clone, Debug)]
pub struct PathSandbox {
    roots: PathRoots,
}

impl PathSandbox {
    pub fn new(roots: PathRoots) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &PathRoots {
        &self.roots
    }

    /// Resolve `relative` under `root`.
    ///
    /// Fails with [`SandboxError::Escape`] unless the canonical result is
    /// `root` itself or one of its descendants. Absolute inputs replace the
    /// root when joined and are therefore rejected unless they already point
    /// inside it.
    pub fn resolve(
        &self,
        root: &Path,
        relative: impl AsRef<Path>,
    ) -> Result<PathBuf, SandboxError> {
        let root = canonicalize_lenient(root)?;
        let resolved = canonicalize_lenient(&root.join(relative.as_ref()))?;
        if !resolved.starts_with(&root) {
            warn!(
                root = %root.display(),
                path = %resolved.display(),
                "sandbox violation"
            );
            return Err(SandboxError::Escape {
                root,
                path: resolved,
            });
        }
        Ok(resolved)
    }

    pub fn resolve_config(&self, relative: impl AsRef<Path>) -> Result<PathBuf, SandboxError> {
        self.resolve(&self.roots.config_root, relative)
    }

    pub fn resolve_internal(&self, relative: impl AsRef<Path>) -> Result<PathBuf, SandboxError> {
        self.resolve(&self.roots.internal_root, relative)
    }

    pub fn resolve_shared(&self, relative: impl AsRef<Path>) -> Result<PathBuf, SandboxError> {
        self.resolve(&self.roots.shared_root, relative)
    }
}

/// Canonicalize a path whose tail may not exist yet.
///
/// Components are walked left to right; every symlink met on the way is
/// replaced by its canonical target, and `..` pops the already-resolved
/// prefix. Missing components are kept lexically.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf, SandboxError> {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                let is_link = std::fs::symlink_metadata(&resolved)
                    .map(|meta| meta.file_type().is_symlink())
                    .unwrap_or(false);
                if is_link {
                    resolved = std::fs::canonicalize(&resolved).map_err(|source| {
                        SandboxError::Io {
                            path: resolved.clone(),
                            source,
                        }
                    })?;
                }
            }
        }
    }
    Ok(resolved)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
