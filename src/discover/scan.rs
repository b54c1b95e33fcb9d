// src/discover/scan.rs

//! Lazy, deterministic walk over a source tree.

use std::path::{Path, PathBuf};

use globset::GlobSet;
use regex::Regex;
use tracing::{debug, trace};

use crate::discover::identifier::ProgramIdentifier;
use crate::errors::{MpitasksError, Result};
use crate::fs::FileSystem;

/// Settings for one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoverySpec {
    /// Directory whose relative layout becomes the identifier namespace.
    pub root: PathBuf,
    /// Source extension, with or without the leading dot (e.g. `java`).
    pub extension: String,
    /// Paths (relative to `root`, forward slashes) to skip.
    pub exclude: Option<GlobSet>,
    /// If set, only files whose contents match are considered runnable.
    pub entry_marker: Option<Regex>,
}

impl DiscoverySpec {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            exclude: None,
            entry_marker: None,
        }
    }

    pub fn with_exclude(mut self, exclude: GlobSet) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn with_entry_marker(mut self, marker: Regex) -> Self {
        self.entry_marker = Some(marker);
        self
    }

    fn has_extension(&self, path: &Path) -> bool {
        let wanted = self.extension.trim_start_matches('.');
        path.extension().and_then(|e| e.to_str()) == Some(wanted)
    }
}

/// Depth-first walk yielding every file under `root` with the wanted
/// extension.
///
/// Directory entries are visited sorted by path, so the order only depends
/// on the tree contents. Symlinked directories below the root are not
/// entered, so every yielded path lies inside the root exactly once.
pub(crate) struct SourceWalk<'a> {
    fs: &'a dyn FileSystem,
    spec: &'a DiscoverySpec,
    // Pending entries, last element is visited next.
    stack: Vec<PathBuf>,
}

impl<'a> SourceWalk<'a> {
    /// Start a walk; fails if the root is missing or cannot be listed.
    pub(crate) fn start(fs: &'a dyn FileSystem, spec: &'a DiscoverySpec) -> Result<Self> {
        let root = &spec.root;
        if !fs.exists(root) {
            return Err(MpitasksError::Discovery(format!(
                "discovery root {:?} does not exist",
                root
            )));
        }
        if !fs.is_dir(root) {
            return Err(MpitasksError::Discovery(format!(
                "discovery root {:?} is not a directory",
                root
            )));
        }

        let stack = sorted_children(fs, root)?;
        debug!(root = ?root, entries = stack.len(), "discovery walk started");
        Ok(Self { fs, spec, stack })
    }
}

impl Iterator for SourceWalk<'_> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.stack.pop() {
            if self.fs.is_dir(&path) {
                // A linked directory may lead outside the root or back into it.
                if self.fs.is_symlink(&path) {
                    debug!(path = ?path, "not following symlinked directory");
                    continue;
                }
                match sorted_children(self.fs, &path) {
                    Ok(children) => self.stack.extend(children),
                    Err(e) => return Some(Err(e)),
                }
            } else if self.fs.is_file(&path) && self.spec.has_extension(&path) {
                return Some(Ok(path));
            }
        }
        None
    }
}

/// Children of `dir`, sorted in reverse so that popping yields ascending order.
fn sorted_children(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = fs.read_dir(dir).map_err(|e| {
        MpitasksError::Discovery(format!("cannot read directory {:?}: {e:#}", dir))
    })?;
    children.sort_by(|a, b| b.cmp(a));
    Ok(children)
}

/// Lazy sequence of runnable programs under a discovery root.
pub struct ProgramIter<'a> {
    walk: SourceWalk<'a>,
}

impl<'a> ProgramIter<'a> {
    pub(crate) fn new(walk: SourceWalk<'a>) -> Self {
        Self { walk }
    }

    fn accept(&self, path: &Path) -> Result<Option<ProgramIdentifier>> {
        let spec = self.walk.spec;
        let Ok(rel) = path.strip_prefix(&spec.root) else {
            return Ok(None);
        };

        if let Some(exclude) = &spec.exclude {
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if exclude.is_match(&rel_str) {
                trace!(path = %rel_str, "excluded from discovery");
                return Ok(None);
            }
        }

        let Some(id) = ProgramIdentifier::from_relative_path(rel, &spec.extension) else {
            debug!(path = ?rel, "skipping source with no valid identifier");
            return Ok(None);
        };

        if let Some(marker) = &spec.entry_marker {
            let contents = self.walk.fs.read_to_string(path).map_err(|e| {
                MpitasksError::Discovery(format!("cannot read source {:?}: {e:#}", path))
            })?;
            if !marker.is_match(&contents) {
                trace!(program = %id, "no entry point marker; not runnable");
                return Ok(None);
            }
        }

        Ok(Some(id))
    }
}

impl Iterator for ProgramIter<'_> {
    type Item = Result<ProgramIdentifier>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = match self.walk.next()? {
                Ok(path) => path,
                Err(e) => return Some(Err(e)),
            };
            match self.accept(&path) {
                Ok(Some(id)) => return Some(Ok(id)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
