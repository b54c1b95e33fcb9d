// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // child names
    /// A directory that exists but refuses to be listed.
    Unreadable,
    /// Symbolic link to another path of the tree.
    Symlink(PathBuf),
}

// Links followed before giving up, like ELOOP.
const MAX_LINK_HOPS: usize = 8;

/// In-memory tree for discovery tests.
///
/// Parents of added files are created implicitly. Paths are stored exactly as
/// given, so tests should stick to one style (all relative or all absolute).
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        // A panicking test thread must not poison the tree for the others.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(path.clone(), MockEntry::File(content.into()));
        Self::link_into_parent(&mut files, &path);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        Self::ensure_dir_entry(&mut files, &path);
    }

    /// Add a directory whose listing fails, to exercise error paths.
    pub fn add_unreadable_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(path.clone(), MockEntry::Unreadable);
        Self::link_into_parent(&mut files, &path);
    }

    /// Add a symbolic link at `path` pointing to `target`.
    ///
    /// `target` is a tree path, or relative to the link's parent when it
    /// starts with `..` or `.`.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(path.clone(), MockEntry::Symlink(target.as_ref().to_path_buf()));
        Self::link_into_parent(&mut files, &path);
    }

    /// Follow links starting at `path`; `None` if the chain dangles or loops.
    fn resolve(files: &HashMap<PathBuf, MockEntry>, path: &Path) -> Option<MockEntry> {
        let mut current = path.to_path_buf();
        for _ in 0..=MAX_LINK_HOPS {
            match files.get(&current)? {
                MockEntry::Symlink(target) => {
                    current = Self::link_target(&current, target);
                }
                entry => return Some(entry.clone()),
            }
        }
        None
    }

    fn link_target(link: &Path, target: &Path) -> PathBuf {
        let relative = matches!(
            target.components().next(),
            Some(std::path::Component::ParentDir | std::path::Component::CurDir)
        );
        if !relative {
            return target.to_path_buf();
        }
        let mut base = Self::parent_of(link).unwrap_or(Path::new(".")).to_path_buf();
        for component in target.components() {
            match component {
                std::path::Component::ParentDir => {
                    base = match Self::parent_of(&base) {
                        Some(parent) if base != Path::new(".") => parent.to_path_buf(),
                        _ => PathBuf::from(".."),
                    };
                }
                std::path::Component::CurDir => {}
                other => base.push(other),
            }
        }
        base
    }

    fn parent_of(path: &Path) -> Option<&Path> {
        path.parent().map(|parent| {
            if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            }
        })
    }

    fn link_into_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = Self::parent_of(path) else {
            return;
        };
        if parent == path {
            return;
        }
        Self::ensure_dir_entry(files, parent);
        if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        Self::link_into_parent(files, path);
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match Self::resolve(&self.lock(), path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        match Self::resolve(&self.lock(), path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content))),
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        Self::resolve(&self.lock(), path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(Self::resolve(&self.lock(), path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            Self::resolve(&self.lock(), path),
            Some(MockEntry::Dir(_)) | Some(MockEntry::Unreadable)
        )
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Symlink(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match Self::resolve(&self.lock(), path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            Some(MockEntry::Unreadable) => Err(anyhow!("Permission denied: {:?}", path)),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
