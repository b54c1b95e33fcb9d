// src/discover/identifier.rs

use std::fmt;
use std::path::{Component, Path};

use crate::errors::{MpitasksError, Result};

/// Fully-qualified program name, e.g. `jromp.mpi.examples.Blocking`.
///
/// Segments are separated by [`ProgramIdentifier::SEPARATOR`] and are never
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramIdentifier(String);

impl ProgramIdentifier {
    /// Namespace separator of the host language.
    pub const SEPARATOR: char = '.';

    /// Parse an identifier given in dotted form (e.g. from the config file).
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MpitasksError::Configuration(
                "program identifier must not be empty".to_string(),
            ));
        }
        if trimmed.split(Self::SEPARATOR).any(|seg| !is_valid_segment(seg)) {
            return Err(MpitasksError::Configuration(format!(
                "invalid program identifier '{trimmed}'"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derive an identifier from a path relative to the discovery root.
    ///
    /// The extension (given with or without a leading dot) is stripped from
    /// the file name and the remaining path segments are joined with
    /// [`Self::SEPARATOR`]. Returns `None` when the file does not carry the
    /// extension or the path is not a plain relative path.
    pub fn from_relative_path(rel_path: &Path, extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.');
        if rel_path.extension()?.to_str()? != extension {
            return None;
        }

        let mut segments = Vec::new();
        let mut components = rel_path.components().peekable();
        while let Some(component) = components.next() {
            let Component::Normal(part) = component else {
                return None;
            };
            let part = if components.peek().is_none() {
                Path::new(part).file_stem()?.to_str()?
            } else {
                part.to_str()?
            };
            if !is_valid_segment(part) {
                return None;
            }
            segments.push(part);
        }

        if segments.is_empty() {
            return None;
        }
        let separator = Self::SEPARATOR.to_string();
        Some(Self(segments.join(separator.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR)
    }

    /// Last segment, e.g. `Blocking` for `examples.Blocking`.
    pub fn simple_name(&self) -> &str {
        self.segments().last().unwrap_or(self.0.as_str())
    }

    /// Identifier with all namespace separators removed.
    pub fn collapsed(&self) -> String {
        self.segments().collect()
    }

    /// Entry point under the given namespace prefix (no prefix when empty).
    pub fn qualified(&self, namespace_prefix: &str) -> String {
        let prefix = namespace_prefix.trim_end_matches(Self::SEPARATOR);
        if prefix.is_empty() {
            self.0.clone()
        } else {
            format!("{prefix}{}{}", Self::SEPARATOR, self.0)
        }
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.contains(ProgramIdentifier::SEPARATOR)
        && !segment.chars().any(char::is_whitespace)
}

impl fmt::Display for ProgramIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProgramIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
