// src/discover/mod.rs

//! Program discovery.
//!
//! - [`identifier`] defines [`ProgramIdentifier`] and the pure path →
//!   identifier derivation.
//! - [`scan`] walks a source tree lazily and yields one identifier per
//!   runnable source file.

pub mod identifier;
pub mod scan;

use std::path::PathBuf;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::Result;
use crate::fs::FileSystem;

pub use identifier::ProgramIdentifier;
pub use scan::{DiscoverySpec, ProgramIter};

use scan::SourceWalk;

/// Start discovering programs under `spec.root`.
///
/// The root is checked eagerly; the tree itself is walked lazily as the
/// returned iterator is consumed. A root with no matching files yields an
/// empty sequence.
pub fn discover<'a>(fs: &'a dyn FileSystem, spec: &'a DiscoverySpec) -> Result<ProgramIter<'a>> {
    let walk = SourceWalk::start(fs, spec)?;
    Ok(ProgramIter::new(walk))
}

/// Discover all programs, stopping at the first error.
pub fn discover_all(fs: &dyn FileSystem, spec: &DiscoverySpec) -> Result<Vec<ProgramIdentifier>> {
    discover(fs, spec)?.collect()
}

/// Every source file under the root with the spec's extension, ignoring
/// `exclude` and `entry_marker`.
///
/// Helper sources that are not programs still feed the compile step, so the
/// compile fingerprint is computed over this list.
pub fn collect_sources(fs: &dyn FileSystem, spec: &DiscoverySpec) -> Result<Vec<PathBuf>> {
    SourceWalk::start(fs, spec)?.collect()
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MpitasksError;
    use crate::fs::mock::MockFileSystem;
    use regex::Regex;
    use std::path::Path;

    fn example_tree() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("src/examples/Cross.java", "class Cross { static void main() {} }");
        fs.add_file("src/examples/Blocking.java", "class Blocking { static void main() {} }");
        fs.add_file("src/examples/Utils.java", "class Utils {}");
        fs.add_file("src/examples/nested/Burro.java", "class Burro { static void main() {} }");
        fs.add_file("src/examples/notes.txt", "not a program");
        fs.add_file("src/other/Outside.java", "class Outside { static void main() {} }");
        fs
    }

    fn names(ids: Vec<ProgramIdentifier>) -> Vec<String> {
        ids.into_iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn yields_one_identifier_per_matching_file_in_sorted_order() {
        let fs = example_tree();
        let spec = DiscoverySpec::new("src/examples", "java");

        let ids = discover_all(&fs, &spec).unwrap();
        assert_eq!(
            names(ids),
            vec!["Blocking", "Cross", "Utils", "nested.Burro"]
        );
    }

    #[test]
    fn exclude_and_entry_marker_filter_helpers() {
        let fs = example_tree();
        let spec = DiscoverySpec::new("src/examples", "java")
            .with_exclude(build_globset(&["nested/**".to_string()]).unwrap())
            .with_entry_marker(Regex::new(r"static\s+void\s+main").unwrap());

        let ids = discover_all(&fs, &spec).unwrap();
        assert_eq!(names(ids), vec!["Blocking", "Cross"]);
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let fs = example_tree();
        let spec = DiscoverySpec::new("src/missing", "java");
        assert!(matches!(discover(&fs, &spec), Err(MpitasksError::Discovery(_))));
    }

    #[test]
    fn file_root_is_a_discovery_error() {
        let fs = example_tree();
        let spec = DiscoverySpec::new("src/examples/Cross.java", "java");
        assert!(matches!(discover(&fs, &spec), Err(MpitasksError::Discovery(_))));
    }

    #[test]
    fn empty_root_is_not_an_error() {
        let fs = MockFileSystem::new();
        fs.add_dir("empty");
        let spec = DiscoverySpec::new("empty", "java");
        assert_eq!(discover(&fs, &spec).unwrap().count(), 0);
    }

    #[test]
    fn unreadable_nested_dir_surfaces_as_item_error() {
        let fs = MockFileSystem::new();
        fs.add_file("root/A.java", "");
        fs.add_unreadable_dir("root/locked");
        let spec = DiscoverySpec::new("root", "java");

        let items: Vec<_> = discover(&fs, &spec).unwrap().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().as_str(), "A");
        assert!(matches!(items[1], Err(MpitasksError::Discovery(_))));
    }

    #[test]
    fn symlinked_directories_are_not_followed() {
        let fs = MockFileSystem::new();
        fs.add_file("work/root/A.java", "");
        fs.add_file("work/Outside.java", "");
        fs.add_symlink("work/root/up", "..");
        fs.add_symlink("work/root/again", "work/root");
        let spec = DiscoverySpec::new("work/root", "java");

        // The links resolve to real directories, they are just not entered.
        assert!(fs.is_dir(Path::new("work/root/up")));
        let ids = discover_all(&fs, &spec).unwrap();
        assert_eq!(names(ids), vec!["A"]);
    }

    #[test]
    fn collect_sources_ignores_program_filters() {
        let fs = example_tree();
        let spec = DiscoverySpec::new("src/examples", "java")
            .with_entry_marker(Regex::new("main").unwrap());

        let sources = collect_sources(&fs, &spec).unwrap();
        assert_eq!(sources.len(), 4);
    }
}
