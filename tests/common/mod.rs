#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub use mpitasks_test_utils::builders;
pub use mpitasks_test_utils::fake_launcher;
pub use mpitasks_test_utils::{capture_logs, init_tracing, with_timeout};

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
