#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use telesink::{FileSink, Format, RotationPolicy, STAGING_MARKER, SinkConfig};

pub fn count_sink(dir: &Path, events_per_file: u64) -> FileSink {
    FileSink::new(
        dir,
        RotationPolicy::EventsPerFile(events_per_file),
        Format::Json,
    )
}

pub fn size_sink(dir: &Path, limit_kb: u64) -> FileSink {
    FileSink::new(dir, RotationPolicy::SizeLimitKb(limit_kb), Format::Json)
}

pub fn json_config(path: &Path) -> SinkConfig {
    SinkConfig {
        path: path.to_path_buf(),
        file_size_kb: None,
        events_per_file: Some(5),
        format: "json".to_string(),
        default: None,
    }
}

/// A batch payload of exactly `kb` kilobytes (before the newline delimiter).
pub fn batch_of_kb(kb: usize) -> Vec<u8> {
    vec![b'x'; kb * 1024]
}

/// All files in `dir` bearing the staging marker.
pub fn staging_files(dir: &Path) -> Vec<PathBuf> {
    scan(dir, true)
}

/// All finalized files in `dir`, sorted by name (= finalize order).
pub fn finalized_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = scan(dir, false);
    files.sort();
    files
}

fn scan(dir: &Path, staging: bool) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with(STAGING_MARKER)
                == staging
        })
        .map(|entry| entry.path())
        .collect()
}

/// Records (newline-delimited) in a file, delimiter stripped.
pub fn records(path: &Path) -> Vec<String> {
    let contents = fs::read_to_string(path).unwrap();
    contents.lines().map(str::to_string).collect()
}
