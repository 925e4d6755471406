use crate::config::Format;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use log::debug;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Name marker carried by the in-progress file. A file whose name ends with
/// this marker belongs to the engine and must not be picked up downstream.
pub const STAGING_MARKER: &str = ".staging";

/// Finalized-name timestamp layout: UTC, underscore-separated, nanosecond
/// fraction. Zero padding keeps lexicographic order equal to time order.
const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S_%f";

/// Locate the directory's current staging file, if any.
///
/// Pure lookup — no file is created or touched. Finding more than one file
/// bearing the marker means something outside the engine planted one; the
/// engine refuses to guess which to keep writing to and reports
/// [`Error::InvariantViolation`] instead.
pub fn find_staging_file(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| Error::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut found: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::DirectoryUnavailable {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_name().to_string_lossy().ends_with(STAGING_MARKER) {
            found.push(entry.path());
        }
    }

    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        count => Err(Error::InvariantViolation {
            dir: dir.to_path_buf(),
            count,
        }),
    }
}

/// Path of the staging file the engine creates in `dir`.
pub fn staging_path(dir: &Path) -> PathBuf {
    dir.join(STAGING_MARKER)
}

/// Append one batch as a newline-terminated record, creating the file if
/// absent.
///
/// The newline delimiter keeps the finalized file a sequence of
/// independently parsable records; neither supported encoding emits a raw
/// newline inside a one-record payload. Data is synced before returning so
/// a rename observed by the consumer implies the records are on disk.
pub fn append_batch(path: &Path, batch: &[u8]) -> Result<()> {
    let write = |path: &Path| -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(batch)?;
        file.write_all(b"\n")?;
        file.sync_data()?;
        Ok(())
    };
    write(path).map_err(|source| Error::WriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("appended {} byte batch to {}", batch.len(), path.display());
    Ok(())
}

/// Current size of the staging file in bytes.
pub fn staging_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| Error::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Count the newline-terminated records already in the staging file.
///
/// Recovers the per-file event count after a restart: the counter is not
/// persisted anywhere else, but every accepted batch ends with a newline, so
/// the file itself is the durable record. A missing file counts as zero.
pub fn count_records(path: &Path) -> Result<u64> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(source) => {
            return Err(Error::WriteFailed {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut reader = BufReader::new(file);
    let mut records = 0u64;
    loop {
        let buf = reader.fill_buf().map_err(|source| Error::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        if buf.is_empty() {
            break;
        }
        records += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        let consumed = buf.len();
        reader.consume(consumed);
    }
    Ok(records)
}

/// Rename the staging file to its finalized name: a UTC timestamp plus the
/// format's extension.
///
/// A single atomic rename — never copy-then-delete — so a concurrent
/// directory scan only ever sees a file that is either staging or finalized.
/// If the computed name already exists (two rotations inside one clock
/// instant), the clock is re-captured until the name is free. On rename
/// failure the staging file is untouched and the next `accept` retries the
/// rotation decision.
pub fn finalize(staging: &Path, format: Format) -> Result<PathBuf> {
    let dir = staging.parent().unwrap_or_else(|| Path::new("."));

    let mut finalized = dir.join(finalized_name(Utc::now(), format));
    while finalized.exists() {
        std::thread::yield_now();
        finalized = dir.join(finalized_name(Utc::now(), format));
    }

    fs::rename(staging, &finalized).map_err(|source| Error::FinalizeFailed {
        staging: staging.to_path_buf(),
        finalized: finalized.clone(),
        source,
    })?;
    debug!(
        "finalized {} as {}",
        staging.display(),
        finalized.display()
    );
    Ok(finalized)
}

fn finalized_name(ts: DateTime<Utc>, format: Format) -> String {
    format!("{}.{}", ts.format(TIMESTAMP_FORMAT), format.extension())
}
