use crate::config::{Format, SinkConfig};
use crate::error::{Error, Result};
use crate::policy::RotationPolicy;
use crate::staging;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Join a base path with an optional sub-category label (telemetry kind).
///
/// Pure path arithmetic — nothing is created. The engine itself never
/// hard-codes per-kind subdirectories; the host decides the layout and hands
/// each sink exactly one directory.
pub fn resolve_target_dir(base: impl AsRef<Path>, label: Option<&str>) -> PathBuf {
    match label {
        Some(label) => base.as_ref().join(label),
        None => base.as_ref().to_path_buf(),
    }
}

/// Create the target directory if absent.
///
/// The engine calls this on every accept before touching the staging file;
/// exposed so hosts can surface a bad path at configuration time instead of
/// on the first batch.
pub fn ensure_target_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    })
}

/// Per-directory counters, only mutated under the sink's lock.
struct SinkState {
    /// Batches appended to the current staging file. `None` until the first
    /// `accept` syncs it with the records already on disk, so a restart
    /// resumes counting where the staging file left off.
    current_event_count: Option<u64>,
}

/// The staging-file rotation engine for one target directory.
///
/// Each incoming batch enters through [`accept`], which holds a single lock
/// for the whole call: locate or create the staging file, evaluate the
/// rotation policy, append the batch, and — when the policy trips — rename
/// the staging file to its timestamped finalized name. Callers on any number
/// of threads observe the calls fully serialized, in lock-acquisition order.
///
/// Distinct target directories are independent units of concurrency: give
/// each its own `FileSink`. The engine assumes exclusive ownership of files
/// bearing the staging marker inside its directory.
///
/// [`accept`]: FileSink::accept
///
/// ```no_run
/// use telesink::{FileSink, Format, RotationPolicy};
///
/// let sink = FileSink::new(
///     "/var/lib/telemetry/traces",
///     RotationPolicy::EventsPerFile(10),
///     Format::Json,
/// );
/// sink.accept(br#"{"spans":[]}"#).unwrap();
/// ```
pub struct FileSink {
    dir: PathBuf,
    policy: RotationPolicy,
    format: Format,
    state: Mutex<SinkState>,
}

impl FileSink {
    /// Create a sink writing into `dir` under the given policy and format.
    ///
    /// Nothing touches the file system until the first [`accept`] call — the
    /// directory and staging file are created lazily.
    ///
    /// [`accept`]: FileSink::accept
    pub fn new(dir: impl AsRef<Path>, policy: RotationPolicy, format: Format) -> Self {
        FileSink {
            dir: dir.as_ref().to_path_buf(),
            policy,
            format,
            state: Mutex::new(SinkState {
                current_event_count: None,
            }),
        }
    }

    /// Validate a host configuration and build a sink from it.
    pub fn from_config(config: &SinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(FileSink::new(
            &config.path,
            config.resolved_policy()?,
            Format::parse(&config.format)?,
        ))
    }

    /// Returns the target directory this sink writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the active rotation policy.
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Returns the wire format label the sink was configured with.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Host lifecycle hook. The engine has no warm-up state.
    pub fn start(&self) {
        debug!("sink for {} started", self.dir.display());
    }

    /// Host lifecycle hook. File handles are per-call, so there is nothing
    /// to release; any staging file left behind is resumed on restart.
    pub fn shutdown(&self) {
        debug!("sink for {} shut down", self.dir.display());
    }

    /// Accept one serialized batch: append it to the staging file, rotating
    /// first or after depending on the policy.
    ///
    /// Returns the finalized path when this call rotated, `None` otherwise.
    /// A single call can finalize twice — rotating out the previous staging
    /// file and then completing an oversized batch, or retrying an earlier
    /// failed finalize before its own — in which case the most recent path
    /// is returned; the earlier file is already visible to the directory
    /// consumer by name. Batches land in files in the order calls acquire
    /// the lock; there is no internal retry, batching delay, or timeout.
    ///
    /// # Errors
    ///
    /// Any [`Error`] aborts the call without advancing in-memory counters
    /// beyond what already reached disk; the caller decides whether to
    /// redeliver the batch.
    pub fn accept(&self, batch: &[u8]) -> Result<Option<PathBuf>> {
        let mut state = self.lock_state();

        ensure_target_dir(&self.dir)?;

        match self.policy {
            RotationPolicy::SizeLimitKb(_) => self.accept_by_size(batch),
            RotationPolicy::EventsPerFile(_) => self.accept_by_count(&mut state, batch),
        }
    }

    /// Size policy: the decision precedes the write. The staging file's
    /// on-disk size plus the incoming batch is measured fresh on every call,
    /// so nothing here depends on in-memory state surviving a restart.
    fn accept_by_size(&self, batch: &[u8]) -> Result<Option<PathBuf>> {
        let mut rotated = None;

        let (target, pre_size) = match staging::find_staging_file(&self.dir)? {
            Some(path) => {
                let size = staging::staging_size(&path)?;
                if size > 0 && self.policy.size_exceeded(size, batch.len() as u64) {
                    rotated = Some(staging::finalize(&path, self.format)?);
                    (staging::staging_path(&self.dir), 0)
                } else {
                    debug!(
                        "staging file {} stays under the size limit, appending",
                        path.display()
                    );
                    (path, size)
                }
            }
            None => (staging::staging_path(&self.dir), 0),
        };

        staging::append_batch(&target, batch)?;

        // A batch larger than the whole limit is still written in full — the
        // limit bounds steady-state growth, not a single batch. The file it
        // starts is complete on arrival, so it is finalized right away.
        if pre_size == 0 && self.policy.size_exceeded(0, batch.len() as u64) {
            rotated = Some(staging::finalize(&target, self.format)?);
        }
        Ok(rotated)
    }

    /// Count policy: the decision follows the write. A finalize that failed
    /// on an earlier call left the counter at the limit; it is retried here
    /// before the new batch is appended, so no finalized file ever carries
    /// more than the configured count.
    fn accept_by_count(&self, state: &mut SinkState, batch: &[u8]) -> Result<Option<PathBuf>> {
        let staging_file = staging::find_staging_file(&self.dir)?;

        let mut count = match state.current_event_count {
            Some(count) => count,
            None => match &staging_file {
                Some(path) => {
                    let recovered = staging::count_records(path)?;
                    debug!(
                        "recovered event count {} from {}",
                        recovered,
                        path.display()
                    );
                    recovered
                }
                None => 0,
            },
        };
        state.current_event_count = Some(count);

        let mut target = match &staging_file {
            Some(path) => path.clone(),
            None => staging::staging_path(&self.dir),
        };

        let mut retried = None;
        if self.policy.count_reached(count) {
            if staging_file.is_some() {
                retried = Some(staging::finalize(&target, self.format)?);
                target = staging::staging_path(&self.dir);
            }
            count = 0;
            state.current_event_count = Some(0);
        }

        staging::append_batch(&target, batch)?;
        count += 1;
        state.current_event_count = Some(count);
        debug!(
            "event count for {} now {} under {:?}",
            self.dir.display(),
            count,
            self.policy
        );

        if self.policy.count_reached(count) {
            let finalized = staging::finalize(&target, self.format)?;
            state.current_event_count = Some(0);
            return Ok(Some(finalized));
        }
        Ok(retried)
    }

    fn lock_state(&self) -> MutexGuard<'_, SinkState> {
        // A poisoned lock means another accept panicked mid-call; the count
        // is re-derived from the staging file, which is the durable record.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                guard.current_event_count = None;
                guard
            }
        }
    }
}
