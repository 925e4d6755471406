/// Rule deciding when the current staging file must be finalized.
///
/// A policy resolves to exactly one limit kind; configurations naming both
/// (or neither) are rejected before an engine is built. The two kinds are
/// evaluated at different points of an `accept` call:
///
/// - `SizeLimitKb` is checked *before* the write, against the staging file's
///   on-disk size plus the incoming batch — the decision survives restarts
///   because nothing about it lives in memory.
/// - `EventsPerFile` is checked *after* the write, against an in-memory
///   counter recovered from the staging file's record count on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Rotate when the staging file would grow past this many kilobytes.
    SizeLimitKb(u64),
    /// Rotate once this many batches have been appended to one file.
    EventsPerFile(u64),
}

impl RotationPolicy {
    /// Size-policy decision: would appending `incoming_bytes` push the
    /// staging file past the limit?
    ///
    /// Both sizes are floored to whole kilobytes before summing, matching
    /// how the limit is configured. Strictly-greater comparison: a file may
    /// sit exactly at the limit. Always `false` for a count policy and when
    /// no staging file exists yet — a fresh file takes the batch no matter
    /// how large it is, so a single oversized batch is never dropped or
    /// split.
    pub fn size_exceeded(&self, staging_bytes: u64, incoming_bytes: u64) -> bool {
        match self {
            RotationPolicy::SizeLimitKb(limit_kb) => {
                staging_bytes / 1024 + incoming_bytes / 1024 > *limit_kb
            }
            RotationPolicy::EventsPerFile(_) => false,
        }
    }

    /// Count-policy decision: has the per-file counter reached the limit?
    pub fn count_reached(&self, current_event_count: u64) -> bool {
        match self {
            RotationPolicy::SizeLimitKb(_) => false,
            RotationPolicy::EventsPerFile(limit) => current_event_count >= *limit,
        }
    }
}
