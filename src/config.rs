use crate::error::{Error, Result};
use crate::policy::RotationPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Built-in size limit applied by `default = "fileSizeKb"`.
pub const DEFAULT_FILE_SIZE_KB: u64 = 100;
/// Built-in event count applied by `default = "eventsPerFile"`.
pub const DEFAULT_EVENTS_PER_FILE: u64 = 1;

const FILE_SIZE_SELECTOR: &str = "fileSizeKb";
const EVENTS_SELECTOR: &str = "eventsPerFile";

/// Wire encoding that produced the incoming batches.
///
/// The sink never inspects batch bytes — the format only selects the
/// extension a finalized file carries so the downstream consumer knows how
/// to decode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Protobuf,
}

impl Format {
    /// Parse a configuration label, case-insensitively.
    pub fn parse(label: &str) -> Result<Format> {
        if label.eq_ignore_ascii_case("json") {
            Ok(Format::Json)
        } else if label.eq_ignore_ascii_case("protobuf") {
            Ok(Format::Protobuf)
        } else {
            Err(Error::InvalidFormat(label.to_string()))
        }
    }

    /// Extension given to finalized files.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Protobuf => "proto",
        }
    }
}

/// Sink configuration as supplied by the host.
///
/// Field names match the host pipeline's configuration keys. Exactly one of
/// `fileSizeKb`, `eventsPerFile`, or `default` selects the rotation policy;
/// naming zero or more than one of them is rejected by [`validate`].
///
/// [`validate`]: SinkConfig::validate
///
/// ```
/// use telesink::SinkConfig;
///
/// let cfg: SinkConfig = serde_json::from_str(
///     r#"{ "path": "/var/lib/telemetry/traces", "eventsPerFile": 10, "format": "json" }"#,
/// ).unwrap();
/// cfg.validate().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Base directory the sink writes into.
    pub path: PathBuf,

    /// Rotate once the staging file would exceed this many kilobytes.
    #[serde(rename = "fileSizeKb", default, skip_serializing_if = "Option::is_none")]
    pub file_size_kb: Option<u64>,

    /// Rotate after this many batches have been appended.
    #[serde(rename = "eventsPerFile", default, skip_serializing_if = "Option::is_none")]
    pub events_per_file: Option<u64>,

    /// Wire encoding label, `json` or `protobuf` (case-insensitive).
    pub format: String,

    /// Named default policy: `fileSizeKb` or `eventsPerFile`, applied with a
    /// built-in magnitude instead of an explicit limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl SinkConfig {
    /// Check the configuration is complete and names exactly one policy.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("path must be defined".to_string()));
        }
        if self.format.is_empty() {
            return Err(Error::InvalidConfig(
                "format must be defined as either json or protobuf".to_string(),
            ));
        }
        Format::parse(&self.format)?;

        let named = [
            self.file_size_kb.is_some(),
            self.events_per_file.is_some(),
            self.default.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if named == 0 {
            return Err(Error::InvalidConfig(format!(
                "one of {FILE_SIZE_SELECTOR}, {EVENTS_SELECTOR} or default must be defined"
            )));
        }
        if named > 1 {
            return Err(Error::InvalidConfig(format!(
                "mention only one of {FILE_SIZE_SELECTOR}, {EVENTS_SELECTOR} or default"
            )));
        }

        if self.file_size_kb == Some(0) {
            return Err(Error::InvalidConfig(format!(
                "{FILE_SIZE_SELECTOR} must be a positive integer"
            )));
        }
        if self.events_per_file == Some(0) {
            return Err(Error::InvalidConfig(format!(
                "{EVENTS_SELECTOR} must be a positive integer"
            )));
        }

        if let Some(selector) = &self.default {
            if !selector.eq_ignore_ascii_case(FILE_SIZE_SELECTOR)
                && !selector.eq_ignore_ascii_case(EVENTS_SELECTOR)
            {
                return Err(Error::InvalidConfig(format!(
                    "invalid default \"{selector}\", valid values are {FILE_SIZE_SELECTOR} or {EVENTS_SELECTOR}"
                )));
            }
        }

        Ok(())
    }

    /// The rotation policy after the `default` selector is resolved to its
    /// built-in magnitude. Call [`validate`](SinkConfig::validate) first.
    pub fn resolved_policy(&self) -> Result<RotationPolicy> {
        if let Some(kb) = self.file_size_kb {
            return Ok(RotationPolicy::SizeLimitKb(kb));
        }
        if let Some(n) = self.events_per_file {
            return Ok(RotationPolicy::EventsPerFile(n));
        }
        match &self.default {
            Some(selector) if selector.eq_ignore_ascii_case(FILE_SIZE_SELECTOR) => {
                Ok(RotationPolicy::SizeLimitKb(DEFAULT_FILE_SIZE_KB))
            }
            Some(selector) if selector.eq_ignore_ascii_case(EVENTS_SELECTOR) => {
                Ok(RotationPolicy::EventsPerFile(DEFAULT_EVENTS_PER_FILE))
            }
            _ => Err(Error::InvalidConfig(
                "no rotation policy defined".to_string(),
            )),
        }
    }

    /// Canonical identity of this configuration, hex-encoded xxh64.
    ///
    /// Two configurations that resolve to the same directory, policy, and
    /// format fingerprint identically, even when one spells its policy via
    /// the `default` selector. The host keys shared sink instances on this
    /// value so that every pipeline kind referencing the same configuration
    /// drives one engine.
    pub fn fingerprint(&self) -> Result<String> {
        let format = Format::parse(&self.format)?;
        let policy = match self.resolved_policy()? {
            RotationPolicy::SizeLimitKb(kb) => serde_json::json!({ "sizeKb": kb }),
            RotationPolicy::EventsPerFile(n) => serde_json::json!({ "events": n }),
        };
        let canonical = serde_json::json!({
            "path": self.path,
            "policy": policy,
            "format": format,
        });
        let hash = xxhash_rust::xxh64::xxh64(canonical.to_string().as_bytes(), 0);
        Ok(format!("{hash:016x}"))
    }
}
