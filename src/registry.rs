use crate::config::SinkConfig;
use crate::error::Result;
use crate::sink::FileSink;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared-instance map handing out one [`FileSink`] per distinct
/// configuration.
///
/// A host pipeline asks for a sink once per telemetry kind (traces, metrics,
/// logs), but kinds that resolve to an identical configuration must drive
/// the same engine — otherwise the "at most one staging file per directory"
/// invariant would only hold per kind, not process-wide. Instances are keyed
/// by the configuration [`fingerprint`](SinkConfig::fingerprint), so two
/// spellings of the same policy (explicit limit vs. `default` selector)
/// still share one sink.
///
/// An explicit object owned by the host-integration layer, not a global:
/// tests construct as many registries as they need.
pub struct SinkRegistry {
    sinks: Mutex<HashMap<String, Arc<FileSink>>>,
}

impl SinkRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        SinkRegistry {
            sinks: Mutex::new(HashMap::new()),
        }
    }

    /// Return the sink registered for this configuration, building and
    /// registering one if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) or
    /// [`Error::InvalidFormat`](crate::Error::InvalidFormat) when the
    /// configuration fails validation; nothing is registered in that case.
    pub fn get_or_create(&self, config: &SinkConfig) -> Result<Arc<FileSink>> {
        let fingerprint = config.fingerprint()?;
        let mut sinks = self.lock_sinks();
        if let Some(sink) = sinks.get(&fingerprint) {
            return Ok(Arc::clone(sink));
        }
        let sink = Arc::new(FileSink::from_config(config)?);
        sink.start();
        sinks.insert(fingerprint, Arc::clone(&sink));
        Ok(sink)
    }

    /// Number of distinct configurations currently registered.
    pub fn len(&self) -> usize {
        self.lock_sinks().len()
    }

    /// True if no sink has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.lock_sinks().is_empty()
    }

    /// Shut down every registered sink and drop the registry's references.
    ///
    /// Pipelines still holding an `Arc` keep a usable sink; shutdown is a
    /// lifecycle notification, not a teardown of per-call file handles.
    pub fn shutdown_all(&self) {
        let mut sinks = self.lock_sinks();
        for sink in sinks.values() {
            sink.shutdown();
        }
        sinks.clear();
    }

    fn lock_sinks(&self) -> MutexGuard<'_, HashMap<String, Arc<FileSink>>> {
        match self.sinks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        SinkRegistry::new()
    }
}
