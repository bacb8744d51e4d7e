//! The Manager's `log` event stream (§4.4, §6), realized as real `tracing`
//! events forwarded to an optional host-supplied sink (§10.2).
//!
//! Embedding hosts that never install a `tracing` subscriber still observe
//! the spec's `log` stream through the sink; hosts that do use `tracing`
//! get structured events for free, in the same facade the teacher's server
//! and client crates log through.

use std::sync::{Arc, Mutex};

/// Severity of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Routine, high-volume detail (per-frame routing, render/retransmit
    /// decisions when `debugging` is enabled).
    Debug,
    /// Something recoverable went wrong (decode error, transport failure,
    /// caught panic in a host callback).
    Warn,
}

/// A host-supplied sink for the `log` event stream.
pub type LogSink = Box<dyn Fn(LogLevel, String) + Send + Sync>;

/// Shared handle to the optional host log sink. Cheap to clone; cloning
/// shares the same underlying sink slot, matching the teacher's
/// `Arc<Mutex<_>>`-backed registries (`key_package_registry.rs`).
#[derive(Clone, Default)]
pub struct LogHub {
    sink: Arc<Mutex<Option<LogSink>>>,
}

#[allow(clippy::expect_used, reason = "mutex poisoning should cause a panic")]
impl LogHub {
    /// Installs (or removes, with `None`) the host log sink.
    pub fn set_sink(&self, sink: Option<LogSink>) {
        *self.sink.lock().expect("LogHub mutex poisoned") = sink;
    }

    /// Emits an event: always to `tracing`, and to the host sink if one is
    /// installed.
    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
        }
        if let Some(sink) = self.sink.lock().expect("LogHub mutex poisoned").as_ref() {
            sink(level, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn sink_receives_emitted_events() {
        let hub = LogHub::default();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        hub.set_sink(Some(Box::new(move |_level, _msg| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })));

        hub.emit(LogLevel::Warn, "test");
        hub.emit(LogLevel::Debug, "test2");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn without_sink_emit_does_not_panic() {
        let hub = LogHub::default();
        hub.emit(LogLevel::Warn, "no sink installed");
    }
}
