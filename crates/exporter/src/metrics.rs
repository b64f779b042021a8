//! Exporter metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a running exporter
#[derive(Debug, Default)]
pub struct ExporterMetrics {
    /// Records taken from the input channel
    pub records_received: AtomicU64,

    /// Flush passes, including empty ones
    pub flushes: AtomicU64,

    /// Events handed to the sink successfully
    pub events_exported: AtomicU64,

    /// Records dropped because they could not be transcoded
    pub transcode_errors: AtomicU64,

    /// Events the sink failed to deliver
    pub delivery_errors: AtomicU64,
}

impl ExporterMetrics {
    pub const fn new() -> Self {
        Self {
            records_received: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            events_exported: AtomicU64::new(0),
            transcode_errors: AtomicU64::new(0),
            delivery_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn exported(&self) {
        self.events_exported.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn transcode_error(&self) {
        self.transcode_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn delivery_error(&self) {
        self.delivery_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ExporterSnapshot {
        ExporterSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            events_exported: self.events_exported.load(Ordering::Relaxed),
            transcode_errors: self.transcode_errors.load(Ordering::Relaxed),
            delivery_errors: self.delivery_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `ExporterMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExporterSnapshot {
    pub records_received: u64,
    pub flushes: u64,
    pub events_exported: u64,
    pub transcode_errors: u64,
    pub delivery_errors: u64,
}

impl ExporterSnapshot {
    /// Records that never reached the destination
    pub fn dropped(&self) -> u64 {
        self.transcode_errors + self.delivery_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = ExporterMetrics::new();
        metrics.record_received();
        metrics.record_received();
        metrics.flush();
        metrics.exported();
        metrics.transcode_error();

        let snap = metrics.snapshot();
        assert_eq!(snap.records_received, 2);
        assert_eq!(snap.flushes, 1);
        assert_eq!(snap.events_exported, 1);
        assert_eq!(snap.dropped(), 1);
    }
}
