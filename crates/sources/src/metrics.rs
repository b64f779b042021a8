//! Source metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the reader and its handler
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Non-empty lines read
    pub lines_read: AtomicU64,

    /// Bytes read, including newlines
    pub bytes_read: AtomicU64,

    /// Lines that were not valid JSON
    pub parse_errors: AtomicU64,

    /// Records sent downstream
    pub records_sent: AtomicU64,

    /// Events the handler skipped as malformed
    pub events_skipped: AtomicU64,
}

impl SourceMetrics {
    pub const fn new() -> Self {
        Self {
            lines_read: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            records_sent: AtomicU64::new(0),
            events_skipped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn line_read(&self, bytes: u64) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sent(&self) {
        self.records_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn event_skipped(&self) {
        self.events_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            records_sent: self.records_sent.load(Ordering::Relaxed),
            events_skipped: self.events_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of source metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_read: u64,
    pub bytes_read: u64,
    pub parse_errors: u64,
    pub records_sent: u64,
    pub events_skipped: u64,
}
