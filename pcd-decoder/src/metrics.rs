use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::Serialize;

/// Lifetime decode counters, for introspection only. Nothing reads them back to make a
/// decision. Share one instance across workers through an `Arc`.
#[derive(Debug, Default)]
pub struct DecodeMetrics {
    bytes_saved: AtomicI64,
    points_decoded: AtomicU64,
    requests_decoded: AtomicU64,
    requests_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub bytes_saved: i64,
    pub points_decoded: u64,
    pub requests_decoded: u64,
    pub requests_failed: u64,
}

impl DecodeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `num_points * point_size - compressed_len`, which goes negative when the
    /// stream is larger than its records.
    pub fn record_decode(&self, num_points: usize, point_size: usize, compressed_len: usize) {
        let raw_len = i64::try_from(num_points.saturating_mul(point_size)).unwrap_or(i64::MAX);
        let compressed_len = i64::try_from(compressed_len).unwrap_or(i64::MAX);
        let saved = raw_len.saturating_sub(compressed_len);
        // saturate instead of wrapping on absurd totals
        let _ = self
            .bytes_saved
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(saved))
            });
        self.points_decoded
            .fetch_add(num_points as u64, Ordering::Relaxed);
        self.requests_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_saved(&self) -> i64 {
        self.bytes_saved.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_saved: self.bytes_saved(),
            points_decoded: self.points_decoded.load(Ordering::Relaxed),
            requests_decoded: self.requests_decoded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
        }
    }
}
