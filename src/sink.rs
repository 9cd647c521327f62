//! Consumer interface for decoded points

use crate::types::LidarPoint;

/// Receives decoded points from the reader thread.
///
/// `add_point` is invoked synchronously from the reader thread for every
/// valid line, in stream order, and is expected to return quickly; slow
/// consumers stall the reader.
pub trait PointSink: Send + Sync {
    /// Accept one measurement; `new_scan` is set on the first point of a rotation
    fn add_point(&self, point: LidarPoint, new_scan: bool);
}

impl<F> PointSink for F
where
    F: Fn(LidarPoint, bool) + Send + Sync,
{
    fn add_point(&self, point: LidarPoint, new_scan: bool) {
        self(point, new_scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_sink() {
        let count = AtomicUsize::new(0);
        let sink = |_point: LidarPoint, _new_scan: bool| {
            count.fetch_add(1, Ordering::Relaxed);
        };
        sink.add_point(LidarPoint::new(0.0, 1.0, 2.0), false);
        sink.add_point(LidarPoint::new(0.1, 2.0, 3.0), true);
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }
}
