//! Lidar measurement types

/// A single lidar measurement
///
/// Produced by the line decoder and handed to the consumer; never
/// mutated after creation. Decoded points always carry a nonzero
/// distance (zero-distance readings are dropped as non-readings).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidarPoint {
    /// Send time, reconciled into the local monotonic clock domain (seconds)
    pub timestamp: f64,
    /// Angle in sensor-native units (degrees for the stock scanner)
    pub angle: f64,
    /// Distance in sensor-native units
    pub distance: f64,
}

impl LidarPoint {
    /// Create new lidar point
    pub fn new(timestamp: f64, angle: f64, distance: f64) -> Self {
        Self {
            timestamp,
            angle,
            distance,
        }
    }

    /// Convert to Cartesian coordinates (x, y), treating the angle as degrees
    pub fn to_cartesian(&self) -> (f64, f64) {
        let rad = self.angle.to_radians();
        (self.distance * rad.cos(), self.distance * rad.sin())
    }
}
