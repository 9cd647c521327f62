//! Netra - lidar scanner process bridge
//!
//! Supervises an external lidar-scanner process, decodes its stdout
//! line stream into timestamped `(angle, distance)` points, and
//! forwards them to an in-process consumer.

pub mod clock;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod protocol;
pub mod server;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use config::LidarConfig;
pub use error::{Error, Result};
pub use server::{LidarServer, ServerEvent};
pub use sink::PointSink;
pub use types::LidarPoint;
