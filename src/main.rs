//! netra-lidar - lidar scanner supervision daemon
//!
//! Starts the external scanner process, streams its decoded points, and
//! stops the session on Ctrl-C or when the device disconnects.

use crossbeam_channel::RecvTimeoutError;
use log::{error, info};
use netra_lidar::config::LidarConfig;
use netra_lidar::error::{Error, Result};
use netra_lidar::server::{LidarServer, ServerEvent};
use netra_lidar::sink::PointSink;
use netra_lidar::types::LidarPoint;
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Resolve the config file path from the command line.
///
/// Accepts `--config <path>`, `-c <path>`, or a bare positional path;
/// with none of those, falls back to `/etc/netra.toml`.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for pair in args.windows(2) {
        if pair[0] == "--config" || pair[0] == "-c" {
            return pair[1].clone();
        }
    }

    match args.get(1) {
        Some(arg) if !arg.starts_with('-') => arg.clone(),
        _ => "/etc/netra.toml".to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("netra-lidar starting...");

    let config_path = parse_config_path();
    let config = if Path::new(&config_path).exists() {
        info!("Using config: {}", config_path);
        LidarConfig::from_file(&config_path)?
    } else {
        info!("Config {} not found, using defaults", config_path);
        LidarConfig::default()
    };

    // Count scans as they arrive; a real deployment hangs the
    // measurement pipeline off this sink instead
    let scan_count = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&scan_count);
    let sink: Arc<dyn PointSink> = Arc::new(move |_point: LidarPoint, new_scan: bool| {
        if new_scan {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    });

    let mut server = LidarServer::new(config, sink);
    server.start()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    info!("netra-lidar running. Press Ctrl-C to stop.");

    let mut last_stats = Instant::now();
    while running.load(Ordering::Relaxed) {
        match server.events().recv_timeout(Duration::from_millis(100)) {
            Ok(ServerEvent::Disconnected) => {
                error!("Lidar disconnected, shutting down");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        // Print statistics every 10 seconds
        if last_stats.elapsed().as_secs() >= 10 {
            let (delivered, discarded) = server.stats();
            info!(
                "Lidar: {} scans, {} points delivered, {} lines dropped",
                scan_count.load(Ordering::Relaxed),
                delivered,
                discarded
            );
            last_stats = Instant::now();
        }
    }

    if server.is_running() {
        // A stuck reader surfaces as a stop timeout; give it one retry
        if let Err(e) = server.stop() {
            error!("Stop failed ({}), retrying", e);
            server.stop()?;
        }
    }

    info!("netra-lidar stopped");
    Ok(())
}
