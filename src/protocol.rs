//! Line protocol decoder
//!
//! The scanner process emits one measurement per line:
//! `timestamp_ms,angle,distance`, optionally suffixed with a literal
//! `s` marking the first line of a new 360° scan. `timestamp_ms` is an
//! epoch millisecond value in the sender's wall-clock domain; angle and
//! distance are decimal numbers in sensor-native units.

use crate::clock::ClockPair;
use crate::types::LidarPoint;

/// Trailing marker on the first line of each scan
const NEW_SCAN_MARKER: char = 's';

/// Decode one raw line into a point and its new-scan flag.
///
/// The stream is best-effort: malformed lines (wrong field count,
/// unparseable numbers) and zero-distance non-readings yield `None`
/// and the caller moves on to the next line. Incidental whitespace
/// padding around fields is tolerated.
pub fn decode_line(line: &str, clock: ClockPair) -> Option<(LidarPoint, bool)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (body, new_scan) = match line.strip_suffix(NEW_SCAN_MARKER) {
        Some(stripped) => (stripped, true),
        None => (line, false),
    };

    let mut fields = body.split(',');
    let (Some(ts), Some(angle), Some(distance), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        log::trace!("Dropping line with wrong field count: {:?}", line);
        return None;
    };

    let remote_ts_ms: i64 = match ts.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            log::debug!("Dropping line with bad timestamp: {:?}", line);
            return None;
        }
    };
    let angle: f64 = match angle.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            log::debug!("Dropping line with bad angle: {:?}", line);
            return None;
        }
    };
    let distance: f64 = match distance.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            log::debug!("Dropping line with bad distance: {:?}", line);
            return None;
        }
    };

    // The sender's wall clock is assumed to be in sync with ours, so
    // the difference is transport and processing latency.
    let age_ms = clock.system_ms - remote_ts_ms;
    let timestamp = clock.monotonic_s - age_ms as f64 / 1000.0;

    if distance == 0.0 {
        // Out-of-range reading, not a measurement
        return None;
    }

    Some((LidarPoint::new(timestamp, angle, distance), new_scan))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(system_ms: i64, monotonic_s: f64) -> ClockPair {
        ClockPair {
            system_ms,
            monotonic_s,
        }
    }

    #[test]
    fn test_valid_line() {
        let (point, new_scan) = decode_line("1000,45.0,200.0", clock(1000, 10.0)).unwrap();
        assert_eq!(point.angle, 45.0);
        assert_eq!(point.distance, 200.0);
        assert!(!new_scan);
    }

    #[test]
    fn test_new_scan_marker() {
        let (point, new_scan) = decode_line("1000,45.0,200.0s", clock(1000, 10.0)).unwrap();
        assert!(new_scan);
        assert_eq!(point.angle, 45.0);
        assert_eq!(point.distance, 200.0);
    }

    #[test]
    fn test_timestamp_reconciliation() {
        // Line sent at 1000ms wall-clock, handled at 1000ms / 10.0s:
        // zero age, timestamp equals the monotonic reading
        let (point, new_scan) = decode_line("1000,45.0,200.0s", clock(1000, 10.0)).unwrap();
        assert_eq!(point.timestamp, 10.0);
        assert!(new_scan);

        // 250ms in flight
        let (point, _) = decode_line("1000,45.0,200.0", clock(1250, 10.0)).unwrap();
        assert!((point.timestamp - 9.75).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_field_count() {
        let clock = clock(1000, 10.0);
        assert!(decode_line("", clock).is_none());
        assert!(decode_line("1000", clock).is_none());
        assert!(decode_line("1000,45.0", clock).is_none());
        assert!(decode_line("1000,45.0,200.0,7.0", clock).is_none());
        assert!(decode_line("s", clock).is_none());
    }

    #[test]
    fn test_unparseable_fields() {
        let clock = clock(1000, 10.0);
        assert!(decode_line("abc,45.0,200.0", clock).is_none());
        assert!(decode_line("1000,x,200.0", clock).is_none());
        assert!(decode_line("1000,45.0,x", clock).is_none());
        // Fractional remote timestamp is not an integer
        assert!(decode_line("1000.5,45.0,200.0", clock).is_none());
    }

    #[test]
    fn test_padded_fields_accepted() {
        let (point, _) = decode_line("1000, 45.0, 200.0", clock(1000, 10.0)).unwrap();
        assert_eq!(point.angle, 45.0);
        assert_eq!(point.distance, 200.0);

        let (point, new_scan) = decode_line(" 1000 , 45.0 , 200.0s", clock(1000, 10.0)).unwrap();
        assert!(new_scan);
        assert_eq!(point.timestamp, 10.0);
        assert_eq!(point.distance, 200.0);
    }

    #[test]
    fn test_zero_distance_dropped() {
        let clock = clock(1000, 10.0);
        assert!(decode_line("900,90.0,0.0", clock).is_none());
        assert!(decode_line("900,90.0,0.0s", clock).is_none());
        assert!(decode_line("900,90.0,0", clock).is_none());
    }

    #[test]
    fn test_trailing_newline_stripped() {
        let (point, new_scan) = decode_line("1000,45.0,200.0s\n", clock(1000, 10.0)).unwrap();
        assert!(new_scan);
        assert_eq!(point.distance, 200.0);
    }
}
