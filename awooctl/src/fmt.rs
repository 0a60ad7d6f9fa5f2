//! Human-readable sizes and durations for benchmark output.

use std::time::Duration;

const KIB: f64 = 1024.0;

/// Format a byte count with a binary unit suffix.
pub fn bytes(n: u64) -> String {
    let v = n as f64;
    if v >= KIB * KIB * KIB * KIB {
        format!("{:.3} TiB", v / (KIB * KIB * KIB * KIB))
    } else if v >= KIB * KIB * KIB {
        format!("{:.3} GiB", v / (KIB * KIB * KIB))
    } else if v >= KIB * KIB {
        format!("{:.3} MiB", v / (KIB * KIB))
    } else if v >= KIB {
        format!("{:.3} KiB", v / KIB)
    } else {
        format!("{n} bytes")
    }
}

/// Format a duration with the largest sub-second unit that fits.
pub fn duration(d: Duration) -> String {
    let ns = d.as_nanos();
    if ns >= 1_000_000_000 {
        format!("{:.3} s", ns as f64 / 1e9)
    } else if ns >= 1_000_000 {
        format!("{:.3} ms", ns as f64 / 1e6)
    } else if ns >= 1_000 {
        format!("{:.3} us", ns as f64 / 1e3)
    } else {
        format!("{ns} ns")
    }
}
