//! Deterministic forecast-hour scheduling
//!
//! Pure functions computing the forecast hours at which model output and
//! restarts occur. Schedules are computed on demand from cadence
//! parameters and never persisted.

use crate::error::{CadenceError, CadenceResult};

/// Forecast hours at which model output is written.
///
/// A high-frequency segment `[fhmin, fhmax_hf]` stepped by `fhout_hf`
/// (inclusive of both ends, capped at `fhmax`) is followed by a
/// low-frequency segment starting at the next `fhout`-aligned hour after
/// the high-frequency segment's last value, stepped by `fhout` up to and
/// including `fhmax`.
///
/// The result is strictly increasing with every value in `[fhmin, fhmax]`.
pub fn output_hours(
    fhmin: i64,
    fhmax_hf: i64,
    fhout_hf: i64,
    fhmax: i64,
    fhout: i64,
) -> CadenceResult<Vec<i64>> {
    if fhout_hf <= 0 {
        return Err(CadenceError::InvalidInterval {
            name: "fhout_hf",
            value: fhout_hf,
        });
    }
    if fhout <= 0 {
        return Err(CadenceError::InvalidInterval {
            name: "fhout",
            value: fhout,
        });
    }

    let mut hours = Vec::new();

    // A misconfigured fhmax_hf beyond fhmax must not push output past the
    // end of the forecast
    let hf_end = fhmax_hf.min(fhmax);
    let mut fh = fhmin;
    while fh <= hf_end {
        hours.push(fh);
        fh += fhout_hf;
    }

    // Next fhout-aligned hour strictly after the high-frequency segment;
    // with an empty segment, the first aligned hour at or after fhmin.
    let mut fh = match hours.last() {
        Some(&last) => last + fhout - last.rem_euclid(fhout),
        None => fhmin + (fhout - fhmin.rem_euclid(fhout)) % fhout,
    };
    while fh <= fhmax {
        hours.push(fh);
        fh += fhout;
    }

    Ok(hours)
}

/// Forecast hours at which model restarts are written.
///
/// The first restart lands at `interval + floor(offset / 2)` (the IAU
/// half-offset shifts the whole sequence) and the sequence steps by
/// `interval` while strictly below `fhmax`. Offset parity is the caller's
/// concern; the division truncates.
pub fn restart_hours(interval: i64, fhmax: i64, offset: i64) -> CadenceResult<Vec<i64>> {
    if interval <= 0 {
        return Err(CadenceError::InvalidInterval {
            name: "interval",
            value: interval,
        });
    }

    let start = interval + offset.div_euclid(2);
    let mut hours = Vec::new();
    let mut fh = start;
    while fh < fhmax {
        hours.push(fh);
        fh += interval;
    }

    Ok(hours)
}
