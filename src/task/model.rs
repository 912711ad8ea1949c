//! Derived model values
//!
//! Values the forecast templates need that are not configuration inputs
//! themselves: cubed-sphere grid geometry derived from the resolution
//! label, the input/initial-condition file lists, and the restart cadence
//! per run kind.

use crate::config::Config;
use crate::engine::schedule::restart_hours;
use crate::error::{ConfigError, ConfigResult, Result};

/// Cubed-sphere tile count for the FV3 atmosphere
pub const NTILES: i64 = 6;

/// Atmosphere grid geometry derived from a `C<n>` resolution label
#[derive(Debug, Clone, PartialEq)]
pub struct AtmGrid {
    /// Resolution label, e.g. `C48`
    pub res: String,
    pub ntiles: i64,
    pub jcap: i64,
    pub lonb: i64,
    pub latb: i64,
    pub npx: i64,
    pub npy: i64,
    pub npz: i64,
}

impl AtmGrid {
    /// Derive grid geometry from a resolution label and level count
    pub fn derive(res: &str, levs: i64) -> ConfigResult<Self> {
        let n: i64 = res
            .strip_prefix('C')
            .and_then(|digits| digits.parse().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "atmosphere resolution '{}' is not of the form C<n>",
                    res
                ))
            })?;

        Ok(AtmGrid {
            res: res.to_string(),
            ntiles: NTILES,
            jcap: 2 * n - 2,
            lonb: 4 * n,
            latb: 2 * n,
            npx: n + 1,
            npy: n + 1,
            npz: levs - 1,
        })
    }
}

/// Fixed input files the model reads from its `INPUT` directory
pub fn fv3_input_files(ntiles: i64) -> Vec<String> {
    let mut files = vec!["grid_spec.nc".to_string()];
    files.extend((1..=ntiles).map(|nn| format!("grid.tile{}.nc", nn)));
    files.extend((1..=ntiles).map(|nn| format!("oro_data.tile{}.nc", nn)));
    files
}

/// Initial-condition files, depending on whether this is a warm start
pub fn initial_condition_files(ntiles: i64, warm_start: bool) -> Vec<String> {
    if !warm_start {
        let mut ics = vec!["gfs_ctrl.nc".to_string()];
        ics.extend((1..=ntiles).map(|nn| format!("gfs_data.tile{}.nc", nn)));
        ics.extend((1..=ntiles).map(|nn| format!("sfc_data.tile{}.nc", nn)));
        return ics;
    }

    let mut ics = vec!["coupler.res".to_string(), "fv_core.res.nc".to_string()];
    let ftypes = [
        "fv_core.res",
        "fv_srf_wnd.res",
        "fv_tracer.res",
        "phy_data",
        "sfc_data",
        "ca_data",
    ];
    for ftype in ftypes {
        ics.extend((1..=ntiles).map(move |nn| format!("{}.tile{}.nc", ftype, nn)));
    }
    ics
}

/// Restart forecast hours for a run kind.
///
/// `gdas` cycles restart on a fixed short cadence, widened when IAU is
/// active; `gfs` runs compute the cadence from the configured restart
/// interval with the IAU offset shifting the sequence.
pub fn restart_cadence(run: &str, config: &Config) -> Result<Vec<i64>> {
    let do_iau = config.bool_or("DOIAU", false)?;

    if run == "gdas" {
        return Ok(if do_iau { vec![3, 6] } else { vec![6] });
    }

    let interval = config.int_or("restart_interval_gfs", 12)?;
    let fhmax = config.int_or("FHMAX_GFS", 120)?;
    let offset = if do_iau {
        config.int_or("IAU_OFFSET", 0)?
    } else {
        0
    };

    Ok(restart_hours(interval, fhmax, offset)?)
}
