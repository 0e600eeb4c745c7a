//! Unit conversions between physical quantities and register fields.
//!
//! Everything here is pure arithmetic; the driver calls these before touching
//! the shadow table. Formulas follow the Trinamic TMC5130/TMC5160 calculation
//! sheet.

/// √2 as used by the RMS current conversions.
///
/// [`current_scale`] and [`rms_current`] must share this value so that one is
/// the inverse of the other.
pub const SQRT_2: f32 = 1.41421;

/// Sense voltage full scale in mV with `vsense` clear.
pub const VSENSE_LOW_MV: f32 = 325.0;

/// Sense voltage full scale in mV with `vsense` set (high sensitivity).
pub const VSENSE_HIGH_MV: f32 = 180.0;

/// Largest value the 20-bit TPWMTHRS field can hold.
pub const TPWMTHRS_MAX: u32 = (1 << 20) - 1;

/// Largest current scale (`IRUN` / `IHOLD`).
pub const CURRENT_SCALE_MAX: u8 = 31;

/// Run current setting derived from a target RMS current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentScale {
    /// Value for `IHOLD_IRUN.irun`, 0..=31.
    pub irun: u8,
    /// Value for `CHOPCONF.vsense`.
    pub vsense: bool,
}

/// Computes the run current scale for `current_ma` (RMS) through a sense
/// resistor of `r_sense_mohm`.
///
/// The low-sensitivity range is tried first; if it yields a scale below 16 the
/// high-sensitivity range is selected to double the resolution.
pub fn current_scale(r_sense_mohm: u16, current_ma: u16) -> CurrentScale {
    let max_v =
        (r_sense_mohm as f32 + 20.0) * (32 * current_ma as u32) as f32 * SQRT_2 / 1000.0;

    let mut scale = (max_v / VSENSE_LOW_MV) as i32 - 1;
    let vsense = scale < 16;
    if vsense {
        scale = (max_v / VSENSE_HIGH_MV) as i32 - 1;
    }

    CurrentScale {
        irun: scale.clamp(0, CURRENT_SCALE_MAX as i32) as u8,
        vsense,
    }
}

/// Hold current scale as a percentage of the run scale.
///
/// The result is truncated to the 5-bit field; callers pass 0..=100.
#[inline]
pub fn hold_scale(irun: u8, hold_pct: u8) -> u8 {
    ((irun as u16 * hold_pct as u16) / 100) as u8 & CURRENT_SCALE_MAX
}

/// RMS current in mA produced by `irun` with the given sense range.
pub fn rms_current(r_sense_mohm: u16, irun: u8, vsense: bool) -> u16 {
    let full_scale = if vsense { VSENSE_HIGH_MV } else { VSENSE_LOW_MV };
    ((irun as f32 + 1.0) / 32.0 * full_scale / (r_sense_mohm as f32 + 20.0) / SQRT_2 * 1000.0)
        as u16
}

/// Converts a microstep count to the chip's `mres` encoding.
///
/// `0` is treated as `1`. Only the lowest set bit is considered, so a count
/// that is not a power of two maps to its largest power-of-two divisor.
///
/// ```
/// use tmc5160_shadow::driver::helpers::to_mres;
///
/// assert_eq!(to_mres(256), 0);
/// assert_eq!(to_mres(16), 4);
/// assert_eq!(to_mres(1), 8);
/// ```
pub fn to_mres(microsteps: u16) -> u8 {
    let microsteps = if microsteps == 0 { 1 } else { microsteps };
    let shifts = microsteps.trailing_zeros() as u8;
    8 - shifts.min(8)
}

/// Microstep count selected by an `mres` value.
#[inline]
pub fn microsteps_from_mres(mres: u8) -> u16 {
    1 << (8 - mres.min(8))
}

/// Returns true if `microsteps` is a power of two in `1..=256`.
#[inline]
pub fn microsteps_is_valid(microsteps: u16) -> bool {
    microsteps <= 256 && microsteps.is_power_of_two()
}

/// Quantizes a blank time given in clock cycles to the 2-bit `tbl` field.
pub fn blank_time_bucket(clock_cycles: u8) -> u8 {
    match clock_cycles {
        54..=u8::MAX => 3,
        36..=53 => 2,
        24..=35 => 1,
        _ => 0,
    }
}

/// TPWMTHRS value for a hybrid threshold velocity in mm/s.
///
/// `0` disables the threshold. The step rate is truncated to whole steps
/// before dividing; a rate below one step per second saturates the field.
pub fn hybrid_threshold(f_clk: u32, microsteps: u16, velocity_mm_s: u32, steps_per_mm: f32) -> u32 {
    if velocity_mm_s == 0 {
        return 0;
    }

    let step_rate = (velocity_mm_s as f32 * steps_per_mm) as u32;
    let divisor = 256 * step_rate as u64;
    if divisor == 0 {
        return TPWMTHRS_MAX;
    }

    (f_clk as u64 * microsteps as u64 / divisor).min(TPWMTHRS_MAX as u64) as u32
}

/// TPWMTHRS value for `velocity` (mm/s), without truncating the step rate.
pub fn tpwmthrs_from_velocity(
    f_clk: u32,
    microsteps: u16,
    velocity: u32,
    steps_per_mm: f32,
) -> u32 {
    let divisor = 256.0 * velocity as f32 * steps_per_mm;
    if divisor <= 0.0 {
        return 0;
    }

    let value = (microsteps as u64 * f_clk as u64) as f32 / divisor;
    (value as u32).min(TPWMTHRS_MAX)
}

/// Velocity in mm/s encoded by a TPWMTHRS value. `0` when the threshold is off.
pub fn velocity_from_tpwmthrs(
    f_clk: u32,
    microsteps: u16,
    tpwmthrs: u32,
    steps_per_mm: f32,
) -> u32 {
    let divisor = 256.0 * tpwmthrs as f32 * steps_per_mm;
    if divisor <= 0.0 {
        return 0;
    }

    ((microsteps as u64 * f_clk as u64) as f32 / divisor) as u32
}
