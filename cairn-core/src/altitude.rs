//! AGL altitude tracking and display formatting
//!
//! The environment node reports pressure and temperature; this module turns
//! those into feet above ground. The first valid sample sets the ground
//! baseline, a remote client can nudge the result with an offset, and
//! change tracking keeps the radio quiet while the altitude holds steady.

use core::fmt::Write as _;

use heapless::String;

/// Standard sea-level pressure in kPa
const SEA_LEVEL_KPA: f32 = 101.325;

/// Barometric altitude in feet from pressure and temperature.
///
/// Hypsometric formula with the constants the altimeter is calibrated for;
/// positive values are above sea level.
pub fn pressure_altitude_ft(pressure_kpa: f32, temperature_c: f32) -> i32 {
    let ratio = libm::powf(pressure_kpa / SEA_LEVEL_KPA, 0.190223);
    ((1.0 - ratio) * (temperature_c * 280.4137 + 128_897.8)) as i32
}

/// One AGL reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AglSample {
    /// Feet above the captured ground baseline, offset applied
    pub feet: i32,
    /// True when the value moved since the last sample; the radio only
    /// transmits changed readings
    pub changed: bool,
}

/// Tracks altitude above ground level across sensor samples
#[derive(Debug, Clone, Default)]
pub struct AglTracker {
    baseline_ft: Option<i32>,
    offset_ft: i32,
    last_reported_ft: Option<i32>,
}

impl AglTracker {
    /// Create a tracker with no baseline captured yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one pressure/temperature sample.
    ///
    /// Non-positive pressure means the sensor is not ready yet and is
    /// ignored. The first valid sample captures the ground baseline and
    /// yields no reading.
    pub fn update(&mut self, pressure_kpa: f32, temperature_c: f32) -> Option<AglSample> {
        if pressure_kpa <= 0.0 {
            return None;
        }

        let altitude = pressure_altitude_ft(pressure_kpa, temperature_c);
        let Some(baseline) = self.baseline_ft else {
            self.baseline_ft = Some(altitude);
            return None;
        };

        let feet = altitude - baseline + self.offset_ft;
        let changed = self.last_reported_ft != Some(feet);
        self.last_reported_ft = Some(feet);
        Some(AglSample { feet, changed })
    }

    /// Apply a remote offset adjustment in feet.
    ///
    /// Forces the next sample to report as changed so the new value reaches
    /// the client immediately.
    pub fn adjust_offset(&mut self, delta_ft: i32) {
        self.offset_ft += delta_ft;
        self.last_reported_ft = None;
    }

    /// Current offset in feet
    pub fn offset_ft(&self) -> i32 {
        self.offset_ft
    }
}

/// Format an AGL value for the 4-character OLED field.
///
/// Below 1000 ft the value is right-aligned as-is; above, it switches to a
/// thousands form with one decimal (`" 1.5"`, `"12.3"`).
pub fn format_agl(feet: i32) -> String<8> {
    let mut text = String::new();
    if feet < 1000 {
        let _ = write!(text, "{:>4}", feet);
    } else if feet < 10_000 {
        let _ = write!(text, "{:>2}.{}", feet / 1000, feet % 1000 / 100);
    } else {
        let _ = write!(text, "{}.{}", feet / 1000, feet % 1000 / 100);
    }
    text
}
