//! Volume control with logarithmic scaling
//!
//! UI sliders are linear (0.0-1.0) but loudness is perceived
//! logarithmically. [`gain_db`] maps the slider onto a device's native dB
//! range with finer resolution at the quiet end.

/// Level restored by unmute when nothing louder was remembered
pub const DEFAULT_LEVEL: f32 = 0.7;

/// Map a linear volume onto a device gain range in dB
///
/// Formula: `db = min + log10(1 + 9·linear) · (max − min)`
/// - 0.0  → `min_db`
/// - 0.5  → ~74% of the range
/// - 1.0  → `max_db`
///
/// Inputs at or below zero (and NaN) give `min_db`; the result is always
/// clamped into `[min_db, max_db]`.
pub fn gain_db(linear: f32, min_db: f32, max_db: f32) -> f32 {
    if linear.is_nan() || linear <= 0.0 {
        return min_db;
    }

    let range = max_db - min_db;
    let db = min_db + (1.0 + 9.0 * linear).log10() * range;
    db.clamp(min_db, max_db)
}

/// Convert dB to a linear amplitude multiplier
pub fn db_to_amplitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Coarse loudness band, for picking a speaker icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelBand {
    /// Silent (muted or zero)
    Muted,
    /// Below 30%
    Low,
    /// Below 70%
    Medium,
    /// 70% and up
    High,
}

/// Volume controller
///
/// Holds the linear slider level plus mute state. Muting keeps the level so
/// unmuting can bring it back.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Slider level (0.0-1.0)
    level: f32,

    /// Level to restore on unmute
    restore_level: f32,

    /// Mute state
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    pub fn new(level: f32) -> Self {
        let level = sanitize(level);
        Self {
            level,
            restore_level: level,
            muted: false,
        }
    }

    /// Set slider level (clamped to 0.0-1.0)
    ///
    /// Moving the slider also lifts mute.
    pub fn set_level(&mut self, level: f32) {
        self.level = sanitize(level);
        self.muted = false;
    }

    /// Current slider level
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Toggle mute state
    ///
    /// Unmuting restores the last audible level, or [`DEFAULT_LEVEL`] if the
    /// slider was at zero.
    pub fn toggle_mute(&mut self) {
        if self.muted || self.level <= 0.0 {
            self.muted = false;
            self.level = if self.restore_level > 0.0 {
                self.restore_level
            } else {
                DEFAULT_LEVEL
            };
        } else {
            self.restore_level = self.level;
            self.muted = true;
        }
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level actually sent to the device (0.0 when muted)
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }

    /// Loudness band of the effective level
    pub fn band(&self) -> LevelBand {
        let level = self.effective();
        if level <= 0.0 {
            LevelBand::Muted
        } else if level < 0.3 {
            LevelBand::Low
        } else if level < 0.7 {
            LevelBand::Medium
        } else {
            LevelBand::High
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

fn sanitize(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
