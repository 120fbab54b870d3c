//! Escape sequence detection.
//!
//! An escape sequence is TMSC activity while TCKC is held continuously high.
//! The detector counts TMSC transitions during the high period and, when TCKC
//! falls, classifies the burst by its toggle count. A burst only qualifies if
//! TCKC stayed high long enough; short pulses resolve to [`EscapeClass::None`]
//! no matter how much TMSC moved.

use crate::sync::Synced;

/// Minimum number of synchronized high ticks before a falling edge may be
/// classified as an escape.
pub const MIN_ESC_CYCLES: u8 = 20;

/// Saturation limit for both detector counters.
pub const COUNTER_MAX: u8 = 31;

/// Classification of a TMSC burst at the TCKC falling edge.
///
/// The ±1 edge ambiguity of IEEE 1149.7 is absorbed by the ranges:
/// an intended 6-toggle selection tolerates 6 or 7 observed toggles.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EscapeClass {
    /// No qualified escape this tick.
    None,
    /// 0-3 toggles: qualified burst, no link-level action.
    Ignore,
    /// 4-5 toggles: deselection.
    Deselect,
    /// 6-7 toggles: selection.
    Select,
    /// 8 or more toggles: link reset.
    Reset,
}

/// Counts TMSC transitions while TCKC is high and classifies them on the
/// falling edge.
pub struct EscapeDetector {
    toggles: u8,
    high_cycles: u8,
    last_tmsc: bool,
}

impl EscapeDetector {
    pub fn new() -> EscapeDetector {
        EscapeDetector { toggles: 0, high_cycles: 0, last_tmsc: false }
    }

    /// Advance one synchronized tick.
    ///
    /// Returns the escape classified at a TCKC falling edge, or
    /// [`EscapeClass::None`] on every other tick.
    pub fn tick(&mut self, tckc: Synced, tmsc_level: bool) -> EscapeClass {
        if tckc.rose {
            self.toggles = 0;
            self.high_cycles = 0;
            self.last_tmsc = tmsc_level;
            return EscapeClass::None;
        }

        if tckc.fell {
            let class = if self.high_cycles >= MIN_ESC_CYCLES {
                Self::classify(self.toggles)
            } else {
                EscapeClass::None
            };
            if class != EscapeClass::None {
                log::debug!(
                    "escape: {} TMSC toggles over {} high cycles -> {:?}",
                    self.toggles, self.high_cycles, class,
                );
            }
            return class;
        }

        if tckc.level {
            if tmsc_level != self.last_tmsc {
                self.toggles = (self.toggles + 1).min(COUNTER_MAX);
                self.last_tmsc = tmsc_level;
            }
            self.high_cycles = (self.high_cycles + 1).min(COUNTER_MAX);
        }

        EscapeClass::None
    }

    /// Toggle count so far in the current high period.
    pub fn toggles(&self) -> u8 {
        self.toggles
    }

    /// Consecutive high ticks so far in the current high period.
    pub fn high_cycles(&self) -> u8 {
        self.high_cycles
    }

    pub fn reset(&mut self) {
        self.toggles = 0;
        self.high_cycles = 0;
        self.last_tmsc = false;
    }

    fn classify(toggles: u8) -> EscapeClass {
        match toggles {
            0..=3 => EscapeClass::Ignore,
            4..=5 => EscapeClass::Deselect,
            6..=7 => EscapeClass::Select,
            _ => EscapeClass::Reset,
        }
    }
}

impl Default for EscapeDetector {
    fn default() -> EscapeDetector {
        EscapeDetector::new()
    }
}
