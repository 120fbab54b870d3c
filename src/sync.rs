//! Two-stage synchronizer and edge detector for the asynchronous cJTAG pins.
//!
//! TCKC and TMSC are asynchronous to the reference clock, so each line passes
//! through a two-flop chain before anything else looks at it. A third register
//! holds the previous synchronized value and is the only source of edge
//! information. Downstream logic never sees the raw pin.

/// Synchronized view of one input line for the current tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Synced {
    /// Synchronized level.
    pub level: bool,
    /// Level went low to high this tick.
    pub rose: bool,
    /// Level went high to low this tick.
    pub fell: bool,
}

/// Two-flop synchronizer with edge derivation for a single line.
///
/// The two stages impose a detection latency of at least three ticks
/// (two to traverse the chain, one to compare against the prior value);
/// tests that drive raw pins must account for this.
pub struct Synchronizer {
    stage1: bool,
    stage2: bool,
    prev: bool,
}

impl Synchronizer {
    pub fn new() -> Synchronizer {
        Synchronizer { stage1: false, stage2: false, prev: false }
    }

    /// Advance one tick with the raw pin value, returning the synchronized
    /// level and any edge seen this tick.
    pub fn sample(&mut self, raw: bool) -> Synced {
        self.prev = self.stage2;
        self.stage2 = self.stage1;
        self.stage1 = raw;

        Synced {
            level: self.stage2,
            rose: self.stage2 && !self.prev,
            fell: !self.stage2 && self.prev,
        }
    }

    /// Current synchronized level without advancing.
    pub fn level(&self) -> bool {
        self.stage2
    }

    /// Return to the power-on state.
    pub fn reset(&mut self) {
        self.stage1 = false;
        self.stage2 = false;
        self.prev = false;
    }
}

impl Default for Synchronizer {
    fn default() -> Synchronizer {
        Synchronizer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_crosses_both_stages() {
        // A raw change is invisible on the first tick and surfaces on the
        // second, once it has traversed both flops.
        let mut sync = Synchronizer::new();
        assert!(!sync.sample(true).level);
        assert!(sync.sample(true).level);
    }

    #[test]
    fn rising_edge_reported_once() {
        let mut sync = Synchronizer::new();
        sync.sample(true);
        let s = sync.sample(true);
        assert!(s.rose && !s.fell);
        let s = sync.sample(true);
        assert!(!s.rose && !s.fell);
    }

    #[test]
    fn falling_edge_reported_once() {
        let mut sync = Synchronizer::new();
        for _ in 0..4 {
            sync.sample(true);
        }
        sync.sample(false);
        let s = sync.sample(false);
        assert!(s.fell && !s.rose);
        assert!(!sync.sample(false).fell);
    }

    #[test]
    fn single_tick_glitch_still_traverses_chain() {
        // A one-tick pulse on the raw pin comes out as a one-tick
        // synchronized pulse, not lost.
        let mut sync = Synchronizer::new();
        sync.sample(true);
        let s = sync.sample(false);
        assert!(s.level && s.rose);
        let s = sync.sample(false);
        assert!(!s.level && s.fell);
    }

    #[test]
    fn reset_clears_chain() {
        let mut sync = Synchronizer::new();
        for _ in 0..3 {
            sync.sample(true);
        }
        assert!(sync.level());
        sync.reset();
        assert!(!sync.level());
        // No spurious edge on the first sample after reset.
        assert!(!sync.sample(false).fell);
    }
}
