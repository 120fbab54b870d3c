//! The composed cJTAG-to-JTAG bridge.
//!
//! Wires the synchronizers, escape detector, link FSM, OScan1 decoder, and
//! TAP together with the fixed per-tick ordering: reset check, then
//! synchronization, then escape detection and packet decoding (both seeing
//! the previous tick's link state), then the link update. The TAP only ever
//! steps from the decoder's TDO phase, so TMS and TDI are always presented
//! before the TCK edge that captures them.

use crate::escape::EscapeDetector;
use crate::link::{LinkFsm, LinkState};
use crate::oscan::{Oscan1Decoder, Phase};
use crate::sync::Synchronizer;
use crate::tap::Tap;

/// Cycle-accurate model of the bridge, advanced one synchronized clock at a
/// time. Host-side code drives the raw TCKC/TMSC/nTRST pins and reads the
/// output pins between ticks.
pub struct CjtagBridge {
    tckc_sync: Synchronizer,
    tmsc_sync: Synchronizer,
    escape: EscapeDetector,
    link: LinkFsm,
    decoder: Oscan1Decoder,
    tap: Tap,

    tckc_i: bool,
    tmsc_i: bool,
    /// Active-low asynchronous reset; true = released.
    ntrst_i: bool,
}

impl CjtagBridge {
    pub fn new() -> CjtagBridge {
        CjtagBridge {
            tckc_sync: Synchronizer::new(),
            tmsc_sync: Synchronizer::new(),
            escape: EscapeDetector::new(),
            link: LinkFsm::new(),
            decoder: Oscan1Decoder::new(),
            tap: Tap::new(),
            tckc_i: false,
            tmsc_i: false,
            ntrst_i: true,
        }
    }

    /// Advance one synchronized clock tick.
    pub fn tick(&mut self) {
        if !self.ntrst_i {
            // Full state wipe, effective within a single tick.
            self.tckc_sync.reset();
            self.tmsc_sync.reset();
            self.escape.reset();
            self.link.reset();
            self.decoder.reset();
            self.tap.reset();
            return;
        }

        let tckc = self.tckc_sync.sample(self.tckc_i);
        let tmsc = self.tmsc_sync.sample(self.tmsc_i);

        let escape = self.escape.tick(tckc, tmsc.level);

        // The decoder sees the link state from before this tick's update,
        // so the rising edge that completes activation is never consumed
        // as packet data.
        let was_online = self.link.online();
        if was_online && tckc.rose {
            if self.decoder.rising_edge(tmsc.level) == Phase::Tdo {
                self.tap.step(self.decoder.tms(), self.decoder.tdi());
                self.decoder.drive_tdo(self.tap.tdo());
            }
        }

        self.link.step(escape, tckc.rose, tmsc.level);

        if self.link.online() && !was_online {
            self.decoder.start_packet();
        } else if !self.link.online() && was_online {
            self.decoder.release();
        }
    }

    /// Advance `n` ticks.
    pub fn run(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn set_tckc(&mut self, level: bool) {
        self.tckc_i = level;
    }

    pub fn set_tmsc(&mut self, level: bool) {
        self.tmsc_i = level;
    }

    /// Drive the active-low asynchronous reset pin.
    pub fn set_ntrst(&mut self, level: bool) {
        self.ntrst_i = level;
    }

    /// True iff the link is in OScan1.
    pub fn online(&self) -> bool {
        self.link.online()
    }

    /// Standard-protocol indication, the inverse of `online`.
    pub fn nsp(&self) -> bool {
        self.link.nsp()
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn tck(&self) -> bool {
        self.decoder.tck()
    }

    pub fn tms(&self) -> bool {
        self.decoder.tms()
    }

    pub fn tdi(&self) -> bool {
        self.decoder.tdi()
    }

    /// JTAG-side TDO, as presented by the TAP.
    pub fn tdo_in(&self) -> bool {
        self.tap.tdo()
    }

    /// TMSC output register (valid while the bridge drives the line).
    pub fn tmsc_o(&self) -> bool {
        self.decoder.tmsc_out()
    }

    /// TMSC direction: 1 = line is an input to the bridge, 0 = the bridge
    /// drives the line (TDO phase of an OScan1 packet).
    pub fn tmsc_oen(&self) -> bool {
        !self.decoder.driving()
    }

    /// The device-under-test TAP, for inspection in tests and properties.
    pub fn tap(&self) -> &Tap {
        &self.tap
    }
}

impl Default for CjtagBridge {
    fn default() -> CjtagBridge {
        CjtagBridge::new()
    }
}
