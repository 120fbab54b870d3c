//! Link state machine and Online Activation Code validation.
//!
//! The link is in one of three states: `Offline` (power-on default),
//! `OnlineAct` (a selection escape was seen, the activation code is being
//! clocked in), or `Oscan1` (activated, TMSC carries three-bit OScan1
//! packets). The activation shift register only exists while activating, so
//! it lives inside the `OnlineAct` variant.

use crate::escape::EscapeClass;

/// On-wire activation code, LSB-first bit order 1,1,0,1.
pub const OAC: u8 = 0b1101;

/// Number of activation bits checked. Hosts sending the full 12-bit
/// OAC|EC|CP packet have the trailing bits consumed by whatever state the
/// link is in afterwards; only these four decide activation.
pub const OAC_BITS: u8 = 4;

/// Link-layer state. `online` is true exactly in `Oscan1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkState {
    Offline,
    OnlineAct {
        /// Activation bits received so far.
        bits: u8,
        /// Activation bits accumulated LSB-first.
        shift: u8,
    },
    Oscan1,
}

/// The four-state link controller.
///
/// Updated once at the end of every synchronized tick, after the escape
/// detector has run. A RESET escape dominates any concurrent data-path
/// event, including a completing activation code.
pub struct LinkFsm {
    state: LinkState,
}

impl LinkFsm {
    pub fn new() -> LinkFsm {
        LinkFsm { state: LinkState::Offline }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// True iff the link is in OScan1 (activated).
    pub fn online(&self) -> bool {
        self.state == LinkState::Oscan1
    }

    /// Standard-protocol-compatible indication: the inverse of `online`.
    pub fn nsp(&self) -> bool {
        !self.online()
    }

    /// End-of-tick update with this tick's escape classification and, on a
    /// TCKC rising edge, the synchronized TMSC level.
    pub fn step(&mut self, escape: EscapeClass, tckc_rose: bool, tmsc: bool) {
        if escape == EscapeClass::Reset {
            if self.state != LinkState::Offline {
                log::debug!("link: reset escape, {:?} -> Offline", self.state);
            }
            self.state = LinkState::Offline;
            return;
        }

        match self.state {
            LinkState::Offline => {
                if escape == EscapeClass::Select {
                    log::debug!("link: selection escape, Offline -> OnlineAct");
                    self.state = LinkState::OnlineAct { bits: 0, shift: 0 };
                }
            }
            LinkState::OnlineAct { bits, shift } => {
                if tckc_rose {
                    let shift = shift | ((tmsc as u8) << bits);
                    let bits = bits + 1;
                    if bits == OAC_BITS {
                        if shift == OAC {
                            log::debug!("link: OAC valid, OnlineAct -> Oscan1");
                            self.state = LinkState::Oscan1;
                        } else {
                            log::debug!(
                                "link: OAC mismatch (got {:#06b}), OnlineAct -> Offline",
                                shift,
                            );
                            self.state = LinkState::Offline;
                        }
                    } else {
                        self.state = LinkState::OnlineAct { bits, shift };
                    }
                }
            }
            // Only a reset escape or ntrst leaves OScan1.
            LinkState::Oscan1 => {}
        }
    }

    pub fn reset(&mut self) {
        self.state = LinkState::Offline;
    }
}

impl Default for LinkFsm {
    fn default() -> LinkFsm {
        LinkFsm::new()
    }
}
