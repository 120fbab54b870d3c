//! OScan1 packet decoder.
//!
//! In OScan1 every TCKC cycle carries one bit of a three-bit packet:
//! inverted TDI, then TMS, then a TDO bit returned to the host. The decoder
//! tracks the bit position, latches TDI/TMS (held between packets), generates
//! the single TCK pulse per packet, and owns the TMSC direction: the line is
//! only driven outward during the TDO phase.

/// Which packet phase a TCKC rising edge just processed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Bit 0: inverted TDI sampled from TMSC.
    NTdi,
    /// Bit 1: TMS sampled from TMSC.
    Tms,
    /// Bit 2: TDO driven onto TMSC, TCK pulsed high.
    Tdo,
}

/// Demultiplexes OScan1 packets onto the four-wire JTAG side.
pub struct Oscan1Decoder {
    /// Phase the next TCKC rising edge will process.
    bit_pos: u8,
    tdi: bool,
    tms: bool,
    tck: bool,
    tmsc_out: bool,
    driving: bool,
}

impl Oscan1Decoder {
    pub fn new() -> Oscan1Decoder {
        Oscan1Decoder {
            bit_pos: 0,
            tdi: false,
            // TMS high out of reset keeps the TAP parked in Test-Logic-Reset.
            tms: true,
            tck: false,
            tmsc_out: false,
            driving: false,
        }
    }

    /// Process a TCKC rising edge with the synchronized TMSC level, returning
    /// the phase handled. On [`Phase::Tdo`] the caller steps the TAP with the
    /// latched TMS/TDI and supplies its TDO via [`Oscan1Decoder::drive_tdo`];
    /// TCK stays high until the next packet's first bit.
    pub fn rising_edge(&mut self, tmsc: bool) -> Phase {
        let phase = match self.bit_pos {
            0 => {
                self.tdi = !tmsc;
                self.tck = false;
                self.driving = false;
                Phase::NTdi
            }
            1 => {
                self.tms = tmsc;
                Phase::Tms
            }
            _ => {
                self.tck = true;
                self.driving = true;
                Phase::Tdo
            }
        };
        self.bit_pos = (self.bit_pos + 1) % 3;
        phase
    }

    /// Place the TAP's TDO on the TMSC output register for the TDO phase.
    pub fn drive_tdo(&mut self, tdo: bool) {
        self.tmsc_out = tdo;
    }

    /// Restart packet framing at bit 0 (OScan1 entry).
    pub fn start_packet(&mut self) {
        self.bit_pos = 0;
    }

    /// Stop driving the shared line and drop TCK (OScan1 exit).
    pub fn release(&mut self) {
        self.driving = false;
        self.tck = false;
    }

    /// Return every latch to its reset value.
    pub fn reset(&mut self) {
        *self = Oscan1Decoder::new();
    }

    /// Latched TDI, held between packets.
    pub fn tdi(&self) -> bool {
        self.tdi
    }

    /// Latched TMS, held between packets.
    pub fn tms(&self) -> bool {
        self.tms
    }

    /// Generated TCK: one pulse per packet, high through the TDO phase.
    pub fn tck(&self) -> bool {
        self.tck
    }

    /// Value driven on TMSC while `driving`.
    pub fn tmsc_out(&self) -> bool {
        self.tmsc_out
    }

    /// True while the bridge owns the TMSC line (TDO phase).
    pub fn driving(&self) -> bool {
        self.driving
    }

    /// Phase the next rising edge will process.
    pub fn bit_pos(&self) -> u8 {
        self.bit_pos
    }
}

impl Default for Oscan1Decoder {
    fn default() -> Oscan1Decoder {
        Oscan1Decoder::new()
    }
}
