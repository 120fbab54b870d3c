//! Shared drive helpers for exercising the bridge through its raw pins.
//!
//! The vocabulary mirrors the external protocol: escape sequences, the
//! activation code, and three-bit OScan1 packets. All helpers respect the
//! synchronizer latency by holding every pin phase for several ticks.

// Each test binary uses a different subset of the helpers.
#![allow(dead_code)]

use cjtag_bridge::CjtagBridge;

/// Ticks each raw pin phase is held: enough for the two-stage synchronizer
/// plus edge detection to settle.
pub const SETTLE: u32 = 8;

pub struct Harness {
    pub bridge: CjtagBridge,
    tmsc: bool,
}

impl Harness {
    /// Power up and release the asynchronous reset.
    pub fn new() -> Harness {
        let mut harness = Harness { bridge: CjtagBridge::new(), tmsc: false };
        harness.bridge.set_ntrst(false);
        harness.bridge.run(5);
        harness.bridge.set_ntrst(true);
        harness.bridge.run(SETTLE);
        harness
    }

    pub fn run(&mut self, ticks: u32) {
        self.bridge.run(ticks);
    }

    pub fn set_tmsc(&mut self, level: bool) {
        self.tmsc = level;
        self.bridge.set_tmsc(level);
    }

    pub fn toggle_tmsc(&mut self) {
        let level = !self.tmsc;
        self.set_tmsc(level);
    }

    /// One full TCKC cycle presenting `tmsc` at the rising edge.
    pub fn tckc_cycle(&mut self, tmsc: bool) {
        self.bridge.set_tckc(false);
        self.bridge.run(SETTLE);
        self.set_tmsc(tmsc);
        self.bridge.set_tckc(true);
        self.bridge.run(SETTLE);
    }

    /// Hold TCKC high past the qualification threshold and toggle TMSC
    /// `toggles` times, then drop TCKC.
    pub fn send_escape_sequence(&mut self, toggles: u32) {
        self.bridge.set_tckc(false);
        self.bridge.run(SETTLE);
        self.bridge.set_tckc(true);
        self.bridge.run(30);
        for _ in 0..toggles {
            self.toggle_tmsc();
            self.bridge.run(SETTLE);
        }
        self.bridge.set_tckc(false);
        self.bridge.run(SETTLE);
    }

    /// Clock in the 4-bit activation code 1,1,0,1 (LSB first).
    pub fn send_oac_sequence(&mut self) {
        for &bit in &[true, true, false, true] {
            self.tckc_cycle(bit);
        }
        self.bridge.set_tckc(false);
        self.bridge.run(SETTLE);
    }

    /// Selection escape plus the activation code.
    pub fn activate(&mut self) {
        self.send_escape_sequence(6);
        self.send_oac_sequence();
    }

    /// One OScan1 packet: nTDI, TMS, then the TDO bit read back from the
    /// bridge while it drives TMSC.
    pub fn send_oscan1_packet(&mut self, tdi: bool, tms: bool) -> bool {
        self.tckc_cycle(!tdi);
        self.tckc_cycle(tms);

        self.bridge.set_tckc(false);
        self.set_tmsc(false);
        self.bridge.run(SETTLE);
        self.bridge.set_tckc(true);
        self.bridge.run(SETTLE);
        let tdo = self.bridge.tmsc_o();
        self.bridge.set_tckc(false);
        self.bridge.run(SETTLE);
        tdo
    }

    /// Read `n` DR bits LSB-first, starting from Run-Test/Idle: the three
    /// navigation packets, then `n` read packets exiting on the last.
    pub fn read_dr(&mut self, n: u32) -> u64 {
        self.send_oscan1_packet(false, true); // -> Select-DR-Scan
        self.send_oscan1_packet(false, false); // -> Capture-DR
        let mut value = 0u64;
        for i in 0..n {
            let tms = i == n - 1;
            let tdo = self.send_oscan1_packet(false, tms);
            value |= (tdo as u64) << i;
        }
        self.send_oscan1_packet(false, true); // Exit1-DR -> Update-DR
        self.send_oscan1_packet(false, false); // -> Run-Test/Idle
        value
    }

    /// Load a 5-bit instruction from Run-Test/Idle, ending back in
    /// Run-Test/Idle.
    pub fn load_ir(&mut self, ir: u8) {
        self.send_oscan1_packet(false, true); // -> Select-DR-Scan
        self.send_oscan1_packet(false, true); // -> Select-IR-Scan
        self.send_oscan1_packet(false, false); // -> Capture-IR
        self.send_oscan1_packet(false, false); // capture edge -> Shift-IR
        for i in 0..5 {
            let tms = i == 4;
            self.send_oscan1_packet((ir >> i) & 1 == 1, tms);
        }
        self.send_oscan1_packet(false, true); // Exit1-IR -> Update-IR
        self.send_oscan1_packet(false, false); // -> Run-Test/Idle
    }
}
