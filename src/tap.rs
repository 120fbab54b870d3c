//! Reference IEEE 1149.1 TAP controller used as the device-under-test model.
//!
//! Sixteen-state controller advanced by TCK rising edges. On each edge the
//! current state's capture or shift action runs first, then the TMS
//! transition, then TDO is recomputed from the active shift path. That
//! ordering is what makes a Capture-DR edge present bit 0 of the captured
//! value on the very next read.

use num_enum::{FromPrimitive, IntoPrimitive};

/// Fixed 32-bit device identification code.
pub const IDCODE_VALUE: u32 = 0x1DEAD3FF;

/// DTMCS capture value: version=1 at [3:0], abits=7 at [9:4], dmistat=0,
/// idle=0 (RISC-V Debug Spec 0.13 layout).
pub const DTMCS_VALUE: u32 = 0x0000_0071;

/// Instruction register length in bits.
pub const IR_LEN: u8 = 5;

/// Capture-IR pattern, LSB = 1 as 1149.1 requires.
pub const IR_CAPTURE: u8 = 0x01;

/// The sixteen standard TAP controller states.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TapState {
    TestLogicReset,
    RunTestIdle,
    SelectDrScan,
    CaptureDr,
    ShiftDr,
    Exit1Dr,
    PauseDr,
    Exit2Dr,
    UpdateDr,
    SelectIrScan,
    CaptureIr,
    ShiftIr,
    Exit1Ir,
    PauseIr,
    Exit2Ir,
    UpdateIr,
}

impl TapState {
    /// Successor state for a TCK rising edge with the given TMS level.
    pub fn next(self, tms: bool) -> TapState {
        use TapState::*;
        match (self, tms) {
            (TestLogicReset, false) => RunTestIdle,
            (TestLogicReset, true) => TestLogicReset,
            (RunTestIdle, false) => RunTestIdle,
            (RunTestIdle, true) => SelectDrScan,
            (SelectDrScan, false) => CaptureDr,
            (SelectDrScan, true) => SelectIrScan,
            (CaptureDr, false) => ShiftDr,
            (CaptureDr, true) => Exit1Dr,
            (ShiftDr, false) => ShiftDr,
            (ShiftDr, true) => Exit1Dr,
            (Exit1Dr, false) => PauseDr,
            (Exit1Dr, true) => UpdateDr,
            (PauseDr, false) => PauseDr,
            (PauseDr, true) => Exit2Dr,
            (Exit2Dr, false) => ShiftDr,
            (Exit2Dr, true) => UpdateDr,
            (UpdateDr, false) => RunTestIdle,
            (UpdateDr, true) => SelectDrScan,
            (SelectIrScan, false) => CaptureIr,
            (SelectIrScan, true) => TestLogicReset,
            (CaptureIr, false) => ShiftIr,
            (CaptureIr, true) => Exit1Ir,
            (ShiftIr, false) => ShiftIr,
            (ShiftIr, true) => Exit1Ir,
            (Exit1Ir, false) => PauseIr,
            (Exit1Ir, true) => UpdateIr,
            (PauseIr, false) => PauseIr,
            (PauseIr, true) => Exit2Ir,
            (Exit2Ir, false) => ShiftIr,
            (Exit2Ir, true) => UpdateIr,
            (UpdateIr, false) => RunTestIdle,
            (UpdateIr, true) => SelectDrScan,
        }
    }

    /// True for the IR column of the state diagram.
    fn ir_path(self) -> bool {
        use TapState::*;
        matches!(
            self,
            SelectIrScan | CaptureIr | ShiftIr | Exit1Ir | PauseIr | Exit2Ir | UpdateIr
        )
    }
}

/// Supported instructions. Unknown IR values select BYPASS.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    Idcode = 0x01,
    Dtmcs = 0x10,
    Dmi = 0x11,
    #[num_enum(default)]
    Bypass = 0x1F,
}

impl Instruction {
    /// Data register length selected by this instruction.
    pub fn dr_len(self) -> u32 {
        match self {
            Instruction::Idcode => 32,
            Instruction::Dtmcs => 32,
            // 7-bit address + 32-bit data + 2-bit op.
            Instruction::Dmi => 41,
            Instruction::Bypass => 1,
        }
    }

    /// Value loaded into the shift path by Capture-DR.
    pub fn capture(self) -> u64 {
        match self {
            Instruction::Idcode => IDCODE_VALUE as u64,
            Instruction::Dtmcs => DTMCS_VALUE as u64,
            Instruction::Dmi => 0,
            Instruction::Bypass => 0,
        }
    }
}

/// The TAP: state register, 5-bit IR, and the DR multiplexer.
pub struct Tap {
    state: TapState,
    ir: u8,
    ir_shift: u8,
    dr_shift: u64,
    dr_len: u32,
    dmi: u64,
    tdo: bool,
}

impl Tap {
    pub fn new() -> Tap {
        let mut tap = Tap {
            state: TapState::TestLogicReset,
            ir: Instruction::Idcode.into(),
            ir_shift: 0,
            dr_shift: 0,
            dr_len: 1,
            dmi: 0,
            tdo: false,
        };
        tap.reset();
        tap
    }

    /// Asynchronous reset: Test-Logic-Reset with IDCODE selected.
    pub fn reset(&mut self) {
        self.state = TapState::TestLogicReset;
        self.ir = Instruction::Idcode.into();
        self.ir_shift = 0;
        self.dr_shift = 0;
        self.dr_len = Instruction::Idcode.dr_len();
        self.dmi = 0;
        self.tdo = false;
    }

    pub fn state(&self) -> TapState {
        self.state
    }

    /// Committed 5-bit instruction register value.
    pub fn ir(&self) -> u8 {
        self.ir
    }

    /// Currently selected instruction.
    pub fn instruction(&self) -> Instruction {
        Instruction::from(self.ir)
    }

    /// TDO as of the last TCK rising edge.
    pub fn tdo(&self) -> bool {
        self.tdo
    }

    /// DMI holding register, committed by Update-DR under the DMI
    /// instruction. There is no debug module behind it; it records the
    /// last update for inspection.
    pub fn dmi(&self) -> u64 {
        self.dmi
    }

    /// One TCK rising edge with TMS and TDI presented beforehand.
    pub fn step(&mut self, tms: bool, tdi: bool) {
        match self.state {
            TapState::CaptureIr => {
                self.ir_shift = IR_CAPTURE;
            }
            TapState::ShiftIr => {
                self.ir_shift = (self.ir_shift >> 1) | ((tdi as u8) << (IR_LEN - 1));
            }
            TapState::CaptureDr => {
                let inst = self.instruction();
                self.dr_len = inst.dr_len();
                self.dr_shift = inst.capture();
            }
            TapState::ShiftDr => {
                self.dr_shift =
                    (self.dr_shift >> 1) | ((tdi as u64) << (self.dr_len - 1));
            }
            _ => {}
        }

        let prev = self.state;
        self.state = prev.next(tms);

        if self.state != prev {
            log::trace!("tap: {:?} -> {:?}", prev, self.state);
        }

        match self.state {
            TapState::UpdateIr => {
                self.ir = self.ir_shift & 0x1F;
                log::debug!("tap: IR <- {:#04x} ({:?})", self.ir, self.instruction());
            }
            TapState::UpdateDr => {
                if self.instruction() == Instruction::Dmi {
                    self.dmi = self.dr_shift & ((1u64 << 41) - 1);
                    log::debug!("tap: DMI <- {:#012x}", self.dmi);
                }
            }
            TapState::TestLogicReset => {
                self.ir = Instruction::Idcode.into();
            }
            _ => {}
        }

        self.tdo = if self.state.ir_path() {
            self.ir_shift & 1 == 1
        } else {
            self.dr_shift & 1 == 1
        };
    }
}

impl Default for Tap {
    fn default() -> Tap {
        Tap::new()
    }
}
