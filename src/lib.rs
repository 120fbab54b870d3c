// Copyright 2025 cjtag-bridge contributors
// Licensed under the Apache-2.0 and MIT licenses.

//! cjtag-bridge
//!
//! Software model of an IEEE 1149.7 two-wire (cJTAG) to four-wire JTAG
//! bridge with a reference 1149.1 TAP, driven over a jtag_vpi-style TCP
//! command channel by an external JTAG host such as OpenOCD.

pub mod sync;
pub mod escape;
pub mod link;
pub mod oscan;
pub mod tap;
pub mod bridge;
pub mod vpi;

pub use bridge::CjtagBridge;
pub use link::LinkState;
pub use tap::{Instruction, TapState};
