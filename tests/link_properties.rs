//! Property-based tests for the link-layer invariants.

mod common;

use proptest::prelude::*;

use cjtag_bridge::escape::{EscapeClass, EscapeDetector, COUNTER_MAX, MIN_ESC_CYCLES};
use cjtag_bridge::sync::Synced;
use cjtag_bridge::{CjtagBridge, LinkState};
use common::Harness;

fn rise() -> Synced {
    Synced { level: true, rose: true, fell: false }
}

fn high() -> Synced {
    Synced { level: true, rose: false, fell: false }
}

fn fall() -> Synced {
    Synced { level: false, rose: false, fell: true }
}

/// Drive one complete burst through a detector: rising edge, `high_ticks`
/// high ticks with `toggles` TMSC transitions, then the falling edge.
fn run_burst(det: &mut EscapeDetector, toggles: u32, high_ticks: u32) -> EscapeClass {
    let mut tmsc = false;
    det.tick(rise(), tmsc);
    let mut remaining = toggles;
    for _ in 0..high_ticks {
        if remaining > 0 {
            tmsc = !tmsc;
            remaining -= 1;
        }
        det.tick(high(), tmsc);
    }
    det.tick(fall(), tmsc)
}

fn expected_class(toggles: u32) -> EscapeClass {
    match toggles {
        0..=3 => EscapeClass::Ignore,
        4..=5 => EscapeClass::Deselect,
        6..=7 => EscapeClass::Select,
        _ => EscapeClass::Reset,
    }
}

proptest! {
    /// Any qualified burst classifies by the toggle-count table.
    #[test]
    fn qualified_bursts_follow_the_table(
        toggles in 0u32..40,
        extra_high in 0u32..20,
    ) {
        let mut det = EscapeDetector::new();
        let high_ticks = u32::from(MIN_ESC_CYCLES) + toggles + extra_high;
        let class = run_burst(&mut det, toggles, high_ticks);
        prop_assert_eq!(class, expected_class(toggles));
    }

    /// A burst whose high period is too short is never an escape.
    #[test]
    fn short_bursts_classify_as_none(
        toggles in 0u32..40,
        high_ticks in 0u32..(MIN_ESC_CYCLES as u32),
    ) {
        // Keep the toggle stream within the high period so the counter
        // truly reflects the short window.
        let mut det = EscapeDetector::new();
        let class = run_burst(&mut det, toggles.min(high_ticks), high_ticks);
        prop_assert_eq!(class, EscapeClass::None);
    }

    /// Neither counter ever exceeds its saturation rail.
    #[test]
    fn counters_saturate(activity in proptest::collection::vec(any::<bool>(), 1..200)) {
        let mut det = EscapeDetector::new();
        let mut tmsc = false;
        det.tick(rise(), tmsc);
        for toggle in activity {
            if toggle {
                tmsc = !tmsc;
            }
            det.tick(high(), tmsc);
            prop_assert!(det.toggles() <= COUNTER_MAX);
            prop_assert!(det.high_cycles() <= COUNTER_MAX);
        }
    }

    /// Over arbitrary pin activity: `online` tracks the OScan1 state,
    /// `nsp` is its inverse, and the bridge only ever drives TMSC while
    /// online.
    #[test]
    fn online_and_direction_invariants(
        steps in proptest::collection::vec((any::<bool>(), any::<bool>(), 1u32..5), 1..120),
    ) {
        let mut bridge = CjtagBridge::new();
        for (tckc, tmsc, hold) in steps {
            bridge.set_tckc(tckc);
            bridge.set_tmsc(tmsc);
            for _ in 0..hold {
                bridge.tick();
                prop_assert_eq!(bridge.online(), bridge.link_state() == LinkState::Oscan1);
                prop_assert_eq!(bridge.nsp(), !bridge.online());
                if !bridge.tmsc_oen() {
                    prop_assert!(bridge.online(), "driving TMSC while not in OScan1");
                }
            }
        }
    }

    /// A hardware reset pulse lands the whole model in its reset state no
    /// matter what came before.
    #[test]
    fn ntrst_always_recovers(
        steps in proptest::collection::vec((any::<bool>(), any::<bool>(), 1u32..5), 1..60),
    ) {
        let mut h = Harness::new();
        // Random pin activity, sometimes reaching OScan1, sometimes not.
        for (tckc, tmsc, hold) in steps {
            h.bridge.set_tckc(tckc);
            h.bridge.set_tmsc(tmsc);
            h.bridge.run(hold);
        }
        h.bridge.set_ntrst(false);
        h.bridge.run(2);
        h.bridge.set_ntrst(true);
        h.bridge.run(1);

        prop_assert_eq!(h.bridge.link_state(), LinkState::Offline);
        prop_assert!(!h.bridge.online());
        prop_assert!(h.bridge.tmsc_oen());
        prop_assert!(!h.bridge.tck());
        prop_assert_eq!(h.bridge.tap().ir(), 0x01);
    }

    /// Activation always succeeds from reset for either selection toggle
    /// count, and a reset escape always deactivates.
    #[test]
    fn activation_roundtrip(select_toggles in 6u32..8, reset_toggles in 8u32..16) {
        let mut h = Harness::new();
        h.send_escape_sequence(select_toggles);
        h.send_oac_sequence();
        prop_assert!(h.bridge.online());
        h.send_escape_sequence(reset_toggles);
        prop_assert!(!h.bridge.online());
    }
}
