//! Fuzz target for setting estimation.
//!
//! Arbitrary counts and game totals against the built-in catalog must always
//! produce finite, non-negative percentages.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sl_config::MachineCatalog;
use sl_core::estimate::{estimate_report, Observation};

#[derive(Debug, Arbitrary)]
struct Input {
    machine: u8,
    total_spins: u32,
    primary_phase_spins: u32,
    counts: Vec<(u8, u32)>,
    ignored: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let Ok(catalog) = MachineCatalog::builtin() else {
        return;
    };
    let machine = &catalog.machines[input.machine as usize % catalog.machines.len()];
    let events = &machine.events;

    let mut obs = Observation::new(u64::from(input.total_spins))
        .with_primary_phase(u64::from(input.primary_phase_spins));
    for (idx, count) in input.counts {
        let event = &events[idx as usize % events.len()];
        obs = obs.with_count(event.id.clone(), u64::from(count));
    }
    for idx in input.ignored {
        obs = obs.with_ignored(events[idx as usize % events.len()].id.clone());
    }

    let report = estimate_report(machine, &obs);
    for e in &report.estimates {
        assert!(e.percentage.is_finite());
        assert!(e.percentage >= 0.0);
    }
});
