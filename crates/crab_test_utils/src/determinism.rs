//! Determinism testing utilities.
//!
//! The simulation uses fixed-point math and iterates entities in spawn
//! order, so identical setups must produce identical state hashes. These
//! helpers run a setup several times and compare.

use crab_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Simulation is non-deterministic!\nRuns: {}\nTicks: {}\nAll hashes: {:?}",
            self.hashes.len(),
            self.ticks,
            self.hashes
        );
    }
}

/// Run `setup` `runs` times for `ticks` ticks each and compare final hashes.
pub fn verify_simulation_determinism<F>(setup: F, runs: usize, ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut sim = setup();
            sim.run(ticks);
            sim.state_hash()
        })
        .collect();
    tracing::debug!(runs, ticks, "Determinism check finished");
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}
