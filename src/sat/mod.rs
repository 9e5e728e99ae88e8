pub mod dpll;
pub mod propagate;
pub mod trail;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cnf::store::Lit;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub solve_calls: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub conflicts: usize,
}

/// Shared flag polled between propagation sweeps and between MUS probes.
/// A probe-local trail holds no persistent state, so aborting mid-solve
/// leaves nothing to clean up.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// What falsified the problem.
///
/// `Clause` carries the clause id and its literals, all false under the
/// trail at detection (empty for an empty clause). `AssumptionClash` is the
/// synthetic conflict for an assumption rejected against the current value
/// of its variable; `current` is the literal that holds on the trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    Clause { cid: usize, falsified: Vec<Lit> },
    AssumptionClash { current: Lit, rejected: Lit },
}
