use std::collections::BTreeMap;

use anyhow::Result;
use log::{debug, trace};

use crate::cnf::store::{ClauseView, Lit};
use crate::sat::propagate::{propagate, Propagation};
use crate::sat::trail::{Mark, Reason, Trail};
use crate::sat::{AbortSignal, Conflict, SolverStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Sat(BTreeMap<u32, bool>),
    Unsat(UnsatProof),
    Cancelled,
}

/// The conflict that closed the search, together with the trail as it stood
/// at the moment of detection. Reason links on the trail let the caller walk
/// from the conflict back to the responsible assumptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatProof {
    pub conflict: Conflict,
    pub trail: Trail,
}

struct Frame {
    mark: Mark,
    var: u32,
    flipped: bool,
}

/// Complete DPLL over the view's clauses under the given assumptions.
///
/// Assumptions are seeded in listed order, propagating to fixpoint after
/// each so that an assumption whose variable was already forced the other
/// way by an earlier assumption is rejected as a synthetic clash. Decisions
/// try hint variables first (supplied order, signs already stripped), then
/// ascending variable id, positive polarity before negative. No learning,
/// no restarts, no nonchronological backjumping.
pub fn solve(
    view: &ClauseView,
    assumptions: &[Lit],
    hint_vars: &[u32],
    abort: &AbortSignal,
    stats: &mut SolverStats,
) -> Result<SearchResult> {
    stats.solve_calls += 1;
    let mut trail = Trail::new(view.num_vars());

    for &a in assumptions {
        match trail.value(a.var) {
            Some(v) if v == a.sign => continue,
            Some(v) => {
                stats.conflicts += 1;
                debug!(
                    "assumption {} clashes with the current value of variable {}",
                    a.to_dimacs(),
                    a.var
                );
                return Ok(SearchResult::Unsat(UnsatProof {
                    conflict: Conflict::AssumptionClash {
                        current: Lit::new(a.var, v),
                        rejected: a,
                    },
                    trail,
                }));
            }
            None => trail.assign(a.var, a.sign, Reason::Assumption(a))?,
        }
        match propagate(view, &mut trail, abort, stats)? {
            Propagation::Fixpoint => {}
            Propagation::Conflict(conflict) => {
                return Ok(SearchResult::Unsat(UnsatProof { conflict, trail }))
            }
            Propagation::Aborted => return Ok(SearchResult::Cancelled),
        }
    }

    // covers the no-assumption case; a fixpoint re-check otherwise
    match propagate(view, &mut trail, abort, stats)? {
        Propagation::Fixpoint => {}
        Propagation::Conflict(conflict) => {
            return Ok(SearchResult::Unsat(UnsatProof { conflict, trail }))
        }
        Propagation::Aborted => return Ok(SearchResult::Cancelled),
    }

    let mut frames: Vec<Frame> = Vec::new();
    loop {
        if abort.is_aborted() {
            return Ok(SearchResult::Cancelled);
        }
        let Some(var) = next_decision(&trail, hint_vars, view.num_vars()) else {
            return Ok(SearchResult::Sat(model_of(&trail)));
        };
        trace!("decide {} at level {}", var, frames.len() + 1);
        frames.push(Frame {
            mark: trail.mark(),
            var,
            flipped: false,
        });
        trail.assign(var, true, Reason::Decision)?;
        stats.decisions += 1;

        loop {
            match propagate(view, &mut trail, abort, stats)? {
                Propagation::Fixpoint => break,
                Propagation::Aborted => return Ok(SearchResult::Cancelled),
                Propagation::Conflict(conflict) => {
                    while frames.last().is_some_and(|f| f.flipped) {
                        frames.pop();
                    }
                    let Some(top) = frames.last_mut() else {
                        // both polarities exhausted everywhere; the trail is
                        // left as it stood when this conflict was detected
                        return Ok(SearchResult::Unsat(UnsatProof { conflict, trail }));
                    };
                    trail.rewind(top.mark);
                    top.flipped = true;
                    trail.assign(top.var, false, Reason::Decision)?;
                    stats.decisions += 1;
                }
            }
        }
    }
}

/// Hint variables first, in supplied order, then ascending variable id.
fn next_decision(trail: &Trail, hint_vars: &[u32], num_vars: u32) -> Option<u32> {
    for &var in hint_vars {
        if var >= 1 && trail.value(var).is_none() {
            return Some(var);
        }
    }
    (1..=num_vars).find(|&var| trail.value(var).is_none())
}

fn model_of(trail: &Trail) -> BTreeMap<u32, bool> {
    trail
        .entries()
        .iter()
        .map(|entry| (entry.var, entry.value))
        .collect()
}
