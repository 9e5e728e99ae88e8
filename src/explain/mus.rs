use anyhow::Result;
use log::debug;

use crate::cnf::store::{ClauseStore, ClauseView, Lit};
use crate::sat::dpll::{solve, SearchResult};
use crate::sat::{AbortSignal, SolverStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusOutcome {
    Minimal {
        /// Subset-minimal UNSAT core, ascending cid order.
        cids: Vec<usize>,
        /// True when the hint-focused subset probed SAT and the shrinker
        /// fell back to the full candidate set.
        hint_fallback: bool,
    },
    Cancelled,
}

enum Probe {
    Sat,
    Unsat,
    Cancelled,
}

/// Deletion-based MUS shrinker over a candidate set known to be UNSAT with
/// the assumptions.
///
/// If hint variables are given, the subset of candidates mentioning any of
/// them is probed first and becomes the working set when it is already
/// UNSAT. The deletion loop then probes each clause in ascending cid order:
/// removable clauses are dropped permanently, the rest are essential. One
/// pass leaves a subset-minimal core; it is not cardinality-minimal.
pub fn shrink_mus(
    store: &ClauseStore,
    candidate: &[usize],
    assumptions: &[Lit],
    hint_vars: &[u32],
    abort: &AbortSignal,
    stats: &mut SolverStats,
) -> Result<MusOutcome> {
    let mut working = candidate.to_vec();
    let mut hint_fallback = false;

    if !hint_vars.is_empty() {
        let focused: Vec<usize> = candidate
            .iter()
            .copied()
            .filter(|&cid| mentions_any(store, cid, hint_vars))
            .collect();
        match probe(store, &focused, assumptions, hint_vars, abort, stats)? {
            Probe::Unsat => {
                debug!(
                    "hint subset of {} clauses is unsat, shrinking from it",
                    focused.len()
                );
                working = focused;
            }
            Probe::Sat => {
                debug!(
                    "hint subset is satisfiable, falling back to {} candidate clauses",
                    candidate.len()
                );
                hint_fallback = true;
            }
            Probe::Cancelled => return Ok(MusOutcome::Cancelled),
        }
    }

    let mut i = 0;
    while i < working.len() {
        if abort.is_aborted() {
            return Ok(MusOutcome::Cancelled);
        }
        let mut test = working.clone();
        let removed = test.remove(i);
        match probe(store, &test, assumptions, hint_vars, abort, stats)? {
            Probe::Unsat => {
                debug!("clause {removed} is redundant");
                working = test;
            }
            Probe::Sat => {
                debug!("clause {removed} is essential");
                i += 1;
            }
            Probe::Cancelled => return Ok(MusOutcome::Cancelled),
        }
    }

    Ok(MusOutcome::Minimal {
        cids: working,
        hint_fallback,
    })
}

fn probe(
    store: &ClauseStore,
    cids: &[usize],
    assumptions: &[Lit],
    hint_vars: &[u32],
    abort: &AbortSignal,
    stats: &mut SolverStats,
) -> Result<Probe> {
    let view = ClauseView::subset(store, cids);
    Ok(match solve(&view, assumptions, hint_vars, abort, stats)? {
        SearchResult::Sat(_) => Probe::Sat,
        SearchResult::Unsat(_) => Probe::Unsat,
        SearchResult::Cancelled => Probe::Cancelled,
    })
}

fn mentions_any(store: &ClauseStore, cid: usize, hint_vars: &[u32]) -> bool {
    store
        .get(cid)
        .is_some_and(|clause| clause.lits.iter().any(|lit| hint_vars.contains(&lit.var)))
}
