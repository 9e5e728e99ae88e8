use anyhow::{bail, Result};

use crate::cnf::store::ClauseView;
use crate::sat::trail::{Reason, Trail};
use crate::sat::{AbortSignal, Conflict, SolverStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Propagation {
    Fixpoint,
    Conflict(Conflict),
    Aborted,
}

/// Unit propagation to fixpoint over the active view.
///
/// Full-sweep scan in ascending cid order, literals in load order, so when
/// two clauses could fire in the same iteration the lower cid wins. Units
/// assigned earlier in a sweep are visible to the clauses scanned after
/// them. An empty clause conflicts with no falsifying literals.
pub fn propagate(
    view: &ClauseView,
    trail: &mut Trail,
    abort: &AbortSignal,
    stats: &mut SolverStats,
) -> Result<Propagation> {
    loop {
        if abort.is_aborted() {
            return Ok(Propagation::Aborted);
        }
        let mut changed = false;
        for clause in view.iter() {
            let mut satisfied = false;
            let mut open = 0usize;
            let mut unit = None;
            for &lit in &clause.lits {
                match trail.lit_value(lit) {
                    Some(true) => {
                        satisfied = true;
                        break;
                    }
                    Some(false) => {}
                    None => {
                        open += 1;
                        unit = Some(lit);
                    }
                }
            }
            if satisfied {
                continue;
            }
            if open == 0 {
                stats.conflicts += 1;
                return Ok(Propagation::Conflict(Conflict::Clause {
                    cid: clause.cid,
                    falsified: clause.lits.clone(),
                }));
            }
            if open == 1 {
                let Some(lit) = unit else {
                    bail!("unit clause {} lost its open literal", clause.cid);
                };
                if trail
                    .assign(lit.var, lit.sign, Reason::Propagated(clause.cid))
                    .is_err()
                {
                    bail!(
                        "propagation from clause {} tried to reassign variable {}",
                        clause.cid,
                        lit.var
                    );
                }
                stats.propagations += 1;
                changed = true;
            }
        }
        if !changed {
            return Ok(Propagation::Fixpoint);
        }
    }
}
