use std::collections::{HashSet, VecDeque};

use anyhow::{bail, Result};
use indexmap::IndexSet;

use crate::cnf::store::{ClauseStore, Lit};
use crate::sat::dpll::UnsatProof;
use crate::sat::trail::Reason;
use crate::sat::Conflict;

/// The conflicting clause as reported to the caller. `cid` is `None` for
/// the synthetic assumption-clash conflict, which has no stored clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictClause {
    pub cid: Option<usize>,
    pub lits: Vec<Lit>,
    pub rule_id: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub conflict: ConflictClause,
    pub falsified: Vec<Lit>,
    /// Assumption literals that transitively caused the falsification, in
    /// first-seen order. A decision reached by the walk appears here as a
    /// pseudo-assumption so the report stays total.
    pub assumption_causes: Vec<Lit>,
    /// Clause ids visited through `Propagated` reasons, in first-visit
    /// order; the conflict clause itself is not listed.
    pub involved: Vec<usize>,
}

/// Walks reason links from the conflict back to assumption roots.
///
/// Worklist of literals seeded with the falsified literals in clause order,
/// deduplicated by variable; acyclicity of the reason graph bounds the walk.
pub fn build_explanation(store: &ClauseStore, proof: &UnsatProof) -> Result<Explanation> {
    let trail = &proof.trail;
    let (conflict, falsified, clashing) = match &proof.conflict {
        Conflict::Clause { cid, falsified } => {
            let Some(clause) = store.get(*cid) else {
                bail!("conflict clause {cid} is not in the store");
            };
            let info = ConflictClause {
                cid: Some(*cid),
                lits: clause.lits.clone(),
                rule_id: clause.rule_id.clone(),
                note: clause.note.clone(),
            };
            (info, falsified.clone(), None)
        }
        Conflict::AssumptionClash { current, rejected } => {
            let info = ConflictClause {
                cid: None,
                lits: vec![*current, *rejected],
                rule_id: String::new(),
                note: String::new(),
            };
            (info, vec![*rejected], Some(*rejected))
        }
    };

    let mut causes: IndexSet<Lit> = IndexSet::new();
    let mut involved: IndexSet<usize> = IndexSet::new();
    let mut seen: HashSet<u32> = HashSet::new();
    let mut queue: VecDeque<Lit> = VecDeque::new();
    for &lit in &falsified {
        if seen.insert(lit.var) {
            queue.push_back(lit);
        }
    }

    while let Some(lit) = queue.pop_front() {
        let Some(entry) = trail.entry(lit.var) else {
            bail!("literal {} has no trail entry to explain", lit.to_dimacs());
        };
        match entry.reason {
            Reason::Assumption(a) => {
                causes.insert(a);
            }
            Reason::Decision => {
                causes.insert(Lit::new(entry.var, entry.value));
            }
            Reason::Propagated(cid) => {
                involved.insert(cid);
                let Some(clause) = store.get(cid) else {
                    bail!("reason clause {cid} is not in the store");
                };
                for &other in &clause.lits {
                    if other.var != entry.var && seen.insert(other.var) {
                        queue.push_back(other);
                    }
                }
            }
        }
    }

    // the rejected assumption is itself a root cause of the clash
    if let Some(rejected) = clashing {
        causes.insert(rejected);
    }

    Ok(Explanation {
        conflict,
        falsified,
        assumption_causes: causes.into_iter().collect(),
        involved: involved.into_iter().collect(),
    })
}
