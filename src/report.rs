use std::collections::BTreeMap;

use anyhow::{bail, Result};
use indexmap::IndexSet;
use log::{debug, info};
use serde::Serialize;

use crate::cnf::store::{ClauseStore, ClauseView, Lit};
use crate::explain::explanation::{build_explanation, ConflictClause, Explanation};
use crate::explain::mus::{shrink_mus, MusOutcome};
use crate::sat::dpll::{solve, SearchResult};
use crate::sat::{AbortSignal, SolverStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseInfo {
    pub cid: Option<usize>,
    pub rule_id: String,
    pub note: String,
    pub literals: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationInfo {
    pub conflict_clause: ClauseInfo,
    pub falsified_literals: Vec<i32>,
    pub assumption_causes: Vec<i32>,
    /// Conflict clause at position 0, then reason clauses in first-visit
    /// order.
    pub involved_rules: Vec<ClauseInfo>,
}

/// The structured value handed to the serializer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Report {
    Sat {
        model: BTreeMap<u32, bool>,
    },
    UnsatWithCore {
        primary_explanation: ExplanationInfo,
        mus_size: usize,
        mus_clauses: Vec<ClauseInfo>,
        mus_rules: Vec<String>,
        hints_used: Vec<i32>,
        hint_fallback: bool,
    },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub report: Report,
    pub stats: SolverStats,
}

/// Top-level driver: one full solve, then on UNSAT the explanation walk and
/// the MUS shrink seeded from the clauses the explanation touched.
pub fn explain_with_mus(
    store: &ClauseStore,
    assumptions: &[Lit],
    hints: &[Lit],
    abort: &AbortSignal,
) -> Result<Outcome> {
    let mut stats = SolverStats::default();
    let hint_vars = hint_vars_of(hints);
    let view = ClauseView::full(store);

    let report = match solve(&view, assumptions, &hint_vars, abort, &mut stats)? {
        SearchResult::Cancelled => Report::Cancelled,
        SearchResult::Sat(model) => {
            info!("satisfiable, {} variables assigned", model.len());
            Report::Sat { model }
        }
        SearchResult::Unsat(proof) => {
            let explanation = build_explanation(store, &proof)?;

            let mut candidate = explanation.involved.clone();
            if let Some(cid) = explanation.conflict.cid {
                candidate.push(cid);
            }
            candidate.sort_unstable();
            candidate.dedup();

            let subset = ClauseView::subset(store, &candidate);
            let seed = match solve(&subset, assumptions, &hint_vars, abort, &mut stats)? {
                SearchResult::Unsat(_) => candidate,
                SearchResult::Sat(_) => {
                    debug!("explanation candidate set is satisfiable, shrinking the full problem");
                    store.all_cids().collect()
                }
                SearchResult::Cancelled => {
                    return Ok(Outcome {
                        report: Report::Cancelled,
                        stats,
                    })
                }
            };

            match shrink_mus(store, &seed, assumptions, &hint_vars, abort, &mut stats)? {
                MusOutcome::Cancelled => Report::Cancelled,
                MusOutcome::Minimal {
                    cids,
                    hint_fallback,
                } => {
                    info!(
                        "unsatisfiable, core of {} clauses after {} solver calls",
                        cids.len(),
                        stats.solve_calls
                    );
                    unsat_report(store, &explanation, &cids, hints, hint_fallback)?
                }
            }
        }
    };

    Ok(Outcome { report, stats })
}

/// SAT/UNSAT check without the explanation machinery; the shape callers use
/// when only the verdict matters.
pub fn check_unsat(
    store: &ClauseStore,
    assumptions: &[Lit],
    hints: &[Lit],
    abort: &AbortSignal,
    stats: &mut SolverStats,
) -> Result<Option<bool>> {
    let view = ClauseView::full(store);
    Ok(
        match solve(&view, assumptions, &hint_vars_of(hints), abort, stats)? {
            SearchResult::Sat(_) => Some(false),
            SearchResult::Unsat(_) => Some(true),
            SearchResult::Cancelled => None,
        },
    )
}

fn unsat_report(
    store: &ClauseStore,
    explanation: &Explanation,
    mus_cids: &[usize],
    hints: &[Lit],
    hint_fallback: bool,
) -> Result<Report> {
    let conflict_clause = conflict_info(&explanation.conflict);
    let mut involved_rules = vec![conflict_clause.clone()];
    for &cid in &explanation.involved {
        involved_rules.push(stored_info(store, cid)?);
    }

    let mut mus_clauses = Vec::with_capacity(mus_cids.len());
    let mut mus_rules: IndexSet<String> = IndexSet::new();
    for &cid in mus_cids {
        let info = stored_info(store, cid)?;
        if !info.rule_id.is_empty() {
            mus_rules.insert(info.rule_id.clone());
        }
        mus_clauses.push(info);
    }

    Ok(Report::UnsatWithCore {
        primary_explanation: ExplanationInfo {
            conflict_clause,
            falsified_literals: dimacs_vec(&explanation.falsified),
            assumption_causes: dimacs_vec(&explanation.assumption_causes),
            involved_rules,
        },
        mus_size: mus_clauses.len(),
        mus_clauses,
        mus_rules: mus_rules.into_iter().collect(),
        hints_used: dimacs_vec(hints),
        hint_fallback,
    })
}

fn stored_info(store: &ClauseStore, cid: usize) -> Result<ClauseInfo> {
    let Some(clause) = store.get(cid) else {
        bail!("clause {cid} is not in the store");
    };
    Ok(ClauseInfo {
        cid: Some(cid),
        rule_id: clause.rule_id.clone(),
        note: clause.note.clone(),
        literals: dimacs_vec(&clause.lits),
    })
}

fn conflict_info(conflict: &ConflictClause) -> ClauseInfo {
    ClauseInfo {
        cid: conflict.cid,
        rule_id: conflict.rule_id.clone(),
        note: conflict.note.clone(),
        literals: dimacs_vec(&conflict.lits),
    }
}

fn dimacs_vec(lits: &[Lit]) -> Vec<i32> {
    lits.iter().map(|lit| lit.to_dimacs()).collect()
}

/// Hint variables in supplied order, signs ignored, duplicates dropped.
fn hint_vars_of(hints: &[Lit]) -> Vec<u32> {
    let vars: IndexSet<u32> = hints.iter().map(|lit| lit.var).collect();
    vars.into_iter().collect()
}
