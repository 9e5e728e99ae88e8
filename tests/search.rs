use satexplain::cnf::store::{ClauseStore, ClauseView, Lit, RawClause};
use satexplain::explain::explanation::build_explanation;
use satexplain::report::{explain_with_mus, Report};
use satexplain::sat::dpll::{solve, SearchResult, UnsatProof};
use satexplain::sat::trail::Reason;
use satexplain::sat::{AbortSignal, Conflict, SolverStats};

fn store(num_vars: u32, clauses: &[(&[i32], &str)]) -> ClauseStore {
    let raw = clauses
        .iter()
        .map(|(lits, rule)| RawClause::new(lits.to_vec(), rule, ""))
        .collect();
    ClauseStore::build(num_vars, raw).expect("build store")
}

fn lits(values: &[i32]) -> Vec<Lit> {
    values
        .iter()
        .map(|&v| Lit::from_dimacs(v).expect("nonzero literal"))
        .collect()
}

fn run(store: &ClauseStore, assumptions: &[i32], hint_vars: &[u32]) -> SearchResult {
    let view = ClauseView::full(store);
    let mut stats = SolverStats::default();
    solve(
        &view,
        &lits(assumptions),
        hint_vars,
        &AbortSignal::new(),
        &mut stats,
    )
    .expect("solve")
}

fn unsat(result: SearchResult) -> UnsatProof {
    match result {
        SearchResult::Unsat(proof) => proof,
        other => panic!("expected unsat, got {other:?}"),
    }
}

#[test]
fn propagation_chain_records_reasons_in_trail_order() {
    let cnf = store(3, &[(&[-1, 2], "a"), (&[-2, 3], "b"), (&[-3], "c")]);
    let proof = unsat(run(&cnf, &[1], &[]));
    assert_eq!(
        proof.conflict,
        Conflict::Clause {
            cid: 3,
            falsified: vec![Lit::new(3, false)],
        }
    );
    let reasons: Vec<(u32, Reason)> = proof
        .trail
        .entries()
        .iter()
        .map(|e| (e.var, e.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (1, Reason::Assumption(Lit::new(1, true))),
            (2, Reason::Propagated(1)),
            (3, Reason::Propagated(2)),
        ]
    );
    assert_eq!(proof.trail.decision_level(), 0);
}

#[test]
fn direct_assumption_clash_is_synthetic() {
    let cnf = store(2, &[(&[1, 2], "r")]);
    let proof = unsat(run(&cnf, &[1, -1], &[]));
    assert_eq!(
        proof.conflict,
        Conflict::AssumptionClash {
            current: Lit::new(1, true),
            rejected: Lit::new(1, false),
        }
    );
}

#[test]
fn assumption_falsified_by_propagation_clashes_and_names_both_roots() {
    let cnf = store(2, &[(&[-1, 2], "chain")]);
    let proof = unsat(run(&cnf, &[1, -2], &[]));
    assert_eq!(
        proof.conflict,
        Conflict::AssumptionClash {
            current: Lit::new(2, true),
            rejected: Lit::new(2, false),
        }
    );
    let explanation = build_explanation(&cnf, &proof).expect("explanation");
    assert_eq!(explanation.conflict.cid, None);
    assert_eq!(
        explanation.assumption_causes,
        vec![Lit::new(1, true), Lit::new(2, false)]
    );
    assert_eq!(explanation.involved, vec![1]);
}

#[test]
fn duplicate_assumption_is_benign() {
    let cnf = store(2, &[(&[1, 2], "r")]);
    match run(&cnf, &[1, 1], &[]) {
        SearchResult::Sat(model) => assert_eq!(model.get(&1), Some(&true)),
        other => panic!("expected sat, got {other:?}"),
    }
}

#[test]
fn decision_in_reason_chain_is_reported_as_pseudo_assumption() {
    let cnf = store(
        2,
        &[
            (&[1, 2], "p"),
            (&[1, -2], "q"),
            (&[-1, 2], "r"),
            (&[-1, -2], "s"),
        ],
    );
    let proof = unsat(run(&cnf, &[], &[]));
    assert_eq!(
        proof.conflict,
        Conflict::Clause {
            cid: 2,
            falsified: vec![Lit::new(1, true), Lit::new(2, false)],
        }
    );
    let explanation = build_explanation(&cnf, &proof).expect("explanation");
    assert_eq!(explanation.assumption_causes, vec![Lit::new(1, false)]);
    assert_eq!(explanation.involved, vec![1]);

    let report = explain_with_mus(&cnf, &[], &[], &AbortSignal::new())
        .expect("explain")
        .report;
    match report {
        Report::UnsatWithCore { mus_clauses, .. } => {
            let cids: Vec<usize> = mus_clauses.iter().map(|c| c.cid.expect("cid")).collect();
            assert_eq!(cids, vec![1, 2, 3, 4]);
        }
        other => panic!("expected unsat report, got {other:?}"),
    }
}

#[test]
fn hints_steer_the_decision_order() {
    let cnf = store(2, &[(&[-1, -2], "r")]);
    match run(&cnf, &[], &[]) {
        SearchResult::Sat(model) => {
            assert_eq!(model.get(&1), Some(&true));
            assert_eq!(model.get(&2), Some(&false));
        }
        other => panic!("expected sat, got {other:?}"),
    }
    match run(&cnf, &[], &[2]) {
        SearchResult::Sat(model) => {
            assert_eq!(model.get(&2), Some(&true));
            assert_eq!(model.get(&1), Some(&false));
        }
        other => panic!("expected sat, got {other:?}"),
    }
}

#[test]
fn hint_variable_outside_the_problem_is_still_decided() {
    let cnf = store(1, &[(&[1], "r")]);
    match run(&cnf, &[], &[9]) {
        SearchResult::Sat(model) => {
            assert_eq!(model.get(&9), Some(&true));
            assert_eq!(model.get(&1), Some(&true));
        }
        other => panic!("expected sat, got {other:?}"),
    }
}

#[test]
fn preset_abort_flag_cancels_the_solve() {
    let cnf = store(2, &[(&[1, 2], "r")]);
    let abort = AbortSignal::new();
    abort.abort();
    let view = ClauseView::full(&cnf);
    let mut stats = SolverStats::default();
    let result = solve(&view, &[], &[], &abort, &mut stats).expect("solve");
    assert_eq!(result, SearchResult::Cancelled);

    let outcome = explain_with_mus(&cnf, &[], &[], &abort).expect("explain");
    assert_eq!(outcome.report, Report::Cancelled);
}
