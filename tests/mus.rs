use satexplain::cnf::store::{ClauseStore, Lit, RawClause};
use satexplain::explain::mus::{shrink_mus, MusOutcome};
use satexplain::sat::{AbortSignal, SolverStats};

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

fn shrink(
    store: &ClauseStore,
    candidate: &[usize],
    assumptions: &[i32],
    hint_vars: &[u32],
) -> MusOutcome {
    let mut stats = SolverStats::default();
    shrink_mus(
        store,
        candidate,
        &lits(assumptions),
        hint_vars,
        &AbortSignal::new(),
        &mut stats,
    )
    .expect("shrink")
}

#[test]
fn deletion_pass_removes_redundant_clauses_in_ascending_order() {
    let cnf = store(
        6,
        &[
            (&[-1, 2], "a"),
            (&[-2, 3], "b"),
            (&[-3], "c"),
            (&[5, 6], "d"),
            (&[-5, 6], "e"),
        ],
    );
    let candidate: Vec<usize> = cnf.all_cids().collect();
    match shrink(&cnf, &candidate, &[1], &[]) {
        MusOutcome::Minimal {
            cids,
            hint_fallback,
        } => {
            assert_eq!(cids, vec![1, 2, 3]);
            assert!(!hint_fallback);
        }
        MusOutcome::Cancelled => panic!("unexpected cancellation"),
    }
}

#[test]
fn hint_subset_that_is_unsat_focuses_the_core() {
    // two independent cores: {1,2} over vars 1-2 and {3} against assumption 5
    let cnf = store(5, &[(&[-1, 2], "a"), (&[-2], "b"), (&[-5], "c")]);
    let candidate: Vec<usize> = cnf.all_cids().collect();

    // ascending deletion keeps only the later core
    match shrink(&cnf, &candidate, &[1, 5], &[]) {
        MusOutcome::Minimal { cids, .. } => assert_eq!(cids, vec![3]),
        MusOutcome::Cancelled => panic!("unexpected cancellation"),
    }

    // a hint on var 2 selects the clauses mentioning it, which are unsat
    // on their own, so the shrinker never looks at clause 3
    match shrink(&cnf, &candidate, &[1, 5], &[2]) {
        MusOutcome::Minimal {
            cids,
            hint_fallback,
        } => {
            assert_eq!(cids, vec![1, 2]);
            assert!(!hint_fallback);
        }
        MusOutcome::Cancelled => panic!("unexpected cancellation"),
    }
}

#[test]
fn satisfiable_hint_subset_falls_back_to_the_candidate() {
    let cnf = store(5, &[(&[-1, 2], "a"), (&[-2], "b"), (&[3, 4], "filler")]);
    let candidate: Vec<usize> = cnf.all_cids().collect();
    match shrink(&cnf, &candidate, &[1], &[3]) {
        MusOutcome::Minimal {
            cids,
            hint_fallback,
        } => {
            assert_eq!(cids, vec![1, 2]);
            assert!(hint_fallback);
        }
        MusOutcome::Cancelled => panic!("unexpected cancellation"),
    }
}

#[test]
fn preset_abort_flag_cancels_the_shrink() {
    let cnf = store(2, &[(&[1], "a"), (&[-1], "b")]);
    let candidate: Vec<usize> = cnf.all_cids().collect();
    let abort = AbortSignal::new();
    abort.abort();
    let mut stats = SolverStats::default();
    let outcome = shrink_mus(&cnf, &candidate, &[], &[], &abort, &mut stats).expect("shrink");
    assert_eq!(outcome, MusOutcome::Cancelled);
}
