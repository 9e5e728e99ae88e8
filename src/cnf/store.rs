use thiserror::Error;

/// A signed literal: `sign` is true for the positive phase of `var`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    pub var: u32,
    pub sign: bool,
}

impl Lit {
    pub fn new(var: u32, sign: bool) -> Self {
        Self { var, sign }
    }

    pub fn neg(self) -> Self {
        Self {
            var: self.var,
            sign: !self.sign,
        }
    }

    /// Builds a literal from the signed nonzero integer encoding used at
    /// every external boundary. Returns `None` for the reserved value 0.
    pub fn from_dimacs(value: i32) -> Option<Self> {
        if value == 0 {
            return None;
        }
        Some(Self {
            var: value.unsigned_abs(),
            sign: value > 0,
        })
    }

    pub fn to_dimacs(self) -> i32 {
        let v = self.var as i32;
        if self.sign { v } else { -v }
    }
}

/// A clause as the caller supplied it, before load-time checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClause {
    pub lits: Vec<i32>,
    pub rule_id: String,
    pub note: String,
}

impl RawClause {
    pub fn new(lits: Vec<i32>, rule_id: &str, note: &str) -> Self {
        Self {
            lits,
            rule_id: rule_id.to_string(),
            note: note.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedClause {
    #[error("clause {index} contains the reserved literal 0")]
    ZeroLiteral { index: usize },
    #[error("clause {index} repeats literal {literal}")]
    DuplicateLiteral { index: usize, literal: i32 },
}

/// A stored clause. `cid` is dense, 1-based in load order, and stable for
/// the lifetime of a solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub cid: usize,
    pub lits: Vec<Lit>,
    pub rule_id: String,
    pub note: String,
}

/// Immutable clause catalogue. Built once per top-level solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseStore {
    num_vars: u32,
    clauses: Vec<Clause>,
}

impl ClauseStore {
    /// Checks and stores the caller's clauses.
    ///
    /// A 0 literal or a duplicated literal is fatal. A clause containing
    /// both `l` and `-l` is trivially true and is elided without consuming
    /// a cid. An empty clause is retained; it falsifies every view that
    /// contains it. `num_vars` grows to cover every mentioned variable.
    pub fn build(num_vars: u32, raw: Vec<RawClause>) -> Result<Self, MalformedClause> {
        let mut clauses = Vec::with_capacity(raw.len());
        let mut max_var = num_vars;
        for (pos, input) in raw.into_iter().enumerate() {
            let index = pos + 1;
            let mut lits = Vec::with_capacity(input.lits.len());
            let mut tautology = false;
            for &value in &input.lits {
                let Some(lit) = Lit::from_dimacs(value) else {
                    return Err(MalformedClause::ZeroLiteral { index });
                };
                if lits.contains(&lit) {
                    return Err(MalformedClause::DuplicateLiteral {
                        index,
                        literal: value,
                    });
                }
                if lits.contains(&lit.neg()) {
                    tautology = true;
                    break;
                }
                max_var = max_var.max(lit.var);
                lits.push(lit);
            }
            if tautology {
                continue;
            }
            clauses.push(Clause {
                cid: clauses.len() + 1,
                lits,
                rule_id: input.rule_id,
                note: input.note,
            });
        }
        Ok(Self {
            num_vars: max_var,
            clauses,
        })
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn get(&self, cid: usize) -> Option<&Clause> {
        if cid == 0 {
            return None;
        }
        self.clauses.get(cid - 1)
    }

    pub fn all_cids(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.clauses.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub fn with_subset(&self, cids: &[usize]) -> ClauseView<'_> {
        ClauseView::subset(self, cids)
    }
}

/// Read-only view restricted to a subset of clause ids, iterated in
/// ascending cid order.
#[derive(Debug, Clone)]
pub struct ClauseView<'a> {
    store: &'a ClauseStore,
    active: Vec<usize>,
}

impl<'a> ClauseView<'a> {
    pub fn full(store: &'a ClauseStore) -> Self {
        Self {
            store,
            active: store.all_cids().collect(),
        }
    }

    pub fn subset(store: &'a ClauseStore, cids: &[usize]) -> Self {
        let mut active: Vec<usize> = cids
            .iter()
            .copied()
            .filter(|&cid| store.get(cid).is_some())
            .collect();
        active.sort_unstable();
        active.dedup();
        Self { store, active }
    }

    pub fn num_vars(&self) -> u32 {
        self.store.num_vars()
    }

    pub fn cids(&self) -> &[usize] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Clause> + '_ {
        self.active.iter().filter_map(|&cid| self.store.get(cid))
    }
}
