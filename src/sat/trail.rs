use thiserror::Error;

use crate::cnf::store::Lit;

/// Why a variable holds its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Assumption(Lit),
    Decision,
    Propagated(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub var: u32,
    pub value: bool,
    pub reason: Reason,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("variable {var} is already on the trail")]
pub struct AlreadyAssigned {
    pub var: u32,
}

/// Opaque token for `rewind`; marks are nested, rewinding to an outer mark
/// drops everything recorded after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// Ordered stack of assignments with an O(1) variable lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trail {
    entries: Vec<Entry>,
    position: Vec<Option<usize>>,
    decisions: usize,
}

impl Trail {
    pub fn new(num_vars: u32) -> Self {
        Self {
            entries: Vec::new(),
            position: vec![None; num_vars as usize + 1],
            decisions: 0,
        }
    }

    pub fn assign(&mut self, var: u32, value: bool, reason: Reason) -> Result<(), AlreadyAssigned> {
        let slot = var as usize;
        if slot >= self.position.len() {
            self.position.resize(slot + 1, None);
        }
        if self.position[slot].is_some() {
            return Err(AlreadyAssigned { var });
        }
        self.position[slot] = Some(self.entries.len());
        if matches!(reason, Reason::Decision) {
            self.decisions += 1;
        }
        self.entries.push(Entry { var, value, reason });
        Ok(())
    }

    pub fn value(&self, var: u32) -> Option<bool> {
        self.entry(var).map(|e| e.value)
    }

    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.value(lit.var).map(|v| v == lit.sign)
    }

    pub fn entry(&self, var: u32) -> Option<&Entry> {
        let pos = (*self.position.get(var as usize)?)?;
        Some(&self.entries[pos])
    }

    /// Trail position of a variable's entry, if assigned.
    pub fn position(&self, var: u32) -> Option<usize> {
        *self.position.get(var as usize)?
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Count of `Decision` entries currently on the trail.
    pub fn decision_level(&self) -> usize {
        self.decisions
    }

    pub fn mark(&self) -> Mark {
        Mark(self.entries.len())
    }

    /// Removes entries back to the marked depth and clears their variable
    /// mappings.
    pub fn rewind(&mut self, mark: Mark) {
        let keep = mark.0.min(self.entries.len());
        for entry in self.entries.drain(keep..) {
            self.position[entry.var as usize] = None;
            if matches!(entry.reason, Reason::Decision) {
                self.decisions -= 1;
            }
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
