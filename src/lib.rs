//! Diagnose why a CNF is unsatisfiable under a set of unit assumptions.

pub mod cnf;
pub mod explain;
pub mod report;
pub mod sat;
