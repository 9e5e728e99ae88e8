use std::fs;

use anyhow::{bail, Context, Result};

use crate::cnf::store::{ClauseStore, RawClause};

/// Parses DIMACS CNF extended with per-clause metadata.
///
/// A comment of the form `c rule <rule_id> [note...]` attaches metadata to
/// the next clause line; every other `c` line is skipped. Clauses are single
/// lines of literals terminated by `0`; a bare `0` line is an empty clause.
pub fn parse_annotated_dimacs(input: &str) -> Result<ClauseStore> {
    let mut declared_vars: Option<u32> = None;
    let mut raw = Vec::new();
    let mut pending_rule: Option<(String, String)> = None;

    for (idx, line) in input.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('c') {
            if let Some(meta) = rest.trim_start().strip_prefix("rule ") {
                let meta = meta.trim();
                let (rule_id, note) = match meta.split_once(char::is_whitespace) {
                    Some((id, note)) => (id.to_string(), note.trim().to_string()),
                    None => (meta.to_string(), String::new()),
                };
                if rule_id.is_empty() {
                    bail!("rule annotation on line {lineno} is missing an id");
                }
                pending_rule = Some((rule_id, note));
            }
            continue;
        }

        if line.starts_with('p') {
            let parts: Vec<_> = line.split_whitespace().collect();
            if parts.len() < 4 || parts[1] != "cnf" {
                bail!("invalid DIMACS header: {line}");
            }
            declared_vars = Some(
                parts[2]
                    .parse::<u32>()
                    .context("invalid variable count in DIMACS header")?,
            );
            continue;
        }

        let mut lits = Vec::new();
        let mut terminated = false;
        for tok in line.split_whitespace() {
            let lit = tok
                .parse::<i32>()
                .with_context(|| format!("invalid literal {tok:?} on line {lineno}"))?;
            if lit == 0 {
                terminated = true;
                break;
            }
            lits.push(lit);
        }
        if !terminated {
            bail!("clause on line {lineno} is not terminated by 0");
        }
        let (rule_id, note) = pending_rule.take().unwrap_or_default();
        raw.push(RawClause { lits, rule_id, note });
    }

    let Some(num_vars) = declared_vars else {
        bail!("DIMACS input does not contain a valid problem line");
    };
    Ok(ClauseStore::build(num_vars, raw)?)
}

pub fn load_annotated_dimacs(path: &str) -> Result<ClauseStore> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read CNF file {path}"))?;
    parse_annotated_dimacs(&content)
}

pub fn to_annotated_dimacs(store: &ClauseStore) -> String {
    let mut out = String::new();
    out.push_str(&format!("p cnf {} {}\n", store.num_vars(), store.len()));
    for clause in store.iter() {
        if !clause.rule_id.is_empty() {
            if clause.note.is_empty() {
                out.push_str(&format!("c rule {}\n", clause.rule_id));
            } else {
                out.push_str(&format!("c rule {} {}\n", clause.rule_id, clause.note));
            }
        }
        for &lit in &clause.lits {
            out.push_str(&format!("{} ", lit.to_dimacs()));
        }
        out.push_str("0\n");
    }
    out
}
