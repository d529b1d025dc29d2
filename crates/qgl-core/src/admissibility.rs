//! Admissibility engine - decides whether a program satisfies the global
//! structural invariants
//!
//! # Checks (in precedence order)
//!
//! 1. **Self-containment**: no boundary lists itself
//! 2. **Circular containment**: no two boundaries list each other
//!    (or, with [`CycleDetection::Transitive`], no containment cycle at all)
//! 3. **Label resolution**: both sides of every qubit appear in some domain,
//!    compound `a⊕b` labels contributing each half
//! 4. **Containment completeness**: every domain and qubit is a member of
//!    some boundary; all misses are reported together
//!
//! Checks 1–3 stop at the first violation. The verdict is a pure function
//! of the program: the engine's ledger is bookkeeping and never read back.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::normalizer::fingerprint;
use crate::parser::ast::Program;

/// Reason attached to every admissible verdict
pub const ADMISSIBLE_REASON: &str = "Structure is admissible";

// ── Configuration ─────────────────────────────────────────

/// How far the circular-containment check looks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleDetection {
    /// Pairwise scan for A ∋ B ∧ B ∋ A only
    #[default]
    Direct,
    /// Depth-first search for containment cycles of any length
    Transitive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissibilityConfig {
    pub cycle_detection: CycleDetection,
}

// ── Verdict ───────────────────────────────────────────────

/// Category of a failed check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    SelfContainment,
    CircularContainment,
    UnresolvedLabel,
    Uncontained,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ViolationKind::SelfContainment => write!(f, "self-containment"),
            ViolationKind::CircularContainment => write!(f, "circular-containment"),
            ViolationKind::UnresolvedLabel => write!(f, "unresolved-label"),
            ViolationKind::Uncontained => write!(f, "uncontained"),
        }
    }
}

/// Outcome of an admissibility check.
///
/// Callers branch on `admissible` only; `reason` is for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub admissible: bool,
    pub reason: String,
    pub kind: Option<ViolationKind>,
}

impl Verdict {
    fn admissible() -> Self {
        Verdict {
            admissible: true,
            reason: ADMISSIBLE_REASON.to_string(),
            kind: None,
        }
    }
}

#[derive(Debug)]
struct Violation {
    kind: ViolationKind,
    reason: String,
}

impl Violation {
    fn new(kind: ViolationKind, reason: String) -> Self {
        Violation { kind, reason }
    }
}

impl From<Violation> for Verdict {
    fn from(v: Violation) -> Self {
        Verdict {
            admissible: false,
            reason: v.reason,
            kind: Some(v.kind),
        }
    }
}

// ── Public API ────────────────────────────────────────────

/// Check a program against every invariant. Pure; records nothing.
pub fn check(program: &Program, config: &AdmissibilityConfig) -> Verdict {
    match run_checks(program, config) {
        Ok(()) => Verdict::admissible(),
        Err(violation) => violation.into(),
    }
}

fn run_checks(program: &Program, config: &AdmissibilityConfig) -> Result<(), Violation> {
    check_self_containment(program)?;

    let graph = containment_graph(program);
    match config.cycle_detection {
        CycleDetection::Direct => check_direct_cycles(&graph)?,
        CycleDetection::Transitive => check_transitive_cycles(&graph)?,
    }

    check_qubit_labels(program)?;
    check_containment(program)
}

// ── Check 1: Self-containment ─────────────────────────────

fn check_self_containment(program: &Program) -> Result<(), Violation> {
    match program.boundaries.iter().find(|b| b.contains(&b.name)) {
        Some(b) => Err(Violation::new(
            ViolationKind::SelfContainment,
            format!("Boundary '{}' contains itself", b.name),
        )),
        None => Ok(()),
    }
}

// ── Check 2: Circular containment ─────────────────────────

type Graph<'p> = BTreeMap<&'p str, BTreeSet<&'p str>>;

/// Boundary name → members; repeated declarations of one name are merged
fn containment_graph(program: &Program) -> Graph<'_> {
    let mut graph: Graph<'_> = BTreeMap::new();
    for boundary in &program.boundaries {
        graph
            .entry(boundary.name.as_str())
            .or_default()
            .extend(boundary.members.iter().map(String::as_str));
    }
    graph
}

fn check_direct_cycles(graph: &Graph<'_>) -> Result<(), Violation> {
    for (&a, members) in graph {
        for &b in members {
            if graph.get(b).is_some_and(|inner| inner.contains(a)) {
                return Err(Violation::new(
                    ViolationKind::CircularContainment,
                    format!(
                        "Circular containment detected: '{}' and '{}' contain each other",
                        a, b
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn check_transitive_cycles(graph: &Graph<'_>) -> Result<(), Violation> {
    match find_cycle(graph) {
        Some(cycle) => Err(Violation::new(
            ViolationKind::CircularContainment,
            format!("Circular containment detected: {}", cycle.join(" -> ")),
        )),
        None => Ok(()),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

fn find_cycle<'p>(graph: &Graph<'p>) -> Option<Vec<&'p str>> {
    let mut visits: BTreeMap<&'p str, Visit> = BTreeMap::new();
    for &start in graph.keys() {
        if visits.contains_key(start) {
            continue;
        }
        if let Some(cycle) = visit(start, graph, &mut visits) {
            return Some(cycle);
        }
    }
    None
}

/// Depth-first walk from `start` on an explicit stack; `path` mirrors it
fn visit<'p>(
    start: &'p str,
    graph: &Graph<'p>,
    visits: &mut BTreeMap<&'p str, Visit>,
) -> Option<Vec<&'p str>> {
    let mut stack = vec![(start, graph.get(start)?.iter())];
    let mut path = vec![start];
    visits.insert(start, Visit::InProgress);

    while let Some((node, children)) = stack.last_mut() {
        let node = *node;
        let Some(&child) = children.next() else {
            visits.insert(node, Visit::Done);
            stack.pop();
            path.pop();
            continue;
        };

        // Members that are not boundaries have no outgoing edges
        let Some(grandchildren) = graph.get(child) else {
            continue;
        };

        match visits.get(child) {
            Some(Visit::InProgress) => {
                let from = path.iter().position(|n| *n == child)?;
                let mut cycle = path[from..].to_vec();
                cycle.push(child);
                return Some(cycle);
            }
            Some(Visit::Done) => {}
            None => {
                visits.insert(child, Visit::InProgress);
                stack.push((child, grandchildren.iter()));
                path.push(child);
            }
        }
    }

    None
}

// ── Check 3: Qubit label resolution ───────────────────────

fn check_qubit_labels(program: &Program) -> Result<(), Violation> {
    let known: BTreeSet<&str> = program
        .domains
        .iter()
        .flat_map(|d| d.resolvable_labels())
        .collect();

    for qubit in &program.qubits {
        for state in qubit.sides() {
            if !known.contains(state) {
                return Err(Violation::new(
                    ViolationKind::UnresolvedLabel,
                    format!(
                        "Qubit state '{}' of qubit '{}' not in any domain",
                        state, qubit.name
                    ),
                ));
            }
        }
    }
    Ok(())
}

// ── Check 4: Containment completeness ─────────────────────

fn check_containment(program: &Program) -> Result<(), Violation> {
    let contained = program.contained_names();

    let domain_misses = program
        .domains
        .iter()
        .filter(|d| !contained.contains(d.name.as_str()))
        .map(|d| format!("Domain '{}' not contained in any boundary", d.name));
    let qubit_misses = program
        .qubits
        .iter()
        .filter(|q| !contained.contains(q.name.as_str()))
        .map(|q| format!("Qubit '{}' not contained in any boundary", q.name));

    let reasons: Vec<String> = domain_misses.chain(qubit_misses).collect();
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(Violation::new(ViolationKind::Uncontained, reasons.join("; ")))
    }
}

// ── Engine ────────────────────────────────────────────────

/// One admissible check, as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub sequence: u64,
    pub fingerprint: String,
    pub program: Program,
}

/// Owns a configuration and an append-only ledger of admissible checks
#[derive(Debug, Default)]
pub struct AdmissibilityEngine {
    config: AdmissibilityConfig,
    ledger: Vec<LedgerEntry>,
}

impl AdmissibilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AdmissibilityConfig) -> Self {
        AdmissibilityEngine {
            config,
            ledger: Vec::new(),
        }
    }

    pub fn config(&self) -> &AdmissibilityConfig {
        &self.config
    }

    /// Check a program; admissible programs are appended to the ledger
    pub fn check(&mut self, program: &Program) -> Verdict {
        let verdict = check(program, &self.config);
        tracing::debug!(
            admissible = verdict.admissible,
            reason = %verdict.reason,
            "admissibility verdict"
        );

        if verdict.admissible {
            self.ledger.push(LedgerEntry {
                sequence: self.ledger.len() as u64,
                fingerprint: fingerprint(program),
                program: program.clone(),
            });
        }
        verdict
    }

    /// Copy of the ledger
    pub fn ledger(&self) -> Vec<LedgerEntry> {
        self.ledger.clone()
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }
}

// ── Tests ─────────────────────────────────────────────────
