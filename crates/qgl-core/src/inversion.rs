//! Inversion engine - the single state-changing operation
//!
//! Inverting boundary `X` removes every declaration of `X` and, for each
//! former member `m`, adds a new boundary `m { X }`. One pass over the
//! member set, no partial application.
//!
//! # Transaction
//!
//! 1. The program must be admissible before the swap
//! 2. The target boundary must exist
//! 3. The swap is built on an independent copy
//! 4. The copy must be admissible after the swap
//!
//! Any failed step hands back the caller's program untouched. Successful
//! inversions are appended to an append-only log.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::admissibility::AdmissibilityEngine;
use crate::normalizer::fingerprint;
use crate::parser::ast::{Boundary, Program};

/// Reason attached to every successful inversion
pub const INVERSION_SUCCESS_REASON: &str = "Inversion successful";

/// Result of an inversion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InversionOutcome {
    /// The inverted program on success, the original otherwise
    pub program: Program,
    pub success: bool,
    pub reason: String,
}

/// One successful inversion, as recorded in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InversionRecord {
    pub sequence: u64,
    pub boundary: String,
    pub before: Program,
    pub after: Program,
    pub before_fingerprint: String,
    pub after_fingerprint: String,
    /// Always true; an inversion is never applied partially
    pub atomic: bool,
}

/// Performs inversions, validating through its own admissibility engine
#[derive(Debug, Default)]
pub struct InversionEngine {
    admissibility: AdmissibilityEngine,
    log: Vec<InversionRecord>,
}

impl InversionEngine {
    pub fn new(admissibility: AdmissibilityEngine) -> Self {
        InversionEngine {
            admissibility,
            log: Vec::new(),
        }
    }

    pub fn admissibility(&self) -> &AdmissibilityEngine {
        &self.admissibility
    }

    pub fn admissibility_mut(&mut self) -> &mut AdmissibilityEngine {
        &mut self.admissibility
    }

    /// Invert `target` in `program`.
    ///
    /// On failure the returned program is the very value passed in.
    pub fn invert(&mut self, program: Program, target: &str) -> InversionOutcome {
        // 1. Precondition: admissible before
        let before = self.admissibility.check(&program);
        if !before.admissible {
            return rejected(
                program,
                format!("Cannot invert inadmissible structure: {}", before.reason),
            );
        }

        // 2. Precondition: target exists
        if program.boundary(target).is_none() {
            return rejected(program, format!("Boundary '{}' not found", target));
        }

        // 3. Transform an independent copy
        let candidate = swap_roles(&program, target);

        // 4. Postcondition: admissible after, otherwise roll back
        let after = self.admissibility.check(&candidate);
        if !after.admissible {
            tracing::warn!(
                boundary = target,
                reason = %after.reason,
                "inversion rolled back"
            );
            return rejected(
                program,
                format!("Inversion produced inadmissible structure: {}", after.reason),
            );
        }

        self.log.push(InversionRecord {
            sequence: self.log.len() as u64,
            boundary: target.to_string(),
            before_fingerprint: fingerprint(&program),
            after_fingerprint: fingerprint(&candidate),
            before: program,
            after: candidate.clone(),
            atomic: true,
        });
        tracing::info!(boundary = target, inversions = self.log.len(), "inversion applied");

        InversionOutcome {
            program: candidate,
            success: true,
            reason: INVERSION_SUCCESS_REASON.to_string(),
        }
    }

    pub fn inversion_count(&self) -> usize {
        self.log.len()
    }

    /// Copy of the inversion log
    pub fn history(&self) -> Vec<InversionRecord> {
        self.log.clone()
    }
}

fn rejected(program: Program, reason: String) -> InversionOutcome {
    tracing::debug!(reason = %reason, "inversion rejected");
    InversionOutcome {
        program,
        success: false,
        reason,
    }
}

/// Build the inverted program without touching the original
fn swap_roles(program: &Program, target: &str) -> Program {
    let mut candidate = program.clone();

    let (removed, kept): (Vec<Boundary>, Vec<Boundary>) = candidate
        .boundaries
        .into_iter()
        .partition(|b| b.name == target);

    let former_members: BTreeSet<String> = removed
        .into_iter()
        .flat_map(|b| b.members.into_iter())
        .collect();

    candidate.boundaries = kept;
    candidate
        .boundaries
        .extend(former_members.into_iter().map(|member| Boundary {
            name: member,
            members: BTreeSet::from([target.to_string()]),
        }));

    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admissibility::{check, AdmissibilityConfig};
    use crate::parser::parse_source;

    fn engine() -> InversionEngine {
        InversionEngine::new(AdmissibilityEngine::new())
    }

    fn program(input: &str) -> Program {
        parse_source(input).expect("test input should parse")
    }

    fn members_of<'p>(program: &'p Program, name: &str) -> Vec<&'p BTreeSet<String>> {
        program
            .boundaries
            .iter()
            .filter(|b| b.name == name)
            .map(|b| &b.members)
            .collect()
    }

    // ── Successful inversion ──────────────────────────────

    #[test]
    fn test_invert_outer_boundary() {
        let original = program("boundary Outer { Inner, element }\nboundary Inner { sub_element }");
        let mut engine = engine();
        let outcome = engine.invert(original, "Outer");

        assert!(outcome.success, "{}", outcome.reason);
        assert_eq!(outcome.reason, INVERSION_SUCCESS_REASON);

        let result = &outcome.program;
        assert!(result.boundary("Outer").is_none());
        let outer: BTreeSet<String> = BTreeSet::from(["Outer".to_string()]);
        assert!(members_of(result, "Inner").contains(&&outer));
        assert_eq!(members_of(result, "element"), vec![&outer]);
        assert!(check(result, &AdmissibilityConfig::default()).admissible);
    }

    #[test]
    fn test_invert_keeps_domains_and_qubits() {
        let original = program(
            "boundary Top { Mid }\nboundary Mid { States, q }\ndomain States { a, b }\nqubit q = { a ⊕ b }",
        );
        let outcome = engine().invert(original.clone(), "Top");
        assert!(outcome.success, "{}", outcome.reason);
        assert_eq!(outcome.program.domains, original.domains);
        assert_eq!(outcome.program.qubits, original.qubits);
    }

    #[test]
    fn test_invert_empty_boundary_removes_it() {
        let outcome = engine().invert(program("boundary Void {}\nboundary A { b }"), "Void");
        assert!(outcome.success, "{}", outcome.reason);
        assert_eq!(outcome.program.boundaries.len(), 1);
        assert!(outcome.program.boundary("Void").is_none());
    }

    #[test]
    fn test_duplicate_target_declarations_merge() {
        let outcome = engine().invert(program("boundary A { x }\nboundary A { y }"), "A");
        assert!(outcome.success, "{}", outcome.reason);
        let names: Vec<&str> = outcome.program.boundaries.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    // ── Rejections ────────────────────────────────────────

    #[test]
    fn test_inadmissible_input_rejected_unchanged() {
        let original = program("boundary A { B }\nboundary B { A }");
        let outcome = engine().invert(original.clone(), "A");
        assert!(!outcome.success);
        assert!(outcome.reason.starts_with("Cannot invert inadmissible structure"));
        assert!(outcome.reason.contains("Circular containment"));
        assert_eq!(outcome.program, original);
    }

    #[test]
    fn test_admissibility_checked_before_existence() {
        let original = program("boundary A { B }\nboundary B { A }");
        let outcome = engine().invert(original.clone(), "Missing");
        assert!(!outcome.success);
        assert!(
            outcome.reason.starts_with("Cannot invert inadmissible structure"),
            "{}",
            outcome.reason
        );
        assert!(!outcome.reason.contains("not found"));
        assert_eq!(outcome.program, original);
    }

    #[test]
    fn test_missing_target_rejected_unchanged() {
        let original = program("boundary A { b }");
        let outcome = engine().invert(original.clone(), "Nope");
        assert!(!outcome.success);
        assert_eq!(outcome.reason, "Boundary 'Nope' not found");
        assert_eq!(outcome.program, original);
    }

    #[test]
    fn test_member_name_is_not_a_target() {
        let outcome = engine().invert(program("boundary A { b }"), "b");
        assert!(!outcome.success);
        assert!(outcome.reason.contains("not found"));
    }

    #[test]
    fn test_postcondition_failure_rolls_back() {
        // After inverting Holder, States is a boundary but no longer a member
        let original = program("boundary Holder { States }\ndomain States { a }");
        let mut engine = engine();
        let outcome = engine.invert(original.clone(), "Holder");

        assert!(!outcome.success);
        assert!(outcome.reason.starts_with("Inversion produced inadmissible structure"));
        assert!(outcome.reason.contains("Domain 'States' not contained in any boundary"));
        assert_eq!(outcome.program, original);
        assert_eq!(engine.inversion_count(), 0);
    }

    // ── Log ───────────────────────────────────────────────

    #[test]
    fn test_log_records_successes_only() {
        let mut engine = engine();
        let first = engine.invert(program("boundary A { b }\nboundary C { d }"), "A");
        assert!(first.success);
        let missing = engine.invert(first.program.clone(), "A");
        assert!(!missing.success);
        let second = engine.invert(missing.program, "C");
        assert!(second.success);

        let history = engine.history();
        assert_eq!(engine.inversion_count(), 2);
        assert_eq!(history[0].sequence, 0);
        assert_eq!(history[0].boundary, "A");
        assert_eq!(history[1].boundary, "C");
        assert_eq!(history[1].before, first.program);
        assert_eq!(history[1].after, second.program);
        assert!(history.iter().all(|r| r.atomic));
        assert_eq!(history[0].after_fingerprint, fingerprint(&first.program));
    }

    #[test]
    fn test_history_copy_is_detached() {
        let mut engine = engine();
        engine.invert(program("boundary A { b }"), "A");
        let mut copy = engine.history();
        copy.clear();
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_checks_are_recorded_by_inner_engine() {
        let mut engine = engine();
        engine.invert(program("boundary A { b }"), "A");
        // before and after checks were both admissible
        assert_eq!(engine.admissibility().ledger_len(), 2);
    }

    // ── Determinism proof ─────────────────────────────────

    #[test]
    fn test_inversion_determinism_100_iterations() {
        let source = "boundary Outer { Inner, element }\nboundary Inner { sub_element }";
        let first = engine().invert(program(source), "Outer");
        for i in 0..100 {
            let result = engine().invert(program(source), "Outer");
            assert_eq!(first, result, "Determinism failure at iteration {}", i);
        }
    }
}
