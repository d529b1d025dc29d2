//! Canonical normalizer - converts QGL to deterministic canonical form
//!
//! The canonical form is the representation used for fingerprints, ledger
//! snapshots and program comparison.
//!
//! # Pipeline
//!
//! `QGL text → parse → Program → normalize_program → serialize_canonical → SHA-256`
//!
//! # Guarantees
//!
//! - **Idempotent**: `normalize(normalize(x)) == normalize(x)`
//! - **Deterministic**: same input always produces same output
//! - **Order-free**: permuting declarations does not change the output
//! - **Semantic preserving**: parsing the output yields an equal program

use sha2::{Digest, Sha256};

use crate::parser::ast::Program;
use crate::parser::tokenizer::SUPERPOSITION_MARKER;
use crate::Result;

// ── Public API ─────────────────────────────────────────────

/// Normalize QGL text to canonical form
///
/// # Errors
/// Any lexical, syntax or structural error from parsing.
pub fn normalize(text: &str) -> Result<String> {
    let program = crate::parser::parse_source(text)?;
    Ok(serialize_canonical(&normalize_program(program)))
}

/// Sort every declaration list; member and label sets are sorted already
pub fn normalize_program(mut program: Program) -> Program {
    program.boundaries.sort();
    program.domains.sort();
    program.qubits.sort();
    program
}

/// SHA-256 hex digest of the normalized canonical form
pub fn fingerprint(program: &Program) -> String {
    let canonical = serialize_canonical(&normalize_program(program.clone()));
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ── Canonical Serializer ───────────────────────────────────

/// Serialize a program to QGL text in its current declaration order
///
/// - Fixed section order: boundaries, domains, qubits
/// - One declaration per line
/// - `, ` between entries, ` ⊕ ` around markers
/// - No comments
pub fn serialize_canonical(program: &Program) -> String {
    let mut out = String::new();

    for boundary in &program.boundaries {
        out.push_str("boundary ");
        out.push_str(&boundary.name);
        write_list(&mut out, boundary.members.iter().map(String::clone));
    }

    for domain in &program.domains {
        out.push_str("domain ");
        out.push_str(&domain.name);
        write_list(&mut out, domain.labels.iter().map(|l| spaced_label(l)));
    }

    for qubit in &program.qubits {
        out.push_str(&format!(
            "qubit {} = {{ {} {} {} }}\n",
            qubit.name, qubit.state_a, SUPERPOSITION_MARKER, qubit.state_b
        ));
    }

    out
}

fn write_list(out: &mut String, items: impl Iterator<Item = String>) {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        out.push_str(" {}\n");
    } else {
        out.push_str(" { ");
        out.push_str(&items.join(", "));
        out.push_str(" }\n");
    }
}

fn spaced_label(label: &str) -> String {
    label.replace(SUPERPOSITION_MARKER, &format!(" {} ", SUPERPOSITION_MARKER))
}
