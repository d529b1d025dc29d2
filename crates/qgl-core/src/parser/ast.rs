//! QGL AST Types - the structural program produced by the parser
//!
//! Entities reference each other by name only. Member and label
//! collections are ordered sets, so declaration order inside a brace list
//! never affects equality or fingerprints.
//!
//! All AST types derive: Debug, Clone, PartialEq, Eq, Serialize, Deserialize

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::parser::tokenizer::SUPERPOSITION_MARKER;
use crate::{Error, Result};

/// A named container ("boundary") owning a set of member names
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Boundary {
    pub name: String,
    pub members: BTreeSet<String>,
}

impl Boundary {
    /// Build a boundary, refusing one that lists its own name
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let members: BTreeSet<String> = members.into_iter().map(Into::into).collect();
        if members.contains(&name) {
            return Err(Error::StructuralViolation { boundary: name });
        }
        Ok(Boundary { name, members })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }
}

/// A named state-space ("domain") holding label strings
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    /// Plain labels, or compound `a⊕b` labels encoding an unresolved choice
    pub labels: BTreeSet<String>,
}

impl Domain {
    pub fn new<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Domain {
            name: name.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// True if any label encodes an unresolved binary choice
    pub fn has_unresolved(&self) -> bool {
        self.labels.iter().any(|l| l.contains(SUPERPOSITION_MARKER))
    }

    /// Every label a qubit may reference; compound labels contribute both halves
    pub fn resolvable_labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels
            .iter()
            .flat_map(|label| label.split(SUPERPOSITION_MARKER))
    }
}

/// Join two labels into one compound label
pub fn compound_label(a: &str, b: &str) -> String {
    format!("{}{}{}", a, SUPERPOSITION_MARKER, b)
}

/// One side of a qubit's unresolved choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl std::str::FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" => Ok(Side::A),
            "B" => Ok(Side::B),
            other => Err(Error::Collapse(format!(
                "qubit collapse must choose A or B, got '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// A named binary choice point ("qubit") between two labels
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qubit {
    pub name: String,
    pub state_a: String,
    pub state_b: String,
    /// Informational only; nothing in the validated pipeline resolves a qubit
    pub resolved: bool,
}

impl Qubit {
    pub fn new(name: impl Into<String>, state_a: impl Into<String>, state_b: impl Into<String>) -> Self {
        Qubit {
            name: name.into(),
            state_a: state_a.into(),
            state_b: state_b.into(),
            resolved: false,
        }
    }

    pub fn sides(&self) -> [&str; 2] {
        [&self.state_a, &self.state_b]
    }

    /// The label on the chosen side
    pub fn collapse(&self, side: Side) -> &str {
        match side {
            Side::A => &self.state_a,
            Side::B => &self.state_b,
        }
    }
}

impl std::fmt::Display for Qubit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{{{} {} {}}}", self.state_a, SUPERPOSITION_MARKER, self.state_b)
    }
}

/// Everything declared in one QGL source text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub boundaries: Vec<Boundary>,
    pub domains: Vec<Domain>,
    pub qubits: Vec<Qubit>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty() && self.domains.is_empty() && self.qubits.is_empty()
    }

    /// First boundary declared under `name`
    pub fn boundary(&self, name: &str) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.name == name)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn qubit(&self, name: &str) -> Option<&Qubit> {
        self.qubits.iter().find(|q| q.name == name)
    }

    /// Union of all boundary member sets
    pub fn contained_names(&self) -> BTreeSet<&str> {
        self.boundaries
            .iter()
            .flat_map(|b| b.members.iter().map(String::as_str))
            .collect()
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&crate::normalizer::serialize_canonical(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_rejects_self_membership() {
        let err = Boundary::new("A", ["b", "A"]).unwrap_err();
        assert_eq!(err, Error::StructuralViolation { boundary: "A".into() });
    }

    #[test]
    fn test_boundary_members_are_a_set() {
        let b = Boundary::new("A", ["c", "b", "c"]).unwrap();
        let members: Vec<&str> = b.members.iter().map(String::as_str).collect();
        assert_eq!(members, vec!["b", "c"]);
        assert!(b.contains("b"));
        assert!(!b.contains("A"));
    }

    #[test]
    fn test_domain_resolvable_labels_split_compounds() {
        let d = Domain::new("D", [compound_label("up", "down"), "left".to_string()]);
        assert!(d.has_unresolved());
        let labels: BTreeSet<&str> = d.resolvable_labels().collect();
        assert_eq!(labels, BTreeSet::from(["up", "down", "left"]));
    }

    #[test]
    fn test_domain_without_compounds() {
        let d = Domain::new("D", ["a", "b"]);
        assert!(!d.has_unresolved());
    }

    #[test]
    fn test_qubit_collapse_and_display() {
        let q = Qubit::new("q", "|0⟩", "|1⟩");
        assert_eq!(q.collapse(Side::A), "|0⟩");
        assert_eq!(q.collapse(Side::B), "|1⟩");
        assert!(!q.resolved);
        assert_eq!(q.to_string(), "{|0⟩ ⊕ |1⟩}");
    }

    #[test]
    fn test_side_from_str() {
        assert_eq!("A".parse::<Side>().unwrap(), Side::A);
        assert_eq!("B".parse::<Side>().unwrap(), Side::B);
        assert!(matches!("C".parse::<Side>(), Err(Error::Collapse(_))));
    }

    #[test]
    fn test_program_contained_names() {
        let program = Program {
            boundaries: vec![
                Boundary::new("Outer", ["Inner", "D"]).unwrap(),
                Boundary::new("Inner", ["q"]).unwrap(),
            ],
            domains: vec![Domain::new("D", ["a", "b"])],
            qubits: vec![Qubit::new("q", "a", "b")],
        };
        assert_eq!(program.contained_names(), BTreeSet::from(["Inner", "D", "q"]));
        assert!(program.boundary("Inner").is_some());
        assert!(program.boundary("q").is_none());
    }

    #[test]
    fn test_program_lookup_by_name() {
        let program = Program {
            boundaries: vec![Boundary::new("S", ["D", "q"]).unwrap()],
            domains: vec![Domain::new("D", ["a", "b"])],
            qubits: vec![Qubit::new("q", "a", "b")],
        };
        assert_eq!(program.domain("D").map(|d| d.labels.len()), Some(2));
        assert!(program.domain("q").is_none());
        assert_eq!(program.qubit("q").map(|q| q.state_b.as_str()), Some("b"));
        assert!(program.qubit("D").is_none());
        assert!(!program.is_empty());
        assert!(Program::new().is_empty());
    }

    #[test]
    fn test_program_serialization_roundtrip() {
        let program = Program {
            boundaries: vec![Boundary::new("S", ["D", "q"]).unwrap()],
            domains: vec![Domain::new("D", ["a", "b"])],
            qubits: vec![Qubit::new("q", "a", "b")],
        };
        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(program, back);
    }
}
