//! Structural qubit registry
//!
//! Tracks entanglement between qubits as plain name groups. Entangling two
//! qubits merges their groups, so entanglement is transitive. Collapsing a
//! group resolves every member at once and fails if any member has no
//! chosen side. The admissibility and inversion engines never consult it.

use std::collections::{BTreeMap, BTreeSet};

use crate::parser::ast::{Program, Qubit, Side};
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct QubitRegistry {
    qubits: BTreeMap<String, Qubit>,
    groups: Vec<BTreeSet<String>>,
}

impl QubitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every qubit declared in `program`
    pub fn from_program(program: &Program) -> Self {
        let mut registry = Self::new();
        for qubit in &program.qubits {
            registry.register(qubit.clone());
        }
        registry
    }

    /// Add a qubit, replacing any earlier one with the same name
    pub fn register(&mut self, qubit: Qubit) {
        self.qubits.insert(qubit.name.clone(), qubit);
    }

    pub fn get(&self, name: &str) -> Option<&Qubit> {
        self.qubits.get(name)
    }

    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }

    /// Entangle two registered qubits, merging their groups
    pub fn entangle(&mut self, a: &str, b: &str) -> Result<()> {
        for name in [a, b] {
            if !self.qubits.contains_key(name) {
                return Err(Error::Collapse(format!("qubit '{}' is not registered", name)));
            }
        }

        let (touching, mut rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.groups)
            .into_iter()
            .partition(|g| g.contains(a) || g.contains(b));

        let mut merged: BTreeSet<String> = touching.into_iter().flatten().collect();
        merged.insert(a.to_string());
        merged.insert(b.to_string());

        rest.push(merged);
        self.groups = rest;
        tracing::debug!(a, b, "qubits entangled");
        Ok(())
    }

    /// Every qubit sharing a group with `name`, or just `name` itself
    pub fn group_of(&self, name: &str) -> BTreeSet<String> {
        self.groups
            .iter()
            .find(|g| g.contains(name))
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([name.to_string()]))
    }

    pub fn is_entangled(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.contains(name) && g.len() > 1)
    }

    /// Resolve every qubit in `group` to the label on its chosen side
    ///
    /// # Errors
    /// `Error::Collapse` if a member is unknown or has no choice.
    pub fn collapse_group(
        &self,
        group: &BTreeSet<String>,
        choices: &BTreeMap<String, Side>,
    ) -> Result<BTreeMap<String, String>> {
        group
            .iter()
            .map(|name| {
                let side = choices.get(name).ok_or_else(|| {
                    Error::Collapse(format!("No collapse choice for qubit {}", name))
                })?;
                let qubit = self
                    .qubits
                    .get(name)
                    .ok_or_else(|| Error::Collapse(format!("qubit '{}' is not registered", name)))?;
                Ok((name.clone(), qubit.collapse(*side).to_string()))
            })
            .collect()
    }
}
