//! QGL Core - structural description language and admissibility engine
//!
//! This is the single source of truth for QGL semantics.
//! The CLI and the Python binding compile this same core.
//!
//! # Architecture
//!
//! ```text
//! QGL Text → Tokenizer → Tokens → Parser → Program → Admissibility → Verdict
//!                                              ↓
//!                                          Inversion → Program' → Admissibility (re-run)
//!                                              ↓
//!                                     commit, or roll back to Program
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: Same input always produces identical output
//! - **Pure verdicts**: Admissibility depends only on the program's shape
//! - **Atomic**: An inversion is applied completely or not at all
//! - **Canonical**: One normalized form and fingerprint per structure

pub mod admissibility;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod inversion;
pub mod normalizer;
pub mod parser;
pub mod qubits;

pub use admissibility::{
    check, AdmissibilityConfig, AdmissibilityEngine, CycleDetection, LedgerEntry, Verdict,
    ViolationKind,
};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use inversion::{InversionEngine, InversionOutcome, InversionRecord};
pub use parser::ast::*;
pub use parser::{parse_source, parse_source_with, ParseOptions};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
