//! Engine configuration
//!
//! Every field has a default, so an empty document is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::admissibility::AdmissibilityConfig;
use crate::parser::ParseOptions;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parser: ParseOptions,
    pub admissibility: AdmissibilityConfig,
}

impl EngineConfig {
    /// Decode a JSON configuration document
    ///
    /// # Errors
    /// `Error::Config` if the document is malformed or has unknown values.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}
