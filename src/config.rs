//! Program envelope settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Fixed text wrapped around the generated statements of every program.
///
/// Every field is optional in JSON; missing ones keep their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgramConfig {
    pub version: String,
    pub precision: String,
    /// Opening line of the entry point; the program ends with a lone `}`.
    pub entry_point: String,
    pub indent: String,
    /// Variable the sink statement assigns the final color to.
    pub sink: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            version: "#version 100".to_string(),
            precision: "precision mediump float;".to_string(),
            entry_point: "void main( void ) {".to_string(),
            indent: "  ".to_string(),
            sink: "gl_FragColor".to_string(),
        }
    }
}

pub fn load_config_from_str(text: &str) -> Result<ProgramConfig> {
    serde_json::from_str(text).context("failed to parse program config json")
}

pub fn load_config_from_path(path: impl AsRef<std::path::Path>) -> Result<ProgramConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read program config at {}", path.display()))?;
    load_config_from_str(&text).with_context(|| format!("in {}", path.display()))
}
