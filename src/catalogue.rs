//! Node type catalogue: the bundled defaults plus user-supplied extensions.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::model::{DataType, NodeType, NodeTypes};

const DEFAULT_NODE_CATALOGUE_JSON: &str = include_str!("../assets/node-catalogue.json");

/// On-disk shape of a catalogue file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogueFile {
    #[serde(default)]
    pub types: NodeTypes,
}

pub fn load_default_catalogue() -> Result<NodeTypes> {
    load_catalogue_from_str(DEFAULT_NODE_CATALOGUE_JSON)
        .context("failed to load bundled assets/node-catalogue.json")
}

pub fn load_catalogue_from_str(text: &str) -> Result<NodeTypes> {
    let file: CatalogueFile =
        serde_json::from_str(text).context("invalid node catalogue json")?;
    validate_catalogue(&file.types)?;
    Ok(file.types)
}

pub fn load_catalogue_from_path(path: impl AsRef<std::path::Path>) -> Result<NodeTypes> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read node catalogue at {}", path.display()))?;
    load_catalogue_from_str(&text).with_context(|| format!("in {}", path.display()))
}

/// Entries of `overlay` replace same-id entries of `base`; new ids are appended.
pub fn merge_catalogues(base: &NodeTypes, overlay: &NodeTypes) -> NodeTypes {
    overlay
        .iter()
        .fold(base.clone(), |merged, node_type| merged.put(node_type.clone()))
}

/// Types a catalogue browser should offer, in catalogue order.
pub fn visible_types(types: &NodeTypes) -> impl Iterator<Item = &NodeType> {
    types.iter().filter(|t| !t.hidden)
}

pub fn validate_catalogue(types: &NodeTypes) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    for node_type in types {
        if node_type.id.is_unknown() {
            errors.push("node type uses the reserved id '<Unknown>/<Unknown>'".to_string());
        }

        let expected = node_type.inputs.len() + 1;
        let mut seen: HashSet<&[DataType]> = HashSet::new();
        for (i, overload) in node_type.code.iter().enumerate() {
            if overload.signature.len() != expected {
                errors.push(format!(
                    "overload #{i} of '{}' has {} type(s) in its signature, expected {expected}",
                    node_type.id,
                    overload.signature.len()
                ));
                continue;
            }
            if let Some(output) = overload.output() {
                for declared in &node_type.outputs {
                    if !output.outputs().contains(declared) {
                        errors.push(format!(
                            "'{}' declares output {declared} but overload #{i} yields {output}",
                            node_type.id
                        ));
                    }
                }
            }
            if !seen.insert(overload.inputs()) {
                errors.push(format!(
                    "overload #{i} of '{}' repeats input types {:?}",
                    node_type.id,
                    overload.inputs()
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!(
            "node catalogue failed validation ({} error(s)):\n- {}",
            errors.len(),
            errors.join("\n- ")
        )
    }
}
