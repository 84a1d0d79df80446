//! JSON persistence of a graph's nodes and joints.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Joints, Nodes};

/// Everything the editor saves; node types are not part of a saved model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedModel {
    #[serde(default)]
    pub nodes: Nodes,
    #[serde(default)]
    pub joints: Joints,
}

pub fn load_model_from_str(text: &str) -> Result<PersistedModel> {
    serde_json::from_str(text).context("invalid graph model json")
}

pub fn load_model_from_path(path: impl AsRef<std::path::Path>) -> Result<PersistedModel> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph model at {}", path.display()))?;
    load_model_from_str(&text).with_context(|| format!("in {}", path.display()))
}

pub fn save_model_to_string(model: &PersistedModel) -> Result<String> {
    serde_json::to_string_pretty(model).context("failed to serialize graph model")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataValue, InputSlot, NodeId, NodeTypeId, OutputId, ParamId, Point, Rgba};

    const MODEL: &str = r#"{
        "nodes": [
            {
                "id": 1,
                "type": "Constant/Color",
                "offset": { "x": 600.0, "y": 0.0 },
                "params": { "Value": { "type": "color", "value": [0.0, 0.0, 1.0, 1.0] } }
            },
            { "id": 3, "type": "Global/Time" },
            { "id": 4, "type": "Trigonometry/Sin", "offset": { "x": 200.0, "y": 200.0 } }
        ],
        "joints": [
            { "sourceNode": 3, "sourceOutput": "All", "destNode": 4, "destInput": "X" }
        ]
    }"#;

    #[test]
    fn loads_nodes_and_joints() {
        let model = load_model_from_str(MODEL).unwrap();
        assert_eq!(model.nodes.len(), 3);

        let color = model.nodes.get(&NodeId(1)).unwrap();
        assert_eq!(color.node_type, NodeTypeId::new("Constant", "Color"));
        assert_eq!(color.offset, Point::new(600.0, 0.0));
        assert_eq!(
            color.params.get(&ParamId::new("Value")),
            Some(&DataValue::Color(Rgba::new(0.0, 0.0, 1.0, 1.0)))
        );

        let time = model.nodes.get(&NodeId(3)).unwrap();
        assert_eq!(time.offset, Point::default());
        assert!(time.params.is_empty());

        let joint = model.joints.get(&InputSlot::new(NodeId(4), "X")).unwrap();
        assert_eq!(joint.source.node, NodeId(3));
        assert_eq!(joint.source.output, OutputId::All);
    }

    #[test]
    fn saved_text_loads_back_unchanged() {
        let model = load_model_from_str(MODEL).unwrap();
        let text = save_model_to_string(&model).unwrap();
        assert_eq!(load_model_from_str(&text).unwrap(), model);
        assert!(text.contains("\"type\": \"Trigonometry/Sin\""), "{text}");
    }

    #[test]
    fn stale_type_id_still_loads() {
        let model = load_model_from_str(r#"{ "nodes": [ { "id": 9, "type": "sin" } ] }"#).unwrap();
        assert!(model.nodes.get(&NodeId(9)).unwrap().node_type.is_unknown());
        assert!(model.joints.is_empty());
    }

    #[test]
    fn bad_json_is_an_error() {
        let err = load_model_from_str(r#"{ "nodes": [ { "id": "x" } ] }"#).unwrap_err();
        assert!(err.to_string().contains("invalid graph model json"));
    }
}
