//! In-process editor document: the edits a node editor performs on a graph.
//!
//! Every edit keeps the graph in a shape the compiler accepts. Node type
//! checks happen here only where the edit needs them (placing a node); the
//! compiler reports everything else.

use anyhow::{Result, anyhow, bail};
use log::debug;

use crate::compiler::{self, Previews};
use crate::config::ProgramConfig;
use crate::model::{
    DataValue, InputSlot, Joint, Joints, Node, NodeId, NodeTypeId, NodeTypes, Nodes, OutputSlot,
    ParamId, Point,
};
use crate::persist::PersistedModel;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub types: NodeTypes,
    pub nodes: Nodes,
    pub joints: Joints,
}

impl Document {
    pub fn new(types: NodeTypes) -> Self {
        Self {
            types,
            nodes: Nodes::new(),
            joints: Joints::new(),
        }
    }

    /// Place a node of `type_id`, binding every declared parameter to its default.
    pub fn add_node(&mut self, type_id: &NodeTypeId, offset: Point) -> Result<NodeId> {
        let node_type = self
            .types
            .get(type_id)
            .ok_or_else(|| anyhow!("unknown node type '{type_id}'"))?;

        let id = self.next_node_id()?;
        let mut node = Node::new(id.0, type_id.clone());
        node.offset = offset;
        for param in &node_type.params {
            node.params
                .insert(param.id.clone(), DataValue::default_for(param.data_type));
        }

        debug!("add node {id} of type {type_id}");
        self.nodes = self.nodes.put(node);
        Ok(id)
    }

    /// One past the largest id in use, or 1 for an empty graph.
    fn next_node_id(&self) -> Result<NodeId> {
        match self.nodes.ids().max() {
            None => Ok(NodeId(1)),
            Some(max) => match max.0.checked_add(1) {
                Some(next) => Ok(NodeId(next)),
                None => bail!("node id space exhausted"),
            },
        }
    }

    pub fn set_param(&mut self, node_id: NodeId, param: &str, value: DataValue) -> Result<()> {
        let mut node = self.node(node_id)?.clone();
        node.params.insert(ParamId::new(param), value);
        debug!("set param {param} of node {node_id}");
        self.nodes = self.nodes.put(node);
        Ok(())
    }

    pub fn move_node(&mut self, node_id: NodeId, offset: Point) -> Result<()> {
        let mut node = self.node(node_id)?.clone();
        node.offset = offset;
        self.nodes = self.nodes.put(node);
        Ok(())
    }

    /// Wire `source` into `dest`, replacing whatever fed `dest` before.
    pub fn connect(&mut self, source: OutputSlot, dest: InputSlot) -> Result<()> {
        if !self.nodes.contains(&source.node) {
            bail!("cannot connect from missing node {}", source.node);
        }
        if !self.nodes.contains(&dest.node) {
            bail!("cannot connect into missing node {}", dest.node);
        }

        debug!(
            "connect {}.{} -> {}.{}",
            source.node, source.output, dest.node, dest.input
        );
        self.joints = self.joints.put(Joint { dest, source });
        Ok(())
    }

    pub fn disconnect(&mut self, dest: &InputSlot) -> Option<Joint> {
        let joint = self.joints.get(dest).cloned()?;
        debug!("disconnect {}.{}", dest.node, dest.input);
        self.joints = self.joints.remove(dest);
        Some(joint)
    }

    /// Remove a node together with every joint touching it.
    pub fn delete_node(&mut self, node_id: NodeId) -> Result<Node> {
        let node = self.node(node_id)?.clone();
        self.nodes = self.nodes.remove(&node_id);
        let before = self.joints.len();
        self.joints = self
            .joints
            .retain(|j| j.source.node != node_id && j.dest.node != node_id);
        debug!(
            "delete node {node_id} and {} joint(s)",
            before - self.joints.len()
        );
        Ok(node)
    }

    pub fn compile(&self, config: &ProgramConfig) -> Previews {
        compiler::compile_with_config(&self.types, &self.nodes, &self.joints, config)
    }

    pub fn persisted(&self) -> PersistedModel {
        PersistedModel {
            nodes: self.nodes.clone(),
            joints: self.joints.clone(),
        }
    }

    /// Replace nodes and joints with a loaded model. Types stay as they are.
    pub fn apply_persisted(&mut self, model: PersistedModel) {
        debug!(
            "load {} node(s), {} joint(s)",
            model.nodes.len(),
            model.joints.len()
        );
        self.nodes = model.nodes;
        self.joints = model.joints;
    }

    fn node(&self, node_id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&node_id)
            .ok_or_else(|| anyhow!("node {node_id} not found"))
    }
}
