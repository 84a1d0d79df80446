//! Graph compiler: turns a node graph into one shader program per node.
//!
//! Every node is compiled as if it were the program's sink, so each one can be
//! previewed on its own. A pass visits the whole graph once (depth-first,
//! memoized, cycle-checked) and then assembles a program for each node from
//! the shared results.

mod node;
mod pass;
mod program;

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::config::ProgramConfig;
use crate::model::{DataType, Joints, NodeId, NodeTypes, Nodes, OutputId};

#[cfg(test)]
pub(crate) use node::select_overload;
use pass::CompilePass;

/// A diagnostic attached to the node that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("node {node_id}: {message}")]
pub struct CompilerError {
    pub node_id: NodeId,
    pub message: String,
}

impl CompilerError {
    pub fn new(node_id: NodeId, message: impl Into<String>) -> Self {
        Self {
            node_id,
            message: message.into(),
        }
    }
}

/// Complete program text, one entry per line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledProgram {
    pub lines: Vec<String>,
}

impl CompiledProgram {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

pub type ProgramResult = Result<CompiledProgram, Vec<CompilerError>>;

/// Compile result for every node of the graph, in node order.
pub type Previews = IndexMap<NodeId, ProgramResult>;

/// A variable exposed by a compiled node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OutputDesc {
    pub variable: String,
    pub data_type: DataType,
}

/// Per-node compiler output; lives for one pass.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CompiledNode {
    /// Distinct direct sources, declared inputs first.
    pub dependencies: Vec<NodeId>,
    pub globals: IndexSet<String>,
    pub code: Vec<String>,
    pub output: IndexMap<OutputId, OutputDesc>,
}

pub(crate) type NodeOutcome = Result<CompiledNode, Vec<CompilerError>>;

/// Compile every node with the default program envelope.
pub fn compile(types: &NodeTypes, nodes: &Nodes, joints: &Joints) -> Previews {
    compile_with_config(types, nodes, joints, &ProgramConfig::default())
}

pub fn compile_with_config(
    types: &NodeTypes,
    nodes: &Nodes,
    joints: &Joints,
    config: &ProgramConfig,
) -> Previews {
    debug!(
        "compile pass: {} node(s), {} joint(s), {} type(s)",
        nodes.len(),
        joints.len(),
        types.len()
    );

    let mut pass = CompilePass::new(types, nodes, joints);
    pass.run();

    let previews: Previews = pass
        .node_indices()
        .map(|idx| (pass.id_at(idx), program::assemble(&pass, idx, config)))
        .collect();

    let failed = previews.values().filter(|r| r.is_err()).count();
    debug!(
        "compile pass done: {failed} of {} preview(s) failed",
        previews.len()
    );
    previews
}
