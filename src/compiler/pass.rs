//! One compile pass over a graph snapshot.
//!
//! Nodes are addressed by dense arena indices. Each slot carries a visit state
//! and, once visited, its outcome. The walk keeps its own work stack; the
//! active path is a plain vector of indices used for cycle reporting.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::{trace, warn};

use super::node::compile_node;
use super::{CompilerError, NodeOutcome};
use crate::model::{InputId, Joint, Joints, Node, NodeId, NodeType, NodeTypes, Nodes};

/// A node whose dependencies are being visited.
struct Frame<'g> {
    idx: usize,
    node: &'g Node,
    node_type: &'g NodeType,
    joints: IndexMap<InputId, &'g Joint>,
    dependencies: Vec<NodeId>,
    /// Position in `dependencies` of the next one to visit.
    next: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

pub(crate) struct CompilePass<'g> {
    types: &'g NodeTypes,
    nodes: &'g Nodes,
    incoming: HashMap<NodeId, Vec<&'g Joint>>,
    /// Arena: index <-> node id. Registry nodes come first, then dangling joint sources.
    ids: IndexSet<NodeId>,
    state: Vec<VisitState>,
    results: Vec<Option<NodeOutcome>>,
    stack: Vec<usize>,
}

impl<'g> CompilePass<'g> {
    pub fn new(types: &'g NodeTypes, nodes: &'g Nodes, joints: &'g Joints) -> Self {
        let mut ids: IndexSet<NodeId> = nodes.ids().copied().collect();
        let mut incoming: HashMap<NodeId, Vec<&'g Joint>> = HashMap::new();
        for joint in joints {
            // A source missing from the registry still gets a slot so it can fail on its own.
            ids.insert(joint.source.node);
            incoming.entry(joint.dest.node).or_default().push(joint);
        }

        let len = ids.len();
        Self {
            types,
            nodes,
            incoming,
            ids,
            state: vec![VisitState::Unvisited; len],
            results: (0..len).map(|_| None).collect(),
            stack: Vec::new(),
        }
    }

    /// Visit every registry node. Shared sub-graphs are compiled once.
    pub fn run(&mut self) {
        for idx in self.node_indices() {
            self.visit(idx);
        }
    }

    /// Arena indices of the registry nodes, in registry order.
    pub fn node_indices(&self) -> std::ops::Range<usize> {
        0..self.nodes.len()
    }

    pub fn id_at(&self, idx: usize) -> NodeId {
        self.ids[idx]
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.ids.get_index_of(&id)
    }

    pub fn outcome(&self, idx: usize) -> Option<&NodeOutcome> {
        self.results.get(idx).and_then(Option::as_ref)
    }

    pub fn outcome_of(&self, id: NodeId) -> Option<&NodeOutcome> {
        self.index_of(id).and_then(|idx| self.outcome(idx))
    }

    /// Every error recorded in this pass, in arena order.
    pub fn all_errors(&self) -> impl Iterator<Item = &CompilerError> {
        self.results.iter().flat_map(|r| match r {
            Some(Err(errors)) => errors.as_slice(),
            _ => &[],
        })
    }

    /// Depth-first visit driven by an explicit work stack, so graph depth is
    /// bounded by heap memory rather than the thread stack.
    fn visit(&mut self, root: usize) {
        let mut work: Vec<Frame<'g>> = Vec::new();
        if let Some(frame) = self.enter(root) {
            work.push(frame);
        }

        while let Some(frame) = work.last_mut() {
            if let Some(&dep) = frame.dependencies.get(frame.next) {
                frame.next += 1;
                if let Some(dep_idx) = self.index_of(dep) {
                    if let Some(child) = self.enter(dep_idx) {
                        work.push(child);
                    }
                }
                continue;
            }

            let Some(frame) = work.pop() else { break };
            self.stack.pop();
            let outcome = compile_node(
                frame.node,
                frame.node_type,
                &frame.joints,
                frame.dependencies,
                |source| self.outcome_of(source),
            );
            self.finish(frame.idx, outcome);
        }
    }

    /// Start visiting `idx`. Returns the frame to descend into, or `None` when
    /// the node is already settled (memoized, on the current path, or failed
    /// before it had anything to visit).
    fn enter(&mut self, idx: usize) -> Option<Frame<'g>> {
        match self.state[idx] {
            VisitState::InProgress => {
                self.record_cycle(idx);
                return None;
            }
            VisitState::Done => return None,
            VisitState::Unvisited => {}
        }

        let id = self.ids[idx];
        trace!("compiling node {id}");

        let nodes = self.nodes;
        let Some(node) = nodes.get(&id) else {
            self.finish(idx, Err(vec![CompilerError::new(id, "Node not found")]));
            return None;
        };

        let types = self.types;
        let Some(node_type) = types.get(&node.node_type) else {
            let message = format!("Type '{}' not found", node.node_type);
            self.finish(idx, Err(vec![CompilerError::new(id, message)]));
            return None;
        };

        let joints: IndexMap<InputId, &'g Joint> = self
            .incoming
            .get(&id)
            .into_iter()
            .flatten()
            .map(|j| (j.dest.input.clone(), *j))
            .collect();

        let mut dependencies: IndexSet<NodeId> = node_type
            .inputs
            .iter()
            .filter_map(|input| joints.get(input))
            .map(|j| j.source.node)
            .collect();
        dependencies.extend(joints.values().map(|j| j.source.node));

        self.state[idx] = VisitState::InProgress;
        self.stack.push(idx);
        Some(Frame {
            idx,
            node,
            node_type,
            joints,
            dependencies: dependencies.into_iter().collect(),
            next: 0,
        })
    }

    /// Record a cycle closing at `idx`.
    ///
    /// The reported path starts at the first occurrence of `idx` on the
    /// current path, so nodes that merely lead into the cycle are left out:
    /// a path 1, 2, 3 that reaches 2 again reads `2 -> 3 -> 2`.
    fn record_cycle(&mut self, idx: usize) {
        let id = self.ids[idx];
        let start = self.stack.iter().position(|&i| i == idx).unwrap_or(0);
        let path = self.stack[start..]
            .iter()
            .map(|&i| self.ids[i].to_string())
            .chain(std::iter::once(id.to_string()))
            .collect::<Vec<_>>()
            .join(" -> ");
        warn!("cycle detected: {path}");

        let error = CompilerError::new(id, format!("Cyclic dependency found: {path}"));
        match &mut self.results[idx] {
            Some(Err(errors)) => errors.push(error),
            slot => *slot = Some(Err(vec![error])),
        }
    }

    /// Store the outcome of a finished visit. A cycle recorded against this
    /// node while it was in progress keeps it failed.
    fn finish(&mut self, idx: usize, outcome: NodeOutcome) {
        let merged = match (self.results[idx].take(), outcome) {
            (Some(Err(mut cycle)), Err(errors)) => {
                cycle.extend(errors);
                Err(cycle)
            }
            (Some(Err(cycle)), Ok(_)) => Err(cycle),
            (_, outcome) => outcome,
        };
        self.results[idx] = Some(merged);
        self.state[idx] = VisitState::Done;
    }
}
