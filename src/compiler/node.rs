//! Compiling a single node once its dependencies have been visited.

use indexmap::IndexMap;

use super::{CompiledNode, CompilerError, NodeOutcome, OutputDesc};
use crate::accumulate::{combine, flatten_all, flatten_each};
use crate::model::{DataType, InputId, Joint, Node, NodeId, NodeType, OutputId, Overload, ParamType};

/// Placeholder replaced with the node's naming prefix (`node<id>`).
pub(crate) const NODE_PLACEHOLDER: &str = "#node";

/// Resolve inputs, pick an overload, bind parameters and fill in the template.
///
/// `lookup` returns the outcome of an already visited node. A failed
/// dependency makes this node fail without adding errors of its own.
pub(super) fn compile_node<'a>(
    node: &Node,
    node_type: &NodeType,
    joints: &IndexMap<InputId, &Joint>,
    dependencies: Vec<NodeId>,
    lookup: impl Fn(NodeId) -> Option<&'a NodeOutcome>,
) -> NodeOutcome {
    let inputs = flatten_all(
        node_type
            .inputs
            .iter()
            .map(|input| resolve_input(node.id, input, joints, &lookup)),
    );

    let overload = inputs.and_then(|inputs| {
        let types: Vec<DataType> = inputs.iter().map(|(_, desc)| desc.data_type).collect();
        match select_overload(node_type, &types) {
            Some(selected) => Ok((inputs, selected)),
            None => Err(vec![CompilerError::new(node.id, "No suitable overload found")]),
        }
    });

    let params = flatten_each(
        node_type
            .params
            .iter()
            .map(|param| resolve_param(node, param)),
    );

    let ((inputs, (overload, output_type)), params) = combine(overload, params)?;

    let prefix = node.id.prefix();
    let mut replaces: Vec<(String, String)> = inputs
        .into_iter()
        .map(|(placeholder, desc)| (placeholder, desc.variable))
        .collect();
    replaces.extend(params);
    replaces.push((NODE_PLACEHOLDER.to_string(), prefix.clone()));

    Ok(CompiledNode {
        dependencies,
        globals: node_type.globals.clone(),
        code: substitute(&overload.code, replaces),
        output: build_outputs(&format!("{prefix}_result"), output_type),
    })
}

fn resolve_input<'a>(
    node_id: NodeId,
    input: &InputId,
    joints: &IndexMap<InputId, &Joint>,
    lookup: &impl Fn(NodeId) -> Option<&'a NodeOutcome>,
) -> Result<(String, OutputDesc), Vec<CompilerError>> {
    let Some(joint) = joints.get(input) else {
        return Err(vec![CompilerError::new(
            node_id,
            format!("Input '{input}' not connected"),
        )]);
    };

    let source = match lookup(joint.source.node) {
        Some(Ok(source)) => source,
        // The dependency already reported why it failed.
        Some(Err(_)) => return Err(Vec::new()),
        None => {
            return Err(vec![CompilerError::new(
                node_id,
                format!("Node for input '{input}' not found"),
            )]);
        }
    };

    match source.output.get(&joint.source.output) {
        Some(desc) => Ok((format!("#input{input}"), desc.clone())),
        None => Err(vec![CompilerError::new(
            node_id,
            format!(
                "Output '{}' of node {} not found for input '{input}'",
                joint.source.output, joint.source.node
            ),
        )]),
    }
}

/// First overload, in declared order, whose input types equal `inputs` exactly.
/// Returns it together with its output type.
pub(crate) fn select_overload<'t>(
    node_type: &'t NodeType,
    inputs: &[DataType],
) -> Option<(&'t Overload, DataType)> {
    node_type.code.iter().find_map(|o| match o.output() {
        Some(output) if o.inputs() == inputs => Some((o, output)),
        _ => None,
    })
}

fn resolve_param(node: &Node, param: &ParamType) -> Result<(String, String), CompilerError> {
    let Some(value) = node.params.get(&param.id) else {
        return Err(CompilerError::new(
            node.id,
            format!("Parameter '{}' not set", param.id),
        ));
    };

    if value.data_type() != param.data_type {
        return Err(CompilerError::new(
            node.id,
            format!(
                "Parameter '{}' has wrong type, expected '{}', got '{}'",
                param.id,
                param.data_type,
                value.data_type()
            ),
        ));
    }

    Ok((format!("#param{}", param.id), value.to_code()))
}

/// Literal, global replacement of every placeholder on every line.
///
/// Longer placeholders go first so `#inputA` never clobbers `#inputAB`.
pub(crate) fn substitute(lines: &[String], mut replaces: Vec<(String, String)>) -> Vec<String> {
    replaces.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    lines
        .iter()
        .map(|line| {
            replaces
                .iter()
                .fold(line.clone(), |acc, (from, to)| acc.replace(from.as_str(), to))
        })
        .collect()
}

/// `All` always; color results also expose their channels as swizzles.
pub(crate) fn build_outputs(variable: &str, ty: DataType) -> IndexMap<OutputId, OutputDesc> {
    let mut output = IndexMap::new();
    output.insert(
        OutputId::All,
        OutputDesc {
            variable: variable.to_string(),
            data_type: ty,
        },
    );

    match ty {
        DataType::Scalar => {}
        DataType::Color => {
            let channels = [
                (OutputId::Red, "r"),
                (OutputId::Green, "g"),
                (OutputId::Blue, "b"),
                (OutputId::Alpha, "a"),
            ];
            for (id, swizzle) in channels {
                output.insert(
                    id,
                    OutputDesc {
                        variable: format!("{variable}.{swizzle}"),
                        data_type: DataType::Scalar,
                    },
                );
            }
        }
    }
    output
}
