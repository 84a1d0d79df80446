//! Assembling the program for one requested node from a finished pass.

use std::collections::HashSet;

use indexmap::IndexSet;

use super::pass::CompilePass;
use super::{CompiledProgram, CompilerError, OutputDesc, ProgramResult};
use crate::config::ProgramConfig;
use crate::model::{DataType, OutputId};

pub(super) fn assemble(pass: &CompilePass<'_>, idx: usize, config: &ProgramConfig) -> ProgramResult {
    let compiled = match pass.outcome(idx) {
        Some(Ok(compiled)) => compiled,
        _ => return Err(errors_for_failed_preview(pass, idx)),
    };

    let id = pass.id_at(idx);
    let Some(output) = compiled.output.get(&OutputId::All) else {
        return Err(vec![CompilerError::new(id, "Output 'All' not found")]);
    };

    let order = dependencies_first(pass, idx);

    let mut globals: IndexSet<&str> = IndexSet::new();
    let mut body: Vec<&str> = Vec::new();
    for &i in &order {
        if let Some(Ok(node)) = pass.outcome(i) {
            globals.extend(node.globals.iter().map(String::as_str));
            body.extend(node.code.iter().map(String::as_str));
        }
    }
    let sink = sink_statement(config, output);

    let mut lines = Vec::with_capacity(globals.len() + body.len() + 5);
    lines.push(config.version.clone());
    lines.push(config.precision.clone());
    lines.extend(globals.into_iter().map(str::to_string));
    lines.push(config.entry_point.clone());
    lines.extend(
        body.into_iter()
            .chain(std::iter::once(sink.as_str()))
            .map(|line| format!("{}{line}", config.indent)),
    );
    lines.push("}".to_string());

    Ok(CompiledProgram { lines })
}

/// Errors returned when the preview of a failed node is requested.
///
/// This is every error recorded anywhere in the pass, not only those of the
/// requested node's dependency closure.
fn errors_for_failed_preview(pass: &CompilePass<'_>, _idx: usize) -> Vec<CompilerError> {
    pass.all_errors().cloned().collect()
}

/// Post-order walk over successfully compiled dependencies; each node once.
fn dependencies_first(pass: &CompilePass<'_>, root: usize) -> Vec<usize> {
    let mut seen = HashSet::from([root]);
    let mut order = Vec::new();
    // (node, position of the next dependency to descend into)
    let mut work: Vec<(usize, usize)> = vec![(root, 0)];

    while let Some(top) = work.last_mut() {
        let (idx, next) = *top;
        let Some(Ok(node)) = pass.outcome(idx) else {
            work.pop();
            continue;
        };
        match node.dependencies.get(next) {
            Some(dep) => {
                top.1 += 1;
                if let Some(dep_idx) = pass.index_of(*dep) {
                    if seen.insert(dep_idx) {
                        work.push((dep_idx, 0));
                    }
                }
            }
            None => {
                work.pop();
                order.push(idx);
            }
        }
    }
    order
}

fn sink_statement(config: &ProgramConfig, output: &OutputDesc) -> String {
    let v = &output.variable;
    match output.data_type {
        DataType::Scalar => format!("{} = vec4({v}, {v}, {v}, 1.0);", config.sink),
        DataType::Color => format!("{} = vec4({v}.rgb, 1.0);", config.sink),
    }
}
