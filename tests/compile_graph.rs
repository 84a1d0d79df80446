use std::path::PathBuf;

use shader_graph::catalogue::load_default_catalogue;
use shader_graph::model::{
    DataValue, InputSlot, Joint, Joints, Node, NodeId, NodeTypeId, Nodes, OutputId, OutputSlot,
    Point, Rgba,
};
use shader_graph::persist::load_model_from_path;
use shader_graph::{CompilerError, Document, ProgramConfig, compile};

fn case_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("cases")
        .join(name)
}

fn ty(s: &str) -> NodeTypeId {
    NodeTypeId::parse(s).unwrap()
}

fn demo_document() -> Document {
    let mut doc = Document::new(load_default_catalogue().unwrap());
    let model = load_model_from_path(case_dir("demo-graph").join("model.json")).unwrap();
    doc.apply_persisted(model);
    doc
}

#[test]
fn demo_graph_result_matches_expected_program() {
    let doc = demo_document();
    let previews = doc.compile(&ProgramConfig::default());
    assert_eq!(previews.len(), doc.nodes.len());

    let expected = std::fs::read_to_string(case_dir("demo-graph").join("result.frag")).unwrap();
    let program = previews[&NodeId(14)]
        .as_ref()
        .unwrap_or_else(|e| panic!("result node failed: {e:?}"));
    assert_eq!(program.to_string(), expected);
}

#[test]
fn every_demo_node_has_a_preview() {
    let doc = demo_document();
    let previews = doc.compile(&ProgramConfig::default());
    for (id, result) in &previews {
        let program = result
            .as_ref()
            .unwrap_or_else(|e| panic!("node {id} failed: {e:?}"));
        let sink = &program.lines[program.lines.len() - 2];
        assert!(
            sink.contains(&format!("node{id}_result")),
            "node {id} sink does not read its own result: {sink}"
        );
    }
    // Previews come back in node order.
    let order: Vec<u32> = previews.keys().map(|id| id.0).collect();
    assert_eq!(order, vec![1, 3, 4, 5, 6, 7, 8, 9, 2, 10, 11, 12, 13, 14]);
}

#[test]
fn scalar_constant_into_result() {
    let types = load_default_catalogue().unwrap();
    let nodes: Nodes = [
        Node::new(1, ty("Constant/Scalar")).with_param("Value", DataValue::Scalar(0.5)),
        Node::new(2, ty("Output/Result")),
    ]
    .into_iter()
    .collect();
    let joints: Joints = [Joint::new(1, OutputId::All, 2, "Color")].into_iter().collect();

    let previews = compile(&types, &nodes, &joints);
    let program = previews[&NodeId(2)].as_ref().unwrap();
    assert_eq!(
        program.lines,
        vec![
            "#version 100",
            "precision mediump float;",
            "void main( void ) {",
            "  float node1_result = float(0.5);",
            "  float node2_result = node1_result;",
            "  gl_FragColor = vec4(node2_result, node2_result, node2_result, 1.0);",
            "}",
        ]
    );
}

#[test]
fn add_scalar_to_color_selects_vector_overload() {
    let mut doc = Document::new(load_default_catalogue().unwrap());
    let s = doc.add_node(&ty("Constant/Scalar"), Point::default()).unwrap();
    let c = doc.add_node(&ty("Constant/Color"), Point::default()).unwrap();
    let add = doc.add_node(&ty("Math/Add"), Point::default()).unwrap();
    doc.set_param(c, "Value", DataValue::Color(Rgba::new(1.0, 0.5, 0.25, 1.0)))
        .unwrap();
    doc.connect(OutputSlot::new(s, OutputId::All), InputSlot::new(add, "A"))
        .unwrap();
    doc.connect(OutputSlot::new(c, OutputId::All), InputSlot::new(add, "B"))
        .unwrap();

    let previews = doc.compile(&ProgramConfig::default());
    let program = previews[&add].as_ref().unwrap();
    assert!(program
        .lines
        .contains(&"  vec4 node3_result = node1_result + node2_result;".to_string()));
    assert_eq!(
        program.lines[program.lines.len() - 2],
        "  gl_FragColor = vec4(node3_result.rgb, 1.0);"
    );
}

#[test]
fn scalar_and_color_into_min_max() {
    for (name, func) in [("Math/Min", "min"), ("Math/Max", "max")] {
        let mut doc = Document::new(load_default_catalogue().unwrap());
        let s = doc.add_node(&ty("Global/Time"), Point::default()).unwrap();
        let c = doc.add_node(&ty("Global/Position"), Point::default()).unwrap();
        let op = doc.add_node(&ty(name), Point::default()).unwrap();
        doc.connect(OutputSlot::new(s, OutputId::All), InputSlot::new(op, "A"))
            .unwrap();
        doc.connect(OutputSlot::new(c, OutputId::All), InputSlot::new(op, "B"))
            .unwrap();

        let previews = doc.compile(&ProgramConfig::default());
        let program = previews[&op].as_ref().unwrap();
        let line = format!("  vec4 node3_result = {func}(vec4(node1_result), node2_result);");
        assert!(program.lines.contains(&line), "{name}: {:#?}", program.lines);
    }
}

#[test]
fn deep_chain_compiles_every_preview() {
    const LEN: u32 = 2_000;
    let types = load_default_catalogue().unwrap();
    let nodes: Nodes = (1..=LEN)
        .rev()
        .map(|id| {
            if id == 1 {
                Node::new(id, ty("Global/Time"))
            } else {
                Node::new(id, ty("Trigonometry/Sin"))
            }
        })
        .collect();
    let joints: Joints = (2..=LEN)
        .map(|id| Joint::new(id - 1, OutputId::All, id, "X"))
        .collect();

    let previews = compile(&types, &nodes, &joints);
    assert_eq!(previews.len(), LEN as usize);
    let sink = previews[&NodeId(LEN)].as_ref().unwrap();
    assert_eq!(sink.lines.len(), LEN as usize + 6);
    assert_eq!(sink.lines[2], "uniform float time;");
    assert!(previews.values().all(|r| r.is_ok()));
}

#[test]
fn channel_split_and_compose() {
    let mut doc = Document::new(load_default_catalogue().unwrap());
    let pos = doc.add_node(&ty("Global/Position"), Point::default()).unwrap();
    let compose = doc.add_node(&ty("Color/Compose"), Point::default()).unwrap();
    for (input, output) in [
        ("R", OutputId::Blue),
        ("G", OutputId::Green),
        ("B", OutputId::Red),
        ("A", OutputId::Alpha),
    ] {
        doc.connect(OutputSlot::new(pos, output), InputSlot::new(compose, input))
            .unwrap();
    }

    let previews = doc.compile(&ProgramConfig::default());
    let program = previews[&compose].as_ref().unwrap();
    assert_eq!(program.lines[2], "varying vec4 position;");
    assert!(program.lines.contains(
        &"  vec4 node2_result = vec4(node1_result.b, node1_result.g, node1_result.r, node1_result.a);"
            .to_string()
    ));
    // Four joints from one source still emit its code once.
    let emitted = program
        .lines
        .iter()
        .filter(|l| l.contains("node1_result = position;"))
        .count();
    assert_eq!(emitted, 1);
}

#[test]
fn failed_node_reports_errors_from_the_whole_graph() {
    let mut doc = Document::new(load_default_catalogue().unwrap());
    let time = doc.add_node(&ty("Global/Time"), Point::default()).unwrap();
    let sin = doc.add_node(&ty("Trigonometry/Sin"), Point::default()).unwrap();
    let max = doc.add_node(&ty("Math/Max"), Point::default()).unwrap();
    let lonely = doc.add_node(&ty("Trigonometry/Cos"), Point::default()).unwrap();
    doc.connect(OutputSlot::new(time, OutputId::All), InputSlot::new(sin, "X"))
        .unwrap();
    doc.connect(OutputSlot::new(sin, OutputId::All), InputSlot::new(max, "A"))
        .unwrap();

    let previews = doc.compile(&ProgramConfig::default());
    assert!(previews[&time].is_ok());
    assert!(previews[&sin].is_ok());

    let expected = vec![
        CompilerError::new(max, "Input 'B' not connected"),
        CompilerError::new(lonely, "Input 'X' not connected"),
    ];
    assert_eq!(previews[&max], Err(expected.clone()));
    assert_eq!(previews[&lonely], Err(expected));
}

#[test]
fn cycle_fails_every_node_on_it() {
    let mut doc = Document::new(load_default_catalogue().unwrap());
    let a = doc.add_node(&ty("Trigonometry/Sin"), Point::default()).unwrap();
    let b = doc.add_node(&ty("Trigonometry/Cos"), Point::default()).unwrap();
    doc.connect(OutputSlot::new(a, OutputId::All), InputSlot::new(b, "X"))
        .unwrap();
    doc.connect(OutputSlot::new(b, OutputId::All), InputSlot::new(a, "X"))
        .unwrap();

    let previews = doc.compile(&ProgramConfig::default());
    let errors = previews[&a].as_ref().unwrap_err();
    assert_eq!(
        errors,
        &vec![CompilerError::new(a, "Cyclic dependency found: 1 -> 2 -> 1")]
    );
    assert!(previews[&b].is_err());
}

#[test]
fn stale_node_type_is_reported_at_compile_time() {
    let mut doc = Document::new(load_default_catalogue().unwrap());
    let model = shader_graph::persist::load_model_from_str(
        r#"{ "nodes": [ { "id": 1, "type": "const" } ] }"#,
    )
    .unwrap();
    doc.apply_persisted(model);

    let previews = doc.compile(&ProgramConfig::default());
    assert_eq!(
        previews[&NodeId(1)],
        Err(vec![CompilerError::new(
            NodeId(1),
            "Type '<Unknown>/<Unknown>' not found"
        )])
    );
}
