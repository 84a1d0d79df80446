//! Graph data model shared by the catalogue, the editor document and the compiler.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::registry::{Entity, Registry};

pub type NodeTypes = Registry<NodeType>;
pub type Nodes = Registry<Node>;
pub type Joints = Registry<Joint>;

const UNKNOWN_PART: &str = "<Unknown>";

/// `<category>/<name>` key of a node type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NodeTypeId {
    pub category: String,
    pub name: String,
}

impl NodeTypeId {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Parse `<category>/<name>`. Both parts must be non-empty.
    pub fn parse(s: &str) -> Option<Self> {
        let (category, name) = s.split_once('/')?;
        if category.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(category, name))
    }

    /// Stand-in for type ids that could not be read back from a document.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_PART, UNKNOWN_PART)
    }

    pub fn is_unknown(&self) -> bool {
        self.category == UNKNOWN_PART && self.name == UNKNOWN_PART
    }
}

impl fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

impl From<String> for NodeTypeId {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or_else(|| {
            warn!("malformed node type id '{s}', treating it as unknown");
            Self::unknown()
        })
    }
}

impl From<NodeTypeId> for String {
    fn from(id: NodeTypeId) -> Self {
        id.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Unique prefix for every identifier the node's generated code declares.
    pub fn prefix(self) -> String {
        format!("node{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputId(pub String);

impl InputId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamId(pub String);

impl ParamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named value a node exposes. Color nodes expose per-channel swizzles too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputId {
    All,
    Red,
    Green,
    Blue,
    Alpha,
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Scalar,
    Color,
}

impl DataType {
    /// Outputs a node exposes when its result has this type.
    pub fn outputs(self) -> &'static [OutputId] {
        match self {
            DataType::Scalar => &[OutputId::All],
            DataType::Color => &[
                OutputId::All,
                OutputId::Red,
                OutputId::Green,
                OutputId::Blue,
                OutputId::Alpha,
            ],
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Rgba> for [f32; 4] {
    fn from(c: Rgba) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// A value bound to a node parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DataValue {
    Scalar(f32),
    Color(Rgba),
}

impl DataValue {
    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::Scalar(_) => DataType::Scalar,
            DataValue::Color(_) => DataType::Color,
        }
    }

    /// Literal expression for this value, e.g. `float(0.5)`.
    pub fn to_code(&self) -> String {
        match self {
            DataValue::Scalar(v) => format!("float({})", float_literal(*v)),
            DataValue::Color(c) => format!(
                "vec4({}, {}, {}, {})",
                float_literal(c.r),
                float_literal(c.g),
                float_literal(c.b),
                float_literal(c.a)
            ),
        }
    }

    /// Value a freshly placed node binds to a parameter of type `ty`.
    pub fn default_for(ty: DataType) -> Self {
        match ty {
            DataType::Scalar => DataValue::Scalar(0.0),
            DataType::Color => DataValue::Color(Rgba::default()),
        }
    }
}

/// Format a float so it always reads as a floating-point literal.
pub fn float_literal(v: f32) -> String {
    if v.is_finite() {
        // Debug keeps the fractional part (`1.0`) and switches to exponents at the extremes.
        format!("{v:?}")
    } else {
        "0.0".to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamType {
    pub id: ParamId,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl Entity for ParamType {
    type Id = ParamId;

    fn id(&self) -> ParamId {
        self.id.clone()
    }
}

/// One typed implementation of a node type.
///
/// `signature` lists the input types in declared input order followed by the
/// output type. `code` is the template the compiler substitutes into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overload {
    pub signature: Vec<DataType>,
    pub code: Vec<String>,
}

impl Overload {
    pub fn new<S: Into<String>>(
        signature: impl IntoIterator<Item = DataType>,
        code: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            signature: signature.into_iter().collect(),
            code: code.into_iter().map(Into::into).collect(),
        }
    }

    pub fn inputs(&self) -> &[DataType] {
        match self.signature.split_last() {
            Some((_, inputs)) => inputs,
            None => &[],
        }
    }

    pub fn output(&self) -> Option<DataType> {
        self.signature.last().copied()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    pub id: NodeTypeId,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub params: Registry<ParamType>,
    #[serde(default)]
    pub inputs: IndexSet<InputId>,
    #[serde(default)]
    pub outputs: IndexSet<OutputId>,
    #[serde(default)]
    pub globals: IndexSet<String>,
    /// Overloads, tried in order; the first whose input types match wins.
    #[serde(default)]
    pub code: Vec<Overload>,
}

impl NodeType {
    pub fn new(id: NodeTypeId) -> Self {
        Self {
            id,
            hidden: false,
            params: Registry::new(),
            inputs: IndexSet::new(),
            outputs: IndexSet::new(),
            globals: IndexSet::new(),
            code: Vec::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_param(mut self, id: &str, data_type: DataType) -> Self {
        self.params = self.params.put(ParamType {
            id: ParamId::new(id),
            data_type,
        });
        self
    }

    pub fn with_input(mut self, id: &str) -> Self {
        self.inputs.insert(InputId::new(id));
        self
    }

    pub fn with_output(mut self, id: OutputId) -> Self {
        self.outputs.insert(id);
        self
    }

    pub fn with_global(mut self, declaration: &str) -> Self {
        self.globals.insert(declaration.to_string());
        self
    }

    pub fn with_overload(mut self, overload: Overload) -> Self {
        self.code.push(overload);
        self
    }
}

impl Entity for NodeType {
    type Id = NodeTypeId;

    fn id(&self) -> NodeTypeId {
        self.id.clone()
    }
}

/// Canvas placement. Not used by the compiler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeTypeId,
    #[serde(default)]
    pub offset: Point,
    #[serde(default)]
    pub params: IndexMap<ParamId, DataValue>,
}

impl Node {
    pub fn new(id: u32, node_type: NodeTypeId) -> Self {
        Self {
            id: NodeId(id),
            node_type,
            offset: Point::default(),
            params: IndexMap::new(),
        }
    }

    pub fn with_param(mut self, id: &str, value: DataValue) -> Self {
        self.params.insert(ParamId::new(id), value);
        self
    }
}

impl Entity for Node {
    type Id = NodeId;

    fn id(&self) -> NodeId {
        self.id
    }
}

/// Destination end of a joint. Joints are keyed by it, so an input has at most one source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputSlot {
    pub node: NodeId,
    pub input: InputId,
}

impl InputSlot {
    pub fn new(node: NodeId, input: &str) -> Self {
        Self {
            node,
            input: InputId::new(input),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputSlot {
    pub node: NodeId,
    pub output: OutputId,
}

impl OutputSlot {
    pub fn new(node: NodeId, output: OutputId) -> Self {
        Self { node, output }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "JointRecord", into = "JointRecord")]
pub struct Joint {
    pub dest: InputSlot,
    pub source: OutputSlot,
}

impl Joint {
    pub fn new(source: u32, output: OutputId, dest: u32, input: &str) -> Self {
        Self {
            dest: InputSlot::new(NodeId(dest), input),
            source: OutputSlot::new(NodeId(source), output),
        }
    }
}

impl Entity for Joint {
    type Id = InputSlot;

    fn id(&self) -> InputSlot {
        self.dest.clone()
    }
}

/// Flat on-disk shape of a joint.
#[derive(Serialize, Deserialize)]
struct JointRecord {
    #[serde(rename = "sourceNode")]
    source_node: NodeId,
    #[serde(rename = "sourceOutput")]
    source_output: OutputId,
    #[serde(rename = "destNode")]
    dest_node: NodeId,
    #[serde(rename = "destInput")]
    dest_input: InputId,
}

impl From<JointRecord> for Joint {
    fn from(r: JointRecord) -> Self {
        Self {
            dest: InputSlot {
                node: r.dest_node,
                input: r.dest_input,
            },
            source: OutputSlot::new(r.source_node, r.source_output),
        }
    }
}

impl From<Joint> for JointRecord {
    fn from(j: Joint) -> Self {
        Self {
            source_node: j.source.node,
            source_output: j.source.output,
            dest_node: j.dest.node,
            dest_input: j.dest.input,
        }
    }
}
