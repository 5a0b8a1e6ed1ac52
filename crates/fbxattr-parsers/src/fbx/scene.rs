//! FBX scene graph
//!
//! Builds the model hierarchy from a loaded [`Document`]:
//!
//! - `Model` objects become [`SceneNode`]s carrying their `Properties70`
//!   entries as [`Property`] values
//! - `Geometry` and `Material` objects connected to a model name its mesh and
//!   materials
//! - a model's first destination that is another model, or the root (id 0),
//!   becomes its parent
//!
//! Nodes live in an arena addressed by [`NodeId`]. The root is always
//! `NodeId(0)`.

use std::collections::HashMap;

use fbxcel::low::v7400::AttributeValue;
use fbxcel::tree::v7400::NodeHandle;
use fbxcel_dom::v7400::object::ObjectId;
use serde::Serialize;
use serde_json::json;

use super::Document;
use crate::traits::HumanReadable;

/// Name of the implicit scene root
pub const ROOT_NODE_NAME: &str = "RootNode";

/// Object id of the implicit scene root in `Connections`
const ROOT_OBJECT_ID: i64 = 0;

/// Index of a node in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// A scalar value of a `P` record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl PropertyValue {
    /// Convert a record attribute; array and binary attributes have no
    /// property counterpart
    pub fn from_attribute(value: &AttributeValue) -> Option<Self> {
        Some(match value {
            AttributeValue::Bool(v) => PropertyValue::Bool(*v),
            AttributeValue::I16(v) => PropertyValue::Int(i32::from(*v)),
            AttributeValue::I32(v) => PropertyValue::Int(*v),
            AttributeValue::I64(v) => PropertyValue::Long(*v),
            AttributeValue::F32(v) => PropertyValue::Float(*v),
            AttributeValue::F64(v) => PropertyValue::Double(*v),
            AttributeValue::String(s) => PropertyValue::String(s.clone()),
            _ => return None,
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            PropertyValue::Float(v) => Some(*v != 0.0),
            PropertyValue::Double(v) => Some(*v != 0.0),
            other => other.as_i64().map(|v| v != 0),
        }
    }

    /// Integer value widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Bool(v) => Some(i64::from(*v)),
            PropertyValue::Int(v) => Some(i64::from(*v)),
            PropertyValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(f64::from(*v)),
            PropertyValue::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Long(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Double(v) => write!(f, "{v}"),
            PropertyValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// A typed property from a `Properties70` block
///
/// Mirrors the `P` record layout: name, type, label, flags, then the value
/// attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub type_name: String,
    pub label: String,
    pub flags: String,
    pub values: Vec<PropertyValue>,
}

impl Property {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        label: impl Into<String>,
        values: Vec<PropertyValue>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            label: label.into(),
            flags: "U".to_string(),
            values,
        }
    }

    pub fn bool(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, "bool", "", vec![PropertyValue::Int(i32::from(value))])
    }

    pub fn int(name: impl Into<String>, value: i32) -> Self {
        Self::new(name, "int", "Integer", vec![PropertyValue::Int(value)])
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, "KString", "", vec![PropertyValue::String(value.into())])
    }

    /// Single-precision number
    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, "float", "", vec![PropertyValue::Float(value)])
    }

    /// Double-precision number, the usual storage for authored numbers
    pub fn double(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, "double", "Number", vec![PropertyValue::Double(value)])
    }

    pub fn color(name: impl Into<String>, rgb: [f64; 3]) -> Self {
        Self::new(name, "ColorRGB", "Color", rgb.iter().copied().map(PropertyValue::Double).collect())
    }

    pub fn color_alpha(name: impl Into<String>, rgba: [f64; 4]) -> Self {
        Self::new(name, "ColorAndAlpha", "", rgba.iter().copied().map(PropertyValue::Double).collect())
    }

    pub fn vector3(name: impl Into<String>, xyz: [f64; 3]) -> Self {
        Self::new(name, "Vector3D", "Vector", xyz.iter().copied().map(PropertyValue::Double).collect())
    }

    pub fn enumeration(name: impl Into<String>, index: i32) -> Self {
        Self::new(name, "enum", "", vec![PropertyValue::Int(index)])
    }

    fn first(&self) -> Option<&PropertyValue> {
        self.values.first()
    }

    fn channel(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(PropertyValue::as_f64)
    }

    pub fn get_bool(&self) -> bool {
        self.first().and_then(PropertyValue::as_bool).unwrap_or(false)
    }

    /// Integer value; floating values are truncated
    pub fn get_int(&self) -> i32 {
        match self.first() {
            Some(value) => value
                .as_i64()
                .map(|v| v as i32)
                .or_else(|| value.as_f64().map(|v| v as i32))
                .unwrap_or(0),
            None => 0,
        }
    }

    /// String value; non-string values are rendered
    pub fn get_string(&self) -> String {
        match self.first() {
            Some(PropertyValue::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    pub fn get_float(&self) -> f32 {
        self.get_double() as f32
    }

    pub fn get_double(&self) -> f64 {
        self.channel(0).unwrap_or(0.0)
    }

    /// Whether the value is stored in double precision
    pub fn is_double(&self) -> bool {
        matches!(self.first(), Some(PropertyValue::Double(_)))
    }

    /// RGBA channels; alpha is 1 when only RGB is stored
    pub fn get_color(&self) -> [f64; 4] {
        [
            self.channel(0).unwrap_or(0.0),
            self.channel(1).unwrap_or(0.0),
            self.channel(2).unwrap_or(0.0),
            self.channel(3).unwrap_or(1.0),
        ]
    }

    pub fn get_double3(&self) -> [f64; 3] {
        [
            self.channel(0).unwrap_or(0.0),
            self.channel(1).unwrap_or(0.0),
            self.channel(2).unwrap_or(0.0),
        ]
    }

    /// Decode a `P` record; `None` when it has no name
    fn from_record(record: NodeHandle<'_>) -> Option<Self> {
        let attributes = record.attributes();
        let text = |i: usize| {
            attributes
                .get(i)
                .and_then(AttributeValue::get_string)
                .map(str::to_string)
        };

        Some(Self {
            name: text(0)?,
            type_name: text(1).unwrap_or_default(),
            label: text(2).unwrap_or_default(),
            flags: text(3).unwrap_or_default(),
            values: attributes.iter().skip(4).filter_map(PropertyValue::from_attribute).collect(),
        })
    }
}

/// A node of the scene hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Properties in file order
    pub properties: Vec<Property>,
    /// Name of the geometry attached to this node
    pub mesh: Option<String>,
    /// Names of the materials connected to this node
    pub materials: Vec<String>,
}

impl SceneNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Property declared directly on this node
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Add a property, replacing one of the same name
    pub fn set_property(&mut self, property: Property) {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }
}

/// FBX scene hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene containing only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode::new(ROOT_NODE_NAME)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    /// All nodes in arena order, root first
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.nodes.iter().enumerate().map(|(index, node)| (NodeId(index), node))
    }

    /// Number of nodes, root and detached nodes included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node under `parent`
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = self.add_detached(name);
        self.attach(id, parent);
        id
    }

    fn add_detached(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.push(SceneNode::new(name));
        NodeId(self.nodes.len() - 1)
    }

    /// Attach a detached node; refuses re-parenting and cycles
    fn attach(&mut self, child: NodeId, parent: NodeId) -> bool {
        if child == parent || self.nodes[child.0].parent.is_some() || child == self.root() {
            return false;
        }
        if self.ancestors(parent).any(|id| id == child) {
            return false;
        }

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        true
    }

    /// `id` followed by its parent chain up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.nodes[current.0].parent)
    }

    /// Depth-first pre-order from the root, root included
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }

        order
    }

    /// Look a property up on `id`, then on each ancestor
    pub fn find_property_hierarchical(&self, id: NodeId, name: &str) -> Option<&Property> {
        self.ancestors(id).find_map(|node| self.nodes[node.0].property(name))
    }

    /// First node with the given name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Build the hierarchy from the document's `Model` objects
    pub fn from_document(document: &Document) -> Self {
        let mut scene = Scene::new();
        let mut models: HashMap<ObjectId, NodeId> = HashMap::new();

        for object in document.objects().filter(|o| o.class() == "Model") {
            let node = scene.add_detached(object.name().unwrap_or_default());
            if let Some(block) = object.node().first_child_by_name("Properties70") {
                for record in block.children_by_name("P") {
                    match Property::from_record(record) {
                        Some(property) => scene.node_mut(node).set_property(property),
                        None => tracing::debug!(
                            model = object.object_id().raw(),
                            "Skipping malformed property record"
                        ),
                    }
                }
            }
            models.insert(object.object_id(), node);
        }

        for object in document.objects().filter(|o| o.class() == "Model") {
            let Some(&node) = models.get(&object.object_id()) else {
                continue;
            };

            let parent = object.destination_objects().find_map(|destination| {
                if destination.object_id().raw() == ROOT_OBJECT_ID {
                    Some(scene.root())
                } else {
                    models.get(&destination.object_id()).copied()
                }
            });
            if let Some(parent) = parent {
                if !scene.attach(node, parent) {
                    tracing::warn!(
                        model = object.object_id().raw(),
                        parent = scene.node(parent).name.as_str(),
                        "Ignoring conflicting model connection"
                    );
                }
            }

            for source in object.source_objects() {
                let Some(source) = source.object_handle() else {
                    continue;
                };
                let name = source.name().unwrap_or_default().to_string();
                match source.class() {
                    "Geometry" => scene.node_mut(node).mesh = Some(name),
                    "Material" => scene.node_mut(node).materials.push(name),
                    _ => {}
                }
            }
        }

        tracing::debug!(models = models.len(), "Built scene from FBX document");
        scene
    }

    fn write_readable(&self, out: &mut String) {
        let mut stack = vec![(self.root(), 0usize)];

        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let indent = "  ".repeat(depth);

            out.push_str(&format!("{indent}{}", node.name));
            if let Some(mesh) = &node.mesh {
                out.push_str(&format!(" [mesh: {mesh}]"));
            }
            if !node.materials.is_empty() {
                out.push_str(&format!(" [materials: {}]", node.materials.join(", ")));
            }
            out.push('\n');

            for property in &node.properties {
                let values: Vec<String> = property.values.iter().map(ToString::to_string).collect();
                out.push_str(&format!(
                    "{indent}  - {} ({}): {}\n",
                    property.name,
                    property.type_name,
                    values.join(", ")
                ));
            }

            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
    }

    /// Nested JSON built leaves first, so children exist before their parent
    fn build_json(&self) -> serde_json::Value {
        let mut built: HashMap<NodeId, serde_json::Value> = HashMap::new();

        for id in self.pre_order().into_iter().rev() {
            let node = self.node(id);
            let properties: serde_json::Map<String, serde_json::Value> = node
                .properties
                .iter()
                .map(|p| (p.name.clone(), json!({ "type": p.type_name, "values": p.values })))
                .collect();
            let children: Vec<_> = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();

            built.insert(
                id,
                json!({
                    "name": node.name,
                    "mesh": node.mesh,
                    "materials": node.materials,
                    "properties": properties,
                    "children": children,
                }),
            );
        }

        built.remove(&self.root()).unwrap_or(serde_json::Value::Null)
    }
}

impl HumanReadable for Scene {
    fn to_readable_string(&self) -> String {
        let mut out = String::new();
        self.write_readable(&mut out);
        out
    }

    fn to_json(&self) -> serde_json::Value {
        self.build_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use fbxcel::low::FbxVersion;
    use fbxcel::writer::v7400::binary::{FbxFooter, Writer};

    use crate::fbx::{read, SceneWriter};

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();
        let car = scene.add_node(scene.root(), "Car");
        scene.node_mut(car).set_property(Property::double("myFloat", 2.5));
        let wheel = scene.add_node(car, "Wheel");
        scene.node_mut(wheel).mesh = Some("Wheel".to_string());
        scene.node_mut(wheel).materials = vec!["Rubber".to_string(), "Chrome".to_string()];
        scene.node_mut(wheel).set_property(Property::int("myInteger", 4));
        let body = scene.add_node(car, "Body");
        scene.node_mut(body).materials = vec!["Chrome".to_string()];
        scene
    }

    fn load(bytes: Vec<u8>) -> Scene {
        let file = read(Cursor::new(bytes)).unwrap();
        Scene::from_document(&file.document)
    }

    /// Objects and connections written record by record
    fn raw_document(models: &[(i64, &str)], connections: &[(i64, i64)]) -> Vec<u8> {
        let mut sink = Cursor::new(Vec::new());
        let mut writer = Writer::new(&mut sink, FbxVersion::V7_4).unwrap();

        writer.new_node("Definitions").unwrap();
        writer.close_node().unwrap();

        writer.new_node("Objects").unwrap();
        for &(id, name) in models {
            {
                let mut attributes = writer.new_node("Model").unwrap();
                attributes.append_i64(id).unwrap();
                attributes.append_string_direct(&format!("{name}\u{0}\u{1}Model")).unwrap();
                attributes.append_string_direct("Null").unwrap();
            }
            writer.close_node().unwrap();
        }
        writer.close_node().unwrap();

        writer.new_node("Connections").unwrap();
        for &(child, parent) in connections {
            {
                let mut attributes = writer.new_node("C").unwrap();
                attributes.append_string_direct("OO").unwrap();
                attributes.append_i64(child).unwrap();
                attributes.append_i64(parent).unwrap();
            }
            writer.close_node().unwrap();
        }
        writer.close_node().unwrap();

        writer.finalize_and_flush(&FbxFooter::default()).unwrap();
        sink.into_inner()
    }

    #[test]
    fn test_pre_order() {
        let mut scene = Scene::new();
        let a = scene.add_node(scene.root(), "A");
        let b = scene.add_node(a, "B");
        let c = scene.add_node(a, "C");

        assert_eq!(scene.pre_order(), vec![scene.root(), a, b, c]);
    }

    #[test]
    fn test_hierarchical_lookup_walks_ancestors() {
        let scene = sample_scene();
        let wheel = scene.find_by_name("Wheel").unwrap();

        assert_eq!(scene.find_property_hierarchical(wheel, "myInteger").unwrap().get_int(), 4);
        assert_eq!(scene.find_property_hierarchical(wheel, "myFloat").unwrap().get_double(), 2.5);
        assert!(scene.find_property_hierarchical(scene.root(), "myFloat").is_none());
    }

    #[test]
    fn test_property_accessors() {
        let color = Property::color("c", [0.5, 0.25, 1.0]);
        assert_eq!(color.get_color(), [0.5, 0.25, 1.0, 1.0]);

        let rgba = Property::color_alpha("c", [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(rgba.get_color()[3], 0.4);

        assert!(Property::double("d", 1.0).is_double());
        assert!(!Property::float("f", 1.0).is_double());
        assert_eq!(Property::float("f", 1.5).get_float(), 1.5);
        assert!(Property::bool("b", true).get_bool());
        assert_eq!(Property::string("s", "hello").get_string(), "hello");
        assert_eq!(Property::enumeration("e", 2).get_int(), 2);
        assert_eq!(Property::vector3("v", [1.0, 2.0, 3.0]).get_double3(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_property_value_from_attribute() {
        assert_eq!(
            PropertyValue::from_attribute(&AttributeValue::I16(7)),
            Some(PropertyValue::Int(7))
        );
        assert_eq!(
            PropertyValue::from_attribute(&AttributeValue::String("x".into())),
            Some(PropertyValue::String("x".into()))
        );
        assert_eq!(PropertyValue::from_attribute(&AttributeValue::ArrF64(vec![1.0])), None);
        assert_eq!(PropertyValue::Long(3).as_f64(), Some(3.0));
    }

    #[test]
    fn test_document_round_trip() {
        let scene = sample_scene();
        let mut sink = Cursor::new(Vec::new());
        SceneWriter::new(FbxVersion::V7_4).write(&scene, &mut sink).unwrap();

        assert_eq!(load(sink.into_inner()), scene);
    }

    #[test]
    fn test_document_without_models_gives_root_only() {
        let scene = load(raw_document(&[], &[]));
        assert_eq!(scene.pre_order(), vec![scene.root()]);
        assert_eq!(scene.node(scene.root()).name, ROOT_NODE_NAME);
    }

    #[test]
    fn test_unconnected_models_stay_detached() {
        let scene = load(raw_document(&[(7, "Orphan")], &[]));

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.pre_order(), vec![scene.root()]);
        assert_eq!(scene.node(NodeId(1)).name, "Orphan");
    }

    #[test]
    fn test_cyclic_connections_are_ignored() {
        let scene = load(raw_document(&[(1, "A"), (2, "B")], &[(1, 2), (2, 1)]));

        let a = scene.find_by_name("A").unwrap();
        let b = scene.find_by_name("B").unwrap();
        // the second edge would close a loop and is dropped
        assert_eq!(scene.ancestors(a).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(scene.node(b).parent, None);
    }

    #[test]
    fn test_readable_dump() {
        let text = sample_scene().to_readable_string();
        assert!(text.starts_with("RootNode\n  Car\n"));
        assert!(text.contains("Wheel [mesh: Wheel] [materials: Rubber, Chrome]"));
        assert!(text.contains("- myInteger (int): 4"));

        let json = sample_scene().to_json();
        assert_eq!(json["children"][0]["children"][0]["name"], "Wheel");
        assert_eq!(json["children"][0]["children"][1]["name"], "Body");
    }

    #[test]
    fn test_deep_hierarchy_dumps() {
        let mut scene = Scene::new();
        let mut parent = scene.root();
        for depth in 0..3_000 {
            parent = scene.add_node(parent, format!("Level{depth}"));
        }

        let text = scene.to_readable_string();
        assert_eq!(text.lines().count(), 3_001);
        assert!(text.lines().last().unwrap().ends_with("Level2999"));

        let mut shallow = Scene::new();
        let mut parent = shallow.root();
        for depth in 0..64 {
            parent = shallow.add_node(parent, format!("Level{depth}"));
        }
        let mut json = &shallow.to_json();
        for _ in 0..64 {
            json = &json["children"][0];
        }
        assert_eq!(json["name"], "Level63");
    }
}
