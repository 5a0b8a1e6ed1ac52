//! Scene encoding
//!
//! Writes a [`Scene`] as a binary FBX file through `fbxcel`'s writer. Only the
//! records the reader looks at are produced: models with their
//! `Properties70`, the geometry and materials connected to them, and the
//! `OO` connections between objects. Used to build fixtures for tests and
//! tooling.

use std::io::{Seek, Write};

use fbxcel::low::FbxVersion;
use fbxcel::writer::v7400::binary::{FbxFooter, Writer};

use super::{NodeId, PropertyValue, Scene};
use crate::traits::{ParseError, ParseResult};

const MODEL_ID_BASE: i64 = 1_000_000;
const GEOMETRY_ID_BASE: i64 = 2_000_000;
const MATERIAL_ID_BASE: i64 = 3_000_000;

/// Separator between an object's name and its class in binary FBX
const NAME_CLASS_SEPARATOR: &str = "\u{0}\u{1}";

const FBX_HEADER_VERSION: i32 = 1003;
const MODEL_VERSION: i32 = 232;
const DEFINITIONS_VERSION: i32 = 100;

/// An object record of the `Objects` section
struct ObjectRecord<'a> {
    id: i64,
    class: &'static str,
    name: &'a str,
    subclass: &'static str,
    /// Node whose properties go into `Properties70`; models only
    model: Option<NodeId>,
}

/// Writes scenes as binary FBX
#[derive(Debug, Clone, Copy)]
pub struct SceneWriter {
    version: FbxVersion,
}

impl Default for SceneWriter {
    fn default() -> Self {
        Self::new(FbxVersion::V7_4)
    }
}

impl SceneWriter {
    pub fn new(version: FbxVersion) -> Self {
        Self { version }
    }

    /// Encode `scene` into `sink`
    pub fn write<W: Write + Seek>(&self, scene: &Scene, sink: W) -> ParseResult<()> {
        let (objects, connections) = layout(scene);
        let mut writer = Writer::new(sink, self.version).map_err(encode_error)?;

        open_node(&mut writer, "FBXHeaderExtension", &[])?;
        leaf(&mut writer, "FBXHeaderVersion", &[PropertyValue::Int(FBX_HEADER_VERSION)])?;
        leaf(&mut writer, "FBXVersion", &[PropertyValue::Int(super::raw_version(self.version) as i32)])?;
        close_node(&mut writer)?;

        open_node(&mut writer, "Definitions", &[])?;
        leaf(&mut writer, "Version", &[PropertyValue::Int(DEFINITIONS_VERSION)])?;
        leaf(&mut writer, "Count", &[PropertyValue::Int(0)])?;
        close_node(&mut writer)?;

        open_node(&mut writer, "Objects", &[])?;
        for object in &objects {
            let header = [
                PropertyValue::Long(object.id),
                PropertyValue::String(format!("{}{}{}", object.name, NAME_CLASS_SEPARATOR, object.class)),
                PropertyValue::String(object.subclass.to_string()),
            ];
            open_node(&mut writer, object.class, &header)?;

            if let Some(model) = object.model {
                leaf(&mut writer, "Version", &[PropertyValue::Int(MODEL_VERSION)])?;
                open_node(&mut writer, "Properties70", &[])?;
                for property in &scene.node(model).properties {
                    let mut record = vec![
                        PropertyValue::String(property.name.clone()),
                        PropertyValue::String(property.type_name.clone()),
                        PropertyValue::String(property.label.clone()),
                        PropertyValue::String(property.flags.clone()),
                    ];
                    record.extend(property.values.iter().cloned());
                    leaf(&mut writer, "P", &record)?;
                }
                close_node(&mut writer)?;
            }

            close_node(&mut writer)?;
        }
        close_node(&mut writer)?;

        open_node(&mut writer, "Connections", &[])?;
        for &(child, parent) in &connections {
            let record = [
                PropertyValue::String("OO".to_string()),
                PropertyValue::Long(child),
                PropertyValue::Long(parent),
            ];
            leaf(&mut writer, "C", &record)?;
        }
        close_node(&mut writer)?;

        writer
            .finalize_and_flush(&FbxFooter::default())
            .map(drop)
            .map_err(encode_error)
    }
}

/// Objects in file order and `(child, parent)` connections
fn layout(scene: &Scene) -> (Vec<ObjectRecord<'_>>, Vec<(i64, i64)>) {
    let model_id = |id: NodeId| MODEL_ID_BASE + id.0 as i64;

    let mut objects = Vec::new();
    let mut connections = Vec::new();
    let mut materials: Vec<&str> = Vec::new();

    for (id, node) in scene.nodes().skip(1) {
        let object_id = model_id(id);
        objects.push(ObjectRecord {
            id: object_id,
            class: "Model",
            name: &node.name,
            subclass: if node.mesh.is_some() { "Mesh" } else { "Null" },
            model: Some(id),
        });

        if let Some(parent) = node.parent {
            let parent_id = if parent == scene.root() { 0 } else { model_id(parent) };
            connections.push((object_id, parent_id));
        }

        if let Some(mesh) = &node.mesh {
            let geometry_id = GEOMETRY_ID_BASE + id.0 as i64;
            objects.push(ObjectRecord {
                id: geometry_id,
                class: "Geometry",
                name: mesh,
                subclass: "Mesh",
                model: None,
            });
            connections.push((geometry_id, object_id));
        }

        for material in &node.materials {
            let index = match materials.iter().position(|m| *m == material.as_str()) {
                Some(index) => index,
                None => {
                    materials.push(material);
                    objects.push(ObjectRecord {
                        id: MATERIAL_ID_BASE + materials.len() as i64 - 1,
                        class: "Material",
                        name: material,
                        subclass: "",
                        model: None,
                    });
                    materials.len() - 1
                }
            };
            connections.push((MATERIAL_ID_BASE + index as i64, object_id));
        }
    }

    (objects, connections)
}

fn encode_error(error: impl std::fmt::Display) -> ParseError {
    ParseError::Encode(error.to_string())
}

fn open_node<W: Write + Seek>(writer: &mut Writer<W>, name: &str, values: &[PropertyValue]) -> ParseResult<()> {
    let mut attributes = writer.new_node(name).map_err(encode_error)?;
    for value in values {
        match value {
            PropertyValue::Bool(v) => attributes.append_bool(*v),
            PropertyValue::Int(v) => attributes.append_i32(*v),
            PropertyValue::Long(v) => attributes.append_i64(*v),
            PropertyValue::Float(v) => attributes.append_f32(*v),
            PropertyValue::Double(v) => attributes.append_f64(*v),
            PropertyValue::String(v) => attributes.append_string_direct(v),
        }
        .map_err(encode_error)?;
    }
    Ok(())
}

fn close_node<W: Write + Seek>(writer: &mut Writer<W>) -> ParseResult<()> {
    writer.close_node().map_err(encode_error)
}

/// A node without children
fn leaf<W: Write + Seek>(writer: &mut Writer<W>, name: &str, values: &[PropertyValue]) -> ParseResult<()> {
    open_node(writer, name, values)?;
    close_node(writer)
}
