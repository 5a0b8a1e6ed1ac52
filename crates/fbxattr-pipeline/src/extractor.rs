//! Attribute extraction
//!
//! Walks an FBX scene depth-first and builds one record per node whose name
//! matches a mesh of the imported model. Schema fields are filled from the
//! node's properties, falling back to its ancestors.

use std::collections::HashMap;

use fbxattr_core::{Color, MeshRef, Result, Vec3};
use fbxattr_core::Error;
use fbxattr_parsers::{NodeId, Property, Scene, SceneReader};

use crate::model::ModelInstance;
use crate::schema::{FieldKind, FieldValue, MeshAttributes};

/// Read the scene of `source_path` and extract records for `model`
pub fn read_attributes<R: MeshAttributes>(
    model: &ModelInstance,
    source_path: &str,
    reader: &dyn SceneReader,
) -> Result<Vec<R>> {
    let scene = reader
        .read_scene(source_path)
        .map_err(|e| Error::scene_read(source_path, e))?;

    Ok(extract(model, &scene))
}

/// Extract one record per scene node that names a mesh of `model`
///
/// Records follow depth-first pre-order. Nodes without a matching mesh are
/// skipped, but their children are still visited.
pub fn extract<R: MeshAttributes>(model: &ModelInstance, scene: &Scene) -> Vec<R> {
    let meshes = mesh_map(model);
    let mut records = Vec::new();

    for id in scene.pre_order() {
        let node = scene.node(id);
        let Some((mesh, materials)) = meshes.get(node.name.as_str()) else {
            tracing::trace!(node = %node.name, "No imported mesh for node");
            continue;
        };

        let mut record = read_record::<R>(scene, id);
        record.bind_mesh((*mesh).clone(), materials.to_vec());
        records.push(record);
    }

    tracing::debug!(
        model = %model.name,
        meshes = meshes.len(),
        records = records.len(),
        "Extracted attribute records"
    );

    records
}

/// Mesh name to mesh and materials; a later component with the same mesh
/// name replaces an earlier one
fn mesh_map(model: &ModelInstance) -> HashMap<&str, (&MeshRef, &[String])> {
    model
        .mesh_components
        .iter()
        .filter_map(|component| {
            component
                .mesh
                .as_ref()
                .map(|mesh| (mesh.name.as_str(), (mesh, component.materials.as_slice())))
        })
        .collect()
}

fn read_record<R: MeshAttributes>(scene: &Scene, id: NodeId) -> R {
    let mut record = R::default();

    for field in R::fields() {
        let Some(property) = scene.find_property_hierarchical(id, field.name) else {
            continue;
        };
        let Some(value) = read_value(property, field.kind) else {
            continue;
        };
        if !record.set_field(field.name, value) {
            tracing::debug!(
                field = field.name,
                kind = %field.kind,
                property_type = %property.type_name,
                "Property value not assignable to field"
            );
        }
    }

    record
}

/// Convert a property according to the field kind
pub fn read_value(property: &Property, kind: FieldKind) -> Option<FieldValue> {
    let value = match kind {
        FieldKind::Bool => FieldValue::Bool(property.get_bool()),
        FieldKind::Int | FieldKind::Enum => FieldValue::Int(property.get_int()),
        FieldKind::String => FieldValue::String(property.get_string()),
        FieldKind::Float => {
            if property.is_double() {
                FieldValue::Float(property.get_double() as f32)
            } else {
                FieldValue::Float(property.get_float())
            }
        }
        FieldKind::Color => FieldValue::Color(Color::from_f64(property.get_color())),
        FieldKind::Vector3 => FieldValue::Vector3(Vec3::from_f64(property.get_double3())),
        FieldKind::Unsupported => return None,
    };

    Some(value)
}
