//! Imported model instances
//!
//! The asset database's view of an imported model: its name, its path and
//! the mesh components created for it.

use serde::{Deserialize, Serialize};

use fbxattr_core::path::file_stem;
use fbxattr_core::{MeshRef, ModelRef};
use fbxattr_parsers::Scene;

/// A mesh and the materials it is rendered with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshComponent {
    pub mesh: Option<MeshRef>,
    pub materials: Vec<String>,
}

/// An imported model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInstance {
    /// Name of the model's root object
    pub name: String,
    /// Project-relative path of the model file
    pub path: String,
    pub mesh_components: Vec<MeshComponent>,
}

impl ModelInstance {
    /// An empty model named after the file stem of `path`
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_stem(&path).to_string(),
            path,
            mesh_components: Vec::new(),
        }
    }

    /// Add a component whose mesh is named `mesh`
    pub fn with_mesh<I, S>(mut self, mesh: &str, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mesh_components.push(MeshComponent {
            mesh: Some(MeshRef::new(mesh, self.path.clone())),
            materials: materials.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Build the instance an import of `scene` produces
    ///
    /// Every node carrying geometry becomes a mesh component named after the
    /// node, in scene pre-order.
    pub fn from_scene(path: impl Into<String>, scene: &Scene) -> Self {
        let mut model = Self::new(path);

        for id in scene.pre_order() {
            let node = scene.node(id);
            if node.mesh.is_some() {
                model.mesh_components.push(MeshComponent {
                    mesh: Some(MeshRef::new(node.name.clone(), model.path.clone())),
                    materials: node.materials.clone(),
                });
            }
        }

        model
    }

    pub fn model_ref(&self) -> ModelRef {
        ModelRef::new(self.path.clone(), self.name.clone())
    }
}
