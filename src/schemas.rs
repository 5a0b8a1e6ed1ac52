//! Schemas shipped with the binary
//!
//! Field names match the custom properties authored on meshes in the DCC
//! tool. A project adds its own schemas here and lists the container in
//! [`register_all`].

use serde::{Deserialize, Serialize};

use fbxattr_pipeline::{Container, ContainerData, Filter, RuleRegistry};

fbxattr_pipeline::attribute_enum! {
    /// Must list the same entries, in the same order, as the enum property in the FBX file
    pub enum MyEnum { Green, Blue, Red }
}

fbxattr_pipeline::mesh_attributes! {
    /// Example per-mesh record
    pub struct FbxMeshExample {
        "myEnum" => pub my_enum: MyEnum,
        "myString" => pub my_string: String,
        "myInteger" => pub my_integer: i32,
        "myFloat" => pub my_float: f32,
        "myColor" => pub my_color: fbxattr_pipeline::Color,
        "myVector" => pub my_vector: fbxattr_pipeline::Vec3,
    }
}

/// Container generated for static meshes
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FbxMeshExampleContainer {
    #[serde(flatten)]
    pub data: ContainerData<FbxMeshExample>,
}

impl Container for FbxMeshExampleContainer {
    type Record = FbxMeshExample;
    const TYPE_NAME: &'static str = "FbxMeshExampleContainer";
    const FILTERS: &'static [Filter] = &[Filter::new("^SM_", "_Attributes")];

    fn data(&self) -> &ContainerData<FbxMeshExample> {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ContainerData<FbxMeshExample> {
        &mut self.data
    }

    fn on_post_import(&mut self) {
        tracing::debug!(records = self.data.records.len(), "Example container imported");
    }
}

/// Register every container type shipped with the binary
pub fn register_all(registry: &RuleRegistry) -> usize {
    registry.register_container::<FbxMeshExampleContainer>()
}
