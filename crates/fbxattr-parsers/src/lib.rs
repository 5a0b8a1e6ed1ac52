//! fbxattr-parsers
//!
//! Binary FBX reading for the fbxattr import pipeline.
//!
//! # Supported Formats
//!
//! | Format | Extension | Description |
//! |--------|-----------|-------------|
//! | FBX    | `.fbx`    | Autodesk FBX, binary encoding, 7.4 and 7.5 |
//!
//! Documents are loaded with `fbxcel-dom`. [`Scene`] builds the model
//! hierarchy on top of its object graph: `Model` objects, their
//! `Properties70` entries and the meshes and materials connected to them.
//!
//! # Example
//!
//! ```rust,ignore
//! use fbxattr_parsers::{fbx, Scene};
//!
//! let file = fbx::open("Models/Car.fbx".as_ref())?;
//! let scene = Scene::from_document(&file.document);
//!
//! for id in scene.pre_order() {
//!     println!("{}", scene.node(id).name);
//! }
//! ```

pub mod traits;
pub mod fbx;
pub mod logging;

// Re-export main types
pub use traits::{HumanReadable, ParseError, ParseResult};

pub use fbx::{
    FbxFile, FbxSceneReader, FbxVersion, MemorySceneReader, NodeId, Property, PropertyValue,
    Scene, SceneNode, SceneReader, SceneWriter,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
