//! fbxattr-pipeline
//!
//! Generates attribute containers for imported FBX models.
//!
//! # Overview
//!
//! | Piece | Role |
//! |-------|------|
//! | [`schema`] | Record types and the FBX property kinds they read |
//! | [`container`] | Persisted container types and their filter declarations |
//! | [`registry`] | Compiled filter rules, looked up per import |
//! | [`trigger`] | Import hook and the deferred request queue |
//! | [`materializer`] | Load-or-create, extract, persist, re-import |
//! | [`extractor`] | Scene walk joining nodes to imported meshes |
//! | [`store`] | Asset database seam with filesystem and in-memory hosts |
//!
//! # Example
//!
//! ```rust,ignore
//! use fbxattr_pipeline::{ImportContext, ImportTrigger, PipelineConfig, GLOBAL_REGISTRY};
//!
//! GLOBAL_REGISTRY.register_container::<PropContainer>();
//!
//! let mut trigger = ImportTrigger::new(&GLOBAL_REGISTRY, PipelineConfig::default());
//! trigger.on_postprocess_model("SM_Crate", "Models/SM_Crate.fbx");
//!
//! let mut ctx = ImportContext::new(&mut database, &scenes);
//! for outcome in trigger.run_deferred(&mut ctx) {
//!     println!("{:?}", outcome.result);
//! }
//! ```

pub mod config;
pub mod container;
pub mod extractor;
pub mod materializer;
pub mod model;
pub mod registry;
pub mod schema;
pub mod store;
pub mod trigger;

pub use fbxattr_core::{Color, MeshRef, ModelRef, Vec3};

pub use config::PipelineConfig;
pub use container::{Container, ContainerData, ContainerKind, Filter};
pub use extractor::{extract, read_attributes};
pub use materializer::{materialize, ImportContext, MaterializeReport, MaterializeRequest};
pub use model::{MeshComponent, ModelInstance};
pub use registry::{FilterRule, RuleDeclaration, RuleInfo, RuleRegistry, GLOBAL_REGISTRY};
pub use schema::{AttributeField, FieldDescriptor, FieldKind, FieldValue, MeshAttributes};
pub use store::{AssetDatabase, FsAssetDatabase, MemoryAssetDatabase, StoredAsset};
pub use trigger::{ImportTrigger, MaterializeOutcome};
