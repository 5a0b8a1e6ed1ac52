//! Attribute containers
//!
//! A container is the persisted asset generated next to a model. It holds the
//! source model and one record per matched mesh, plus any fields its author
//! adds. The [`Container`] trait marks a type as eligible for generation and
//! carries its filter declarations.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use fbxattr_core::{ModelRef, Result};

use crate::materializer::{materialize, ImportContext, MaterializeReport, MaterializeRequest};
use crate::schema::MeshAttributes;

/// Generated state shared by every container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerData<R> {
    /// Model the records were extracted from
    pub source: Option<ModelRef>,
    /// One record per matched mesh, in scene pre-order
    pub records: Vec<R>,
}

impl<R> Default for ContainerData<R> {
    fn default() -> Self {
        Self {
            source: None,
            records: Vec::new(),
        }
    }
}

/// Filter declaration attached to a container type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    /// Regular expression searched for in the model name
    pub pattern: &'static str,
    /// Appended to the model's file stem to name the container asset
    pub suffix: &'static str,
}

impl Filter {
    pub const fn new(pattern: &'static str, suffix: &'static str) -> Self {
        Self { pattern, suffix }
    }
}

/// A persisted attribute container
///
/// ```rust,ignore
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// pub struct PropContainer {
///     #[serde(flatten)]
///     pub data: ContainerData<PropAttributes>,
///     pub notes: String,
/// }
///
/// impl Container for PropContainer {
///     type Record = PropAttributes;
///     const TYPE_NAME: &'static str = "PropContainer";
///     const FILTERS: &'static [Filter] = &[Filter::new("^SM_", "_Attributes")];
///
///     fn data(&self) -> &ContainerData<PropAttributes> { &self.data }
///     fn data_mut(&mut self) -> &mut ContainerData<PropAttributes> { &mut self.data }
/// }
/// ```
pub trait Container: Default + Serialize + DeserializeOwned + 'static {
    type Record: MeshAttributes;

    /// Stable name stored with the asset; identifies the type on reload
    const TYPE_NAME: &'static str;

    /// Filters registered by [`RuleRegistry::register_container`]
    ///
    /// [`RuleRegistry::register_container`]: crate::RuleRegistry::register_container
    const FILTERS: &'static [Filter] = &[];

    fn data(&self) -> &ContainerData<Self::Record>;

    fn data_mut(&mut self) -> &mut ContainerData<Self::Record>;

    /// Called after the container has been saved and re-imported
    fn on_post_import(&mut self) {}
}

/// Entry point that materializes one container type
pub type MaterializeFn =
    fn(&mut ImportContext<'_>, &MaterializeRequest) -> Result<MaterializeReport>;

/// Runtime handle for a container type
#[derive(Clone, Copy)]
pub struct ContainerKind {
    type_name: &'static str,
    record_name: &'static str,
    materialize: MaterializeFn,
}

impl ContainerKind {
    pub fn of<C: Container>() -> Self {
        Self {
            type_name: C::TYPE_NAME,
            record_name: std::any::type_name::<C::Record>(),
            materialize: materialize::<C>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn record_name(&self) -> &'static str {
        self.record_name
    }

    /// Run the materializer of this container type
    pub fn materialize(
        &self,
        ctx: &mut ImportContext<'_>,
        request: &MaterializeRequest,
    ) -> Result<MaterializeReport> {
        (self.materialize)(ctx, request)
    }
}

impl std::fmt::Debug for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerKind")
            .field("type_name", &self.type_name)
            .field("record_name", &self.record_name)
            .finish()
    }
}

impl PartialEq for ContainerKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for ContainerKind {}
