//! Container materialization
//!
//! Creates or refreshes the container asset for one (model, rule) pair:
//!
//! 1. resolve the imported model
//! 2. load the container at the target path, or start from the default
//! 3. extract records from the model's scene
//! 4. replace the record list, persist and re-import
//! 5. run the container's post-import hook
//!
//! Nothing is persisted unless every earlier step succeeded.

use serde::Serialize;

use fbxattr_core::path::file_stem;
use fbxattr_core::{Error, Result, ResultExt};
use fbxattr_parsers::SceneReader;

use crate::container::{Container, ContainerKind};
use crate::extractor::read_attributes;
use crate::registry::RuleRegistry;
use crate::store::{AssetDatabase, StoredAsset};

/// Hosts the pipeline runs against
pub struct ImportContext<'a> {
    pub database: &'a mut dyn AssetDatabase,
    pub scenes: &'a dyn SceneReader,
}

impl<'a> ImportContext<'a> {
    pub fn new(database: &'a mut dyn AssetDatabase, scenes: &'a dyn SceneReader) -> Self {
        Self { database, scenes }
    }
}

/// One scheduled container generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeRequest {
    /// Project-relative path of the imported model
    pub model_path: String,
    /// Path of the container asset to create or refresh
    pub target_path: String,
    pub kind: ContainerKind,
}

impl MaterializeRequest {
    pub fn new(model_path: impl Into<String>, target_path: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            model_path: model_path.into(),
            target_path: target_path.into(),
            kind,
        }
    }

    /// Run the materializer for the target
    ///
    /// A target that already holds a container of another registered type is
    /// refreshed as that type, with its own record type.
    pub fn run(&self, ctx: &mut ImportContext<'_>, registry: &RuleRegistry) -> Result<MaterializeReport> {
        let kind = self.target_kind(&*ctx.database, registry)?;
        kind.materialize(ctx, self)
    }

    fn target_kind(&self, database: &dyn AssetDatabase, registry: &RuleRegistry) -> Result<ContainerKind> {
        if !database.asset_exists(&self.target_path) {
            return Ok(self.kind);
        }

        // load failures and foreign assets are reported by the materializer
        let Ok(asset) = database.load_asset(&self.target_path) else {
            return Ok(self.kind);
        };
        let Some(stored) = asset.container_type() else {
            return Ok(self.kind);
        };
        if stored == self.kind.type_name() {
            return Ok(self.kind);
        }

        match registry.kind_by_name(stored) {
            Some(kind) => {
                tracing::info!(
                    target = %self.target_path,
                    requested = self.kind.type_name(),
                    stored,
                    "Refreshing existing container with its own type"
                );
                Ok(kind)
            }
            None => {
                tracing::warn!(target = %self.target_path, stored, "Existing container type is not registered");
                Err(Error::Conflict {
                    path: self.target_path.clone(),
                    model: file_stem(&self.model_path).to_string(),
                })
            }
        }
    }
}

/// Result of a successful materialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub target: String,
    pub container: &'static str,
    pub records: usize,
    /// Whether the asset was newly created
    pub created: bool,
}

/// Materialize the container of type `C` described by `request`
pub fn materialize<C: Container>(
    ctx: &mut ImportContext<'_>,
    request: &MaterializeRequest,
) -> Result<MaterializeReport> {
    let span = tracing::info_span!(
        "materialize",
        container = C::TYPE_NAME,
        target = %request.target_path
    );
    let _guard = span.enter();

    let model = ctx
        .database
        .load_model(&request.model_path)
        .with_context(|| format!("loading model {}", request.model_path))?;

    let exists = ctx.database.asset_exists(&request.target_path);
    let mut container = if exists {
        load_existing::<C>(&*ctx.database, &request.target_path, &model.name)?
    } else {
        C::default()
    };

    container.data_mut().source = Some(model.model_ref());

    let records = read_attributes::<C::Record>(&model, &request.model_path, ctx.scenes)?;
    let count = records.len();
    container.data_mut().records = records;

    let stored = StoredAsset::from_container(&container)?;
    if exists {
        ctx.database.save_asset(&request.target_path, stored)?;
    } else {
        ctx.database.create_asset(&request.target_path, stored)?;
    }
    ctx.database.reimport(&request.target_path)?;

    container.on_post_import();

    tracing::info!(records = count, created = !exists, "Materialized container");

    Ok(MaterializeReport {
        target: request.target_path.clone(),
        container: C::TYPE_NAME,
        records: count,
        created: !exists,
    })
}

/// Load the asset at `path` as a `C`; anything else there is a conflict
///
/// [`MaterializeRequest::run`] has already redirected targets holding
/// another registered container type.
fn load_existing<C: Container>(
    database: &dyn AssetDatabase,
    path: &str,
    model_name: &str,
) -> Result<C> {
    let conflict = || Error::Conflict {
        path: path.to_string(),
        model: model_name.to_string(),
    };

    let asset = match database.load_asset(path) {
        Ok(asset) => asset,
        Err(e) => {
            tracing::warn!(path, error = %e, "Existing asset could not be loaded");
            return Err(conflict());
        }
    };

    if !asset.is_container_of(C::TYPE_NAME) {
        tracing::warn!(
            path,
            asset_type = %asset.asset_type,
            container = ?asset.container,
            "Existing asset has a different type"
        );
        return Err(conflict());
    }

    asset.decode::<C>().map_err(|e| {
        tracing::warn!(path, error = %e, "Existing container could not be decoded");
        conflict()
    })
}
