//! Asset database seam
//!
//! The pipeline loads models and persists containers through
//! [`AssetDatabase`]. [`FsAssetDatabase`] stores assets as JSON files below a
//! project directory; [`MemoryAssetDatabase`] keeps everything in memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fbxattr_core::path::normalize_path;
use fbxattr_core::{Error, Result};
use fbxattr_parsers::{FbxSceneReader, SceneReader};

use crate::container::Container;
use crate::model::ModelInstance;

/// On-disk envelope of an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAsset {
    /// Asset category, e.g. [`StoredAsset::CONTAINER_TYPE`]
    pub asset_type: String,
    /// Container type name for container assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl StoredAsset {
    pub const CONTAINER_TYPE: &'static str = "AttributeContainer";

    /// Wrap a container for storage
    pub fn from_container<C: Container>(container: &C) -> Result<Self> {
        Ok(Self {
            asset_type: Self::CONTAINER_TYPE.to_string(),
            container: Some(C::TYPE_NAME.to_string()),
            data: serde_json::to_value(container)?,
        })
    }

    /// Any asset that is not an attribute container
    pub fn other(asset_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            asset_type: asset_type.into(),
            container: None,
            data,
        }
    }

    /// Container type name, if this is an attribute container
    pub fn container_type(&self) -> Option<&str> {
        if self.asset_type == Self::CONTAINER_TYPE {
            self.container.as_deref()
        } else {
            None
        }
    }

    pub fn is_container_of(&self, type_name: &str) -> bool {
        self.container_type() == Some(type_name)
    }

    /// Decode the stored container
    pub fn decode<C: Container>(&self) -> Result<C> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Access to imported models and persisted assets
pub trait AssetDatabase {
    /// Resolve the imported model at `path`
    fn load_model(&self, path: &str) -> Result<ModelInstance>;

    fn asset_exists(&self, path: &str) -> bool;

    fn load_asset(&self, path: &str) -> Result<StoredAsset>;

    /// Persist a new asset; fails if the path is taken
    fn create_asset(&mut self, path: &str, asset: StoredAsset) -> Result<()>;

    /// Overwrite an existing asset
    fn save_asset(&mut self, path: &str, asset: StoredAsset) -> Result<()>;

    /// Force a re-import of the asset at `path`
    fn reimport(&mut self, path: &str) -> Result<()>;
}

/// Asset database backed by a project directory
#[derive(Debug)]
pub struct FsAssetDatabase {
    root: PathBuf,
    pretty_json: bool,
    scenes: FbxSceneReader,
}

impl FsAssetDatabase {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            scenes: FbxSceneReader::new(root.clone()),
            root,
            pretty_json: true,
        }
    }

    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(normalize_path(path))
    }

    fn write(&self, path: &str, asset: &StoredAsset, create: bool) -> Result<()> {
        let full_path = self.full_path(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = if self.pretty_json {
            serde_json::to_string_pretty(asset)?
        } else {
            serde_json::to_string(asset)?
        };

        let mut options = fs::OpenOptions::new();
        options.write(true);
        if create {
            options.create_new(true);
        } else {
            options.truncate(true);
        }

        let mut file = options.open(&full_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::AssetNotFound { path: path.to_string() },
            _ => Error::Io(e),
        })?;
        std::io::Write::write_all(&mut file, json.as_bytes())?;

        tracing::debug!(path, bytes = json.len(), "Wrote asset");
        Ok(())
    }
}

impl AssetDatabase for FsAssetDatabase {
    fn load_model(&self, path: &str) -> Result<ModelInstance> {
        let full_path = self.full_path(path);
        if !full_path.is_file() {
            return Err(Error::ModelNotFound { path: path.to_string() });
        }

        let scene = self
            .scenes
            .read_scene(&normalize_path(path))
            .map_err(|e| Error::scene_read(path, e))?;
        Ok(ModelInstance::from_scene(normalize_path(path), &scene))
    }

    fn asset_exists(&self, path: &str) -> bool {
        self.full_path(path).exists()
    }

    fn load_asset(&self, path: &str) -> Result<StoredAsset> {
        let full_path = self.full_path(path);
        let text = fs::read_to_string(&full_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::AssetNotFound { path: path.to_string() },
            _ => Error::Io(e),
        })?;

        Ok(serde_json::from_str(&text)?)
    }

    fn create_asset(&mut self, path: &str, asset: StoredAsset) -> Result<()> {
        self.write(path, &asset, true)
    }

    fn save_asset(&mut self, path: &str, asset: StoredAsset) -> Result<()> {
        self.write(path, &asset, false)
    }

    fn reimport(&mut self, path: &str) -> Result<()> {
        let asset = self.load_asset(path)?;
        tracing::info!(path, asset_type = %asset.asset_type, "Re-imported asset");
        Ok(())
    }
}

/// Asset database held in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryAssetDatabase {
    models: HashMap<String, ModelInstance>,
    assets: HashMap<String, StoredAsset>,
    reimports: Vec<String>,
}

impl MemoryAssetDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_model(&mut self, model: ModelInstance) {
        self.models.insert(model.path.clone(), model);
    }

    pub fn with_model(mut self, model: ModelInstance) -> Self {
        self.insert_model(model);
        self
    }

    pub fn insert_asset(&mut self, path: impl Into<String>, asset: StoredAsset) {
        self.assets.insert(path.into(), asset);
    }

    pub fn asset(&self, path: &str) -> Option<&StoredAsset> {
        self.assets.get(path)
    }

    /// Paths passed to [`AssetDatabase::reimport`], in call order
    pub fn reimports(&self) -> &[String] {
        &self.reimports
    }
}

impl AssetDatabase for MemoryAssetDatabase {
    fn load_model(&self, path: &str) -> Result<ModelInstance> {
        self.models
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ModelNotFound { path: path.to_string() })
    }

    fn asset_exists(&self, path: &str) -> bool {
        self.assets.contains_key(path)
    }

    fn load_asset(&self, path: &str) -> Result<StoredAsset> {
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| Error::AssetNotFound { path: path.to_string() })
    }

    fn create_asset(&mut self, path: &str, asset: StoredAsset) -> Result<()> {
        if self.assets.contains_key(path) {
            return Err(Error::invalid_data(format!("asset already exists: {path}")));
        }
        self.assets.insert(path.to_string(), asset);
        Ok(())
    }

    fn save_asset(&mut self, path: &str, asset: StoredAsset) -> Result<()> {
        match self.assets.get_mut(path) {
            Some(existing) => {
                *existing = asset;
                Ok(())
            }
            None => Err(Error::AssetNotFound { path: path.to_string() }),
        }
    }

    fn reimport(&mut self, path: &str) -> Result<()> {
        if !self.assets.contains_key(path) {
            return Err(Error::AssetNotFound { path: path.to_string() });
        }
        self.reimports.push(path.to_string());
        Ok(())
    }
}
