//! Scene reading seam
//!
//! The import pipeline opens model files through [`SceneReader`] so hosts can
//! serve scenes from disk or from memory.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::Scene;
use crate::logging::instrument_parse;
use crate::traits::{ParseError, ParseResult};

/// Name used in parse logs and spans
const PARSER_NAME: &str = "fbx";

/// Opens model files by asset path and returns their scene graph
pub trait SceneReader {
    /// Read the scene stored at `path`, relative to the reader's root
    fn read_scene(&self, path: &str) -> ParseResult<Scene>;
}

/// Reads binary FBX files below a project directory
#[derive(Debug, Default, Clone)]
pub struct FbxSceneReader {
    root: PathBuf,
}

impl FbxSceneReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, full_path: &Path) -> ParseResult<Scene> {
        let file = File::open(full_path)?;
        let fbx = super::read(BufReader::new(file))?;
        tracing::debug!(version = super::raw_version(fbx.version), "FBX header read");
        Ok(Scene::from_document(&fbx.document))
    }
}

impl SceneReader for FbxSceneReader {
    fn read_scene(&self, path: &str) -> ParseResult<Scene> {
        let full_path = self.root.join(path);
        crate::log_parse_start!(PARSER_NAME, full_path);

        let start = std::time::Instant::now();
        let result = instrument_parse(PARSER_NAME, || self.load(&full_path));

        match result {
            Ok(scene) => {
                crate::log_parse_complete!(PARSER_NAME, start.elapsed(), scene.len());
                Ok(scene)
            }
            Err(e) => {
                crate::log_parse_error!(PARSER_NAME, e);
                Err(e.with_context(format!("reading scene {}", full_path.display())))
            }
        }
    }
}

/// Serves prepared scenes by path
#[derive(Debug, Default, Clone)]
pub struct MemorySceneReader {
    scenes: HashMap<String, Scene>,
}

impl MemorySceneReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, scene: Scene) {
        self.scenes.insert(path.into(), scene);
    }

    pub fn with_scene(mut self, path: impl Into<String>, scene: Scene) -> Self {
        self.insert(path, scene);
        self
    }
}

impl SceneReader for MemorySceneReader {
    fn read_scene(&self, path: &str) -> ParseResult<Scene> {
        self.scenes.get(path).cloned().ok_or_else(|| {
            ParseError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no scene for {path}"),
            ))
        })
    }
}
