// fbxattr-parsers/src/fbx/mod.rs
//! Binary FBX documents
//!
//! Files are loaded with `fbxcel-dom`, which decodes the node records and
//! indexes the `Objects` and `Connections` sections. [`Scene`] adapts that
//! object graph to the model hierarchy the import pipeline works on.
//!
//! # Record Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  FBXHeaderExtension   FBXHeaderVersion, FBXVersion          │
//! │  Definitions          object type templates                 │
//! │  Objects                                                    │
//! │    Model    (id, "Name\0\x01Model", "Mesh" | "Null")        │
//! │      Properties70                                           │
//! │        P    (name, type, label, flags, values...)           │
//! │    Geometry (id, "Name\0\x01Geometry", "Mesh")              │
//! │    Material (id, "Name\0\x01Material", "")                  │
//! │  Connections                                                │
//! │    C        ("OO", child id, parent id)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod reader;
mod scene;
mod writer;

pub use fbxcel::low::FbxVersion;
pub use fbxcel_dom::v7400::Document;
pub use reader::{FbxSceneReader, MemorySceneReader, SceneReader};
pub use scene::{NodeId, Property, PropertyValue, Scene, SceneNode, ROOT_NODE_NAME};
pub use writer::SceneWriter;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use fbxcel::low::v7400::AttributeValue;
use fbxcel_dom::any::AnyDocument;
use serde::Serialize;

use crate::traits::{ParseError, ParseResult};

/// File extension of binary FBX models
pub const FBX_EXTENSION: &str = "fbx";

/// A loaded FBX document and the version stored in its header
pub struct FbxFile {
    pub version: FbxVersion,
    pub document: Box<Document>,
}

impl std::fmt::Debug for FbxFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FbxFile")
            .field("version", &raw_version(self.version))
            .finish_non_exhaustive()
    }
}

/// Raw header value of `version` (e.g. `7400` for FBX 7.4)
///
/// `FbxVersion::raw` is not public in fbxcel 0.9, so rebuild it from the
/// public major/minor accessors.
pub const fn raw_version(version: FbxVersion) -> u32 {
    version.major() * 1000 + version.minor() * 100
}

/// Load a binary FBX document
pub fn read<R: Read + Seek>(reader: R) -> ParseResult<FbxFile> {
    match AnyDocument::from_seekable_reader(reader) {
        Ok(AnyDocument::V7400(version, document)) => {
            tracing::trace!(version = raw_version(version), "Loaded FBX document");
            Ok(FbxFile { version, document })
        }
        Ok(_) => Err(ParseError::UnsupportedFormat(
            "FBX version without a document model".to_string(),
        )),
        Err(e) => Err(ParseError::Load(e.to_string())),
    }
}

/// Load the binary FBX document at `path`
pub fn open(path: &Path) -> ParseResult<FbxFile> {
    let file = File::open(path)?;
    read(BufReader::new(file)).map_err(|e| e.with_context(format!("loading {}", path.display())))
}

/// One node record of a document, flattened with its nesting depth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    pub depth: usize,
    pub name: String,
    pub attributes: Vec<String>,
}

/// Every node record in file order
pub fn records(document: &Document) -> Vec<RecordSummary> {
    let mut out = Vec::new();
    let mut stack: Vec<_> = document.tree().root().children().map(|n| (n, 0)).collect();
    stack.reverse();

    while let Some((node, depth)) = stack.pop() {
        out.push(RecordSummary {
            depth,
            name: node.name().to_string(),
            attributes: node.attributes().iter().map(describe_attribute).collect(),
        });

        let first_child = stack.len();
        stack.extend(node.children().map(|child| (child, depth + 1)));
        stack[first_child..].reverse();
    }

    out
}

/// Indented record listing, one record per line
pub fn dump_records(document: &Document) -> String {
    let mut out = String::new();
    for record in records(document) {
        out.push_str(&"  ".repeat(record.depth));
        out.push_str(&record.name);
        out.push_str(&format!(" [{}]\n", record.attributes.join(", ")));
    }
    out
}

fn describe_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Bool(v) => v.to_string(),
        AttributeValue::I16(v) => v.to_string(),
        AttributeValue::I32(v) => v.to_string(),
        AttributeValue::I64(v) => v.to_string(),
        AttributeValue::F32(v) => v.to_string(),
        AttributeValue::F64(v) => v.to_string(),
        AttributeValue::String(s) => format!("{:?}", s),
        AttributeValue::ArrBool(a) => format!("[bool; {}]", a.len()),
        AttributeValue::ArrI32(a) => format!("[i32; {}]", a.len()),
        AttributeValue::ArrI64(a) => format!("[i64; {}]", a.len()),
        AttributeValue::ArrF32(a) => format!("[f32; {}]", a.len()),
        AttributeValue::ArrF64(a) => format!("[f64; {}]", a.len()),
        AttributeValue::Binary(b) => format!("<{} bytes>", b.len()),
    }
}
