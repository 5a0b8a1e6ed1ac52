//! Common types used across fbxattr
//!
//! This module provides the value types stored in attribute records and
//! the references that tie a record back to its imported model and mesh.

use serde::{Deserialize, Serialize};

/// 3D vector (position, direction, scale, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Narrow a double-precision triple as stored in FBX files
    pub fn from_f64(values: [f64; 3]) -> Self {
        Self {
            x: values[0] as f32,
            y: values[1] as f32,
            z: values[2] as f32,
        }
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(value: [f32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

/// Linear RGBA color with floating-point channels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Transparent black, the zero value of a color field
    pub const CLEAR: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Narrow a double-precision RGBA quadruple as stored in FBX files
    pub fn from_f64(channels: [f64; 4]) -> Self {
        Self {
            r: channels[0] as f32,
            g: channels[1] as f32,
            b: channels[2] as f32,
            a: channels[3] as f32,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::CLEAR
    }
}

/// Reference to an imported model asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef {
    /// Project-relative path of the model file
    pub path: String,
    /// Name of the model's root object
    pub name: String,
}

impl ModelRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// Reference to a mesh resource living inside an imported model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshRef {
    /// Mesh name, unique within its model
    pub name: String,
    /// Project-relative path of the model that owns the mesh
    pub model: String,
}

impl MeshRef {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

impl std::fmt::Display for MeshRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.model, self.name)
    }
}
