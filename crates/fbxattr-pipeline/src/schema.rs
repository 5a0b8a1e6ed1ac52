//! Attribute record schemas
//!
//! A record type lists the FBX properties it collects. Each field is bound to
//! a property name and declares its [`FieldKind`], which decides how the
//! property value is read from the scene.
//!
//! Record types are normally declared with [`mesh_attributes!`], enumerations
//! with [`attribute_enum!`]:
//!
//! ```rust,ignore
//! fbxattr_pipeline::attribute_enum! {
//!     pub enum Surface { Metal, Wood, Glass }
//! }
//!
//! fbxattr_pipeline::mesh_attributes! {
//!     pub struct PropAttributes {
//!         "surface" => pub surface: Surface,
//!         "mass" => pub mass: f32,
//!         "tint" => pub tint: Color,
//!     }
//! }
//! ```
//!
//! The generated struct also carries the bound `mesh` and its `materials`.
//! It derives `serde` traits, so the declaring crate must depend on `serde`.
//!
//! [`mesh_attributes!`]: crate::mesh_attributes
//! [`attribute_enum!`]: crate::attribute_enum

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use fbxattr_core::{Color, MeshRef, Vec3};

/// How a field's value is read from an FBX property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    Int,
    String,
    /// Read as double when stored as double, as float otherwise
    Float,
    /// Four channels, alpha defaults to 1
    Color,
    Vector3,
    /// Integer index into the enumeration
    Enum,
    /// No FBX mapping; the field keeps its default
    Unsupported,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::String => "string",
            FieldKind::Float => "float",
            FieldKind::Color => "color",
            FieldKind::Vector3 => "vector3",
            FieldKind::Enum => "enum",
            FieldKind::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value read from the scene, ready to assign to a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    String(String),
    Float(f32),
    Color(Color),
    Vector3(Vec3),
}

/// Static description of one schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// FBX property name
    pub name: &'static str,
    pub kind: FieldKind,
}

/// A Rust type usable as a schema field
pub trait AttributeField {
    const KIND: FieldKind;

    /// Store `value`; returns `false` and leaves the field untouched when the
    /// value does not fit
    fn assign(&mut self, value: FieldValue) -> bool;
}

macro_rules! impl_attribute_field {
    ($($ty:ty => $kind:ident($variant:ident)),* $(,)?) => {
        $(
            impl AttributeField for $ty {
                const KIND: FieldKind = FieldKind::$kind;

                fn assign(&mut self, value: FieldValue) -> bool {
                    match value {
                        FieldValue::$variant(v) => {
                            *self = v;
                            true
                        }
                        _ => false,
                    }
                }
            }
        )*
    };
}

impl_attribute_field! {
    bool => Bool(Bool),
    i32 => Int(Int),
    String => String(String),
    f32 => Float(Float),
    Color => Color(Color),
    Vec3 => Vector3(Vector3),
}

macro_rules! impl_unsupported_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AttributeField for $ty {
                const KIND: FieldKind = FieldKind::Unsupported;

                fn assign(&mut self, _value: FieldValue) -> bool {
                    false
                }
            }
        )*
    };
}

impl_unsupported_field!(f64, i64, u32, u64);

/// A per-mesh attribute record
pub trait MeshAttributes: Default + Clone + Debug + Serialize + DeserializeOwned + 'static {
    /// Declared fields in declaration order
    fn fields() -> &'static [FieldDescriptor];

    /// Assign the field bound to property `name`
    fn set_field(&mut self, name: &str, value: FieldValue) -> bool;

    fn mesh(&self) -> Option<&MeshRef>;

    fn materials(&self) -> &[String];

    /// Attach the record to a mesh and its material names
    fn bind_mesh(&mut self, mesh: MeshRef, materials: Vec<String>);
}

/// Declare an attribute record type
///
/// Fields are written `"propertyName" => vis name: Type`. See the
/// [module documentation](crate::schema).
#[macro_export]
macro_rules! mesh_attributes {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $prop:literal => $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            /// Mesh this record was extracted for
            pub mesh: ::core::option::Option<$crate::MeshRef>,
            /// Material names of the mesh
            pub materials: ::std::vec::Vec<::std::string::String>,
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::schema::MeshAttributes for $name {
            fn fields() -> &'static [$crate::schema::FieldDescriptor] {
                const FIELDS: &[$crate::schema::FieldDescriptor] = &[
                    $(
                        $crate::schema::FieldDescriptor {
                            name: $prop,
                            kind: <$ty as $crate::schema::AttributeField>::KIND,
                        },
                    )*
                ];
                FIELDS
            }

            #[allow(unused_variables)]
            fn set_field(&mut self, name: &str, value: $crate::schema::FieldValue) -> bool {
                match name {
                    $( $prop => $crate::schema::AttributeField::assign(&mut self.$field, value), )*
                    _ => false,
                }
            }

            fn mesh(&self) -> ::core::option::Option<&$crate::MeshRef> {
                self.mesh.as_ref()
            }

            fn materials(&self) -> &[::std::string::String] {
                &self.materials
            }

            fn bind_mesh(
                &mut self,
                mesh: $crate::MeshRef,
                materials: ::std::vec::Vec<::std::string::String>,
            ) {
                self.mesh = ::core::option::Option::Some(mesh);
                self.materials = materials;
            }
        }
    };
}

/// Declare an enumeration readable from an integer FBX property
///
/// Variants are numbered from 0 in declaration order; the first one is the
/// default.
#[macro_export]
macro_rules! attribute_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident $(, $variant:ident)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[repr(i32)]
        $vis enum $name {
            #[default]
            $first,
            $( $variant, )*
        }

        impl $name {
            pub const VARIANTS: &'static [$name] = &[$name::$first, $( $name::$variant, )*];

            /// Variant at `index`, if in range
            pub fn from_index(index: i32) -> ::core::option::Option<Self> {
                usize::try_from(index)
                    .ok()
                    .and_then(|i| Self::VARIANTS.get(i).copied())
            }

            pub fn index(self) -> i32 {
                self as i32
            }
        }

        impl $crate::schema::AttributeField for $name {
            const KIND: $crate::schema::FieldKind = $crate::schema::FieldKind::Enum;

            fn assign(&mut self, value: $crate::schema::FieldValue) -> bool {
                match value {
                    $crate::schema::FieldValue::Int(index) => match Self::from_index(index) {
                        ::core::option::Option::Some(variant) => {
                            *self = variant;
                            true
                        }
                        ::core::option::Option::None => false,
                    },
                    _ => false,
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::attribute_enum! {
        pub enum Finish { Matte, Gloss, Chrome }
    }

    crate::mesh_attributes! {
        pub struct TestAttributes {
            "finish" => pub finish: Finish,
            "label" => pub label: String,
            "count" => pub count: i32,
            "weight" => pub weight: f32,
            "tint" => pub tint: Color,
            "offset" => pub offset: Vec3,
            "visible" => pub visible: bool,
            "precise" => pub precise: f64,
        }
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let kinds: Vec<_> = TestAttributes::fields().iter().map(|f| (f.name, f.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("finish", FieldKind::Enum),
                ("label", FieldKind::String),
                ("count", FieldKind::Int),
                ("weight", FieldKind::Float),
                ("tint", FieldKind::Color),
                ("offset", FieldKind::Vector3),
                ("visible", FieldKind::Bool),
                ("precise", FieldKind::Unsupported),
            ]
        );
    }

    #[test]
    fn test_set_field() {
        let mut record = TestAttributes::default();

        assert!(record.set_field("count", FieldValue::Int(7)));
        assert!(record.set_field("finish", FieldValue::Int(2)));
        assert!(record.set_field("tint", FieldValue::Color(Color::WHITE)));
        assert_eq!(record.count, 7);
        assert_eq!(record.finish, Finish::Chrome);
        assert_eq!(record.tint, Color::WHITE);

        // wrong value type, unknown name, unsupported kind
        assert!(!record.set_field("count", FieldValue::Float(1.0)));
        assert!(!record.set_field("missing", FieldValue::Int(1)));
        assert!(!record.set_field("precise", FieldValue::Float(1.0)));
        assert_eq!(record.count, 7);
        assert_eq!(record.precise, 0.0);
    }

    #[test]
    fn test_enum_out_of_range_keeps_value() {
        let mut finish = Finish::Gloss;
        assert!(!finish.assign(FieldValue::Int(5)));
        assert!(!finish.assign(FieldValue::Int(-1)));
        assert_eq!(finish, Finish::Gloss);
        assert_eq!(Finish::from_index(0), Some(Finish::Matte));
        assert_eq!(Finish::Chrome.index(), 2);
    }

    #[test]
    fn test_bind_mesh() {
        let mut record = TestAttributes::default();
        assert!(record.mesh().is_none());

        record.bind_mesh(MeshRef::new("Wheel", "Models/Car.fbx"), vec!["Rubber".into()]);
        assert_eq!(record.mesh().map(|m| m.name.as_str()), Some("Wheel"));
        assert_eq!(record.materials(), ["Rubber".to_string()]);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let record: TestAttributes = serde_json::from_str(r#"{"count": 3}"#).unwrap();
        assert_eq!(record.count, 3);
        assert_eq!(record.finish, Finish::Matte);
        assert!(record.mesh.is_none());
    }
}
