//! Asset path utilities
//!
//! Asset paths are project-relative strings with forward slashes, the
//! same shape on every platform.

/// Normalize an asset path
/// - Converts backslashes to forward slashes
/// - Removes redundant separators
/// - Resolves . and .. components
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.trim();

    let mut components = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    components.join("/")
}

/// Split path into directory and filename
pub fn split_path(path: &str) -> (&str, &str) {
    if let Some(pos) = path.rfind('/') {
        (&path[..pos], &path[pos + 1..])
    } else {
        ("", path)
    }
}

/// Filename without its final extension
pub fn file_stem(path: &str) -> &str {
    let (_, name) = split_path(path);

    match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

/// Final extension of the filename, without the dot
pub fn extension(path: &str) -> Option<&str> {
    let (_, name) = split_path(path);

    match name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&name[pos + 1..]),
    }
}

/// Case-insensitive extension check; `ext` may be given with or without the dot
pub fn has_extension(path: &str, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    extension(path).is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Path of the attribute asset generated for a model:
/// `<dir>/<stem><suffix>.<asset_ext>`
pub fn attribute_asset_path(model_path: &str, suffix: &str, asset_ext: &str) -> String {
    let normalized = normalize_path(model_path);
    let (dir, _) = split_path(&normalized);
    let stem = file_stem(&normalized);
    let asset_ext = asset_ext.trim_start_matches('.');

    if dir.is_empty() {
        format!("{stem}{suffix}.{asset_ext}")
    } else {
        format!("{dir}/{stem}{suffix}.{asset_ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("Assets\\Models\\Car.fbx"), "Assets/Models/Car.fbx");
        assert_eq!(normalize_path("Assets//Models/./Car.fbx"), "Assets/Models/Car.fbx");
        assert_eq!(normalize_path("Assets/Props/../Models/Car.fbx"), "Assets/Models/Car.fbx");
    }

    #[test]
    fn test_stem_and_extension() {
        assert_eq!(file_stem("Assets/Models/Car.v2.fbx"), "Car.v2");
        assert_eq!(extension("Assets/Models/Car.FBX"), Some("FBX"));
        assert_eq!(extension("Assets/Models/README"), None);
        assert_eq!(extension("Assets/.hidden"), None);
    }

    #[test]
    fn test_has_extension_is_case_insensitive() {
        assert!(has_extension("Car.fbx", "fbx"));
        assert!(has_extension("Car.FBX", ".fbx"));
        assert!(has_extension("Car.Fbx", "FBX"));
        assert!(!has_extension("Car.obj", "fbx"));
        assert!(!has_extension("fbx", "fbx"));
    }

    #[test]
    fn test_attribute_asset_path() {
        assert_eq!(
            attribute_asset_path("Assets/Models/Car.fbx", "_Attributes", "asset"),
            "Assets/Models/Car_Attributes.asset"
        );
        assert_eq!(
            attribute_asset_path("Car.FBX", "", ".asset"),
            "Car.asset"
        );
        assert_eq!(
            attribute_asset_path("Assets\\Props\\Crate.fbx", "_Meta", "asset"),
            "Assets/Props/Crate_Meta.asset"
        );
    }
}
