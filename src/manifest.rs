//! Reads the current product version from `package.json` manifests.
use log::*;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{ReleaseError, Result};

const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Deserialize)]
struct PackageJson {
    name: Option<String>,
    version: Option<String>,
    workspaces: Option<serde_json::Value>,
}

/// Version and location of the product package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductManifest {
    pub version: String,
    /// Product directory relative to the base path ("." at the root).
    pub sub_path: PathBuf,
}

fn read_package(path: &Path) -> Result<PackageJson> {
    let content = fs::read_to_string(path).map_err(|err| {
        ReleaseError::manifest(format!("{}: {err}", path.display()))
    })?;

    serde_json::from_str(&content).map_err(|err| {
        ReleaseError::manifest(format!("{}: {err}", path.display()))
    })
}

/// Locate the product manifest under `base_path` and read its version.
///
/// A root manifest that is not the product itself but declares an array of
/// workspaces points at `core_path` for the product.
pub fn load_product_manifest(
    base_path: &Path,
    package_name: &str,
    core_path: &str,
) -> Result<ProductManifest> {
    let root = read_package(&base_path.join(MANIFEST_FILE))?;

    let is_workspace_root = root.name.as_deref() != Some(package_name)
        && matches!(root.workspaces, Some(serde_json::Value::Array(_)));

    let (sub_path, product) = if is_workspace_root {
        let sub_path = PathBuf::from(core_path);
        let product =
            read_package(&base_path.join(&sub_path).join(MANIFEST_FILE))?;
        (sub_path, product)
    } else {
        (PathBuf::from("."), root)
    };

    let version = product.version.ok_or_else(|| {
        ReleaseError::manifest(format!(
            "no version in {}",
            sub_path.join(MANIFEST_FILE).display()
        ))
    })?;

    info!(
        "found product version {version} in {}",
        sub_path.join(MANIFEST_FILE).display()
    );

    Ok(ProductManifest { version, sub_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_root_product_manifest() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name":"ghost","version":"4.48.2","workspaces":["core/*"]}"#,
        )
        .unwrap();

        let manifest =
            load_product_manifest(tmp.path(), "ghost", "ghost/core").unwrap();

        assert_eq!(manifest.version, "4.48.2");
        assert_eq!(manifest.sub_path, PathBuf::from("."));
    }

    #[test]
    fn follows_workspace_root_to_core_package() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name":"ghost-monorepo","workspaces":["ghost/*"]}"#,
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("ghost/core")).unwrap();
        fs::write(
            tmp.path().join("ghost/core/package.json"),
            r#"{"name":"ghost","version":"5.2.0"}"#,
        )
        .unwrap();

        let manifest =
            load_product_manifest(tmp.path(), "ghost", "ghost/core").unwrap();

        assert_eq!(manifest.version, "5.2.0");
        assert_eq!(manifest.sub_path, PathBuf::from("ghost/core"));
    }

    #[test]
    fn non_array_workspaces_stay_at_root() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name":"other","version":"1.0.0","workspaces":{}}"#,
        )
        .unwrap();

        let manifest =
            load_product_manifest(tmp.path(), "ghost", "ghost/core").unwrap();

        assert_eq!(manifest.sub_path, PathBuf::from("."));
    }

    #[test]
    fn missing_manifest_is_a_manifest_error() {
        let tmp = TempDir::new().unwrap();

        let result = load_product_manifest(tmp.path(), "ghost", "ghost/core");

        assert!(matches!(result, Err(ReleaseError::Manifest(_))));
    }

    #[test]
    fn missing_version_is_a_manifest_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"name":"ghost"}"#)
            .unwrap();

        let result = load_product_manifest(tmp.path(), "ghost", "ghost/core");

        assert!(matches!(result, Err(ReleaseError::Manifest(_))));
    }
}
