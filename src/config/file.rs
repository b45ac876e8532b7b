//! Common file handling shared by the configuration file loaders.
//!
//! Loaders own file-existence and permission error handling: a missing file
//! yields an empty tree with the path recorded, a directory or unreadable
//! file fails, and declared default paths merge in order below the explicit
//! path.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::schema::SectionSchema;
use super::tree::ConfigTree;
use super::value::{RawMap, RawValue};
use crate::error::ConfigError;

/// A configuration tree loaded from a file, with its source path recorded.
#[derive(Debug)]
pub struct ConfigFile {
    tree: ConfigTree,
    path: Option<PathBuf>,
}

impl ConfigFile {
    pub(crate) const fn new(tree: ConfigTree, path: Option<PathBuf>) -> Self {
        Self { tree, path }
    }

    /// The loaded configuration tree.
    #[must_use]
    pub const fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Mutable access to the loaded configuration tree.
    pub const fn tree_mut(&mut self) -> &mut ConfigTree {
        &mut self.tree
    }

    /// The source path, `None` when constructed without a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Consume the loader wrapper, keeping only the tree.
    #[must_use]
    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }
}

/// Diagnostic representation: the source file name, empty when pathless.
impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy());
        write!(f, "{}", name.unwrap_or_default())
    }
}

/// Read a configuration file to a string.
///
/// Returns `Ok(None)` when the path does not exist (missing configuration
/// files are not an error), [`ConfigError::NotAFile`] when the path exists
/// but is not a regular file, and [`ConfigError::Io`] when the file cannot
/// be read.
pub(crate) fn read_config_file(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()));
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Load a configuration document through a format parser.
///
/// Default paths merge first, in order, skipping files that do not exist;
/// the explicit `path` merges last and therefore wins. The merged mapping is
/// handed to the tree constructor so defaults, environment overlays and
/// required settings follow the normal priority order.
pub(crate) fn load_document<P>(
    parse: P,
    schema: Arc<SectionSchema>,
    path: Option<&Path>,
    default_paths: &[PathBuf],
) -> Result<ConfigFile, ConfigError>
where
    P: Fn(&str, &Path) -> Result<RawMap, ConfigError>,
{
    let mut merged = RawMap::new();
    let mut seen_file = false;
    for default_path in default_paths {
        if let Some(content) = read_config_file(default_path)? {
            merge_raw(&mut merged, parse(&content, default_path)?);
            seen_file = true;
        }
    }
    if let Some(path) = path {
        if let Some(content) = read_config_file(path)? {
            merge_raw(&mut merged, parse(&content, path)?);
            seen_file = true;
        }
        tracing::debug!(path = %path.display(), "loading configuration file");
    }
    let data = seen_file.then_some(merged);
    let tree = ConfigTree::from_schema_and_data(schema, data)?;
    Ok(ConfigFile::new(tree, path.map(Path::to_path_buf)))
}

/// Deep-merge an overlay mapping into a base mapping.
///
/// Nested mappings merge recursively; any other value in the overlay
/// replaces the base value.
pub(crate) fn merge_raw(base: &mut RawMap, overlay: RawMap) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(RawValue::Object(base_map)), RawValue::Object(overlay_map)) => {
                merge_raw(base_map, overlay_map);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
