//! JSON configuration file loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::file::{ConfigFile, load_document};
use super::schema::SectionSchema;
use super::value::{RawMap, RawValue};
use crate::error::ConfigError;

/// Load a JSON configuration file into a tree with the generic schema.
///
/// A missing file yields an empty tree with the path recorded.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the path is not a regular file, cannot be
/// read, or does not parse as a top-level JSON object.
pub fn load(path: &Path) -> Result<ConfigFile, ConfigError> {
    load_with_schema(SectionSchema::generic(), Some(path), &[])
}

/// Load a JSON configuration file with a schema and default paths.
///
/// Default paths merge first, in order, skipping missing files; the
/// explicit `path` merges last and wins.
///
/// # Errors
///
/// Returns a [`ConfigError`] for unreadable or unparseable files, or for
/// schema violations in the merged data.
pub fn load_with_schema(
    schema: Arc<SectionSchema>,
    path: Option<&Path>,
    default_paths: &[PathBuf],
) -> Result<ConfigFile, ConfigError> {
    load_document(parse, schema, path, default_paths)
}

pub(crate) fn parse(content: &str, path: &Path) -> Result<RawMap, ConfigError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(RawMap::new());
    }
    let value: RawValue =
        serde_json::from_str(trimmed).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
    match value {
        RawValue::Object(map) => Ok(map),
        RawValue::Null => Ok(RawMap::new()),
        other => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: format!("expected a top-level object, found {other}"),
        }),
    }
}
