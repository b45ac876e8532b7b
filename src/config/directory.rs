//! Directory-of-files configuration loading.
//!
//! Loads every recognized file in a directory into one tree: each file
//! becomes a child section named after the file stem, parsed by the loader
//! registered for its extension. Files with unknown extensions are skipped.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::file::read_config_file;
use super::schema::SectionSchema;
use super::tree::ConfigTree;
use super::value::{RawMap, RawValue};
use super::{ini, json, toml_loader, yaml};
use crate::error::ConfigError;

/// File extensions recognized by the directory loader, with their formats.
const EXTENSIONS: &[(&str, Format)] = &[
    ("json", Format::Json),
    ("yaml", Format::Yaml),
    ("yml", Format::Yaml),
    ("toml", Format::Toml),
    ("ini", Format::Ini),
];

#[derive(Debug, Clone, Copy)]
enum Format {
    Json,
    Yaml,
    Toml,
    Ini,
}

/// A configuration tree loaded from a directory of config files.
#[derive(Debug)]
pub struct ConfigDirectory {
    tree: ConfigTree,
    path: PathBuf,
}

impl ConfigDirectory {
    /// The loaded configuration tree, one child section per file.
    #[must_use]
    pub const fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// The source directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the loader wrapper, keeping only the tree.
    #[must_use]
    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }
}

/// Diagnostic representation: the directory name.
impl fmt::Display for ConfigDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        write!(f, "{name}")
    }
}

/// Load every recognized file in `path` with the generic root schema.
///
/// # Errors
///
/// Returns [`ConfigError::NotADirectory`] when the path is missing or not a
/// directory, or any parse/schema error from the contained files.
pub fn load(path: &Path) -> Result<ConfigDirectory, ConfigError> {
    load_with_schema(SectionSchema::generic(), path)
}

/// Load every recognized file in `path` into a tree governed by `schema`.
///
/// Each file becomes a child section named after its stem, resolved through
/// the schema's loader registry; file stems must be legal field names.
/// Files are loaded in name order so the result is deterministic.
///
/// # Errors
///
/// Returns [`ConfigError::NotADirectory`] for an invalid path,
/// [`ConfigError::InvalidAttributeName`] for stems that are not legal field
/// names, or any parse error from the contained files.
pub fn load_with_schema(
    schema: Arc<SectionSchema>,
    path: &Path,
) -> Result<ConfigDirectory, ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut tree = ConfigTree::from_schema(schema)?;
    for file in files {
        let Some(format) = format_for(&file) else {
            tracing::debug!(path = %file.display(), "skipping unrecognized file");
            continue;
        };
        let Some(stem) = file.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        let Some(content) = read_config_file(&file)? else {
            continue;
        };
        let data = parse_with(format, &content, &file)?;
        let root = tree.root();
        tree.load_section(root, &stem, RawValue::Object(data), None)?;
    }
    Ok(ConfigDirectory {
        tree,
        path: path.to_path_buf(),
    })
}

fn format_for(path: &Path) -> Option<Format> {
    let extension = path.extension()?.to_str()?;
    EXTENSIONS
        .iter()
        .find(|(ext, _)| extension.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
}

fn parse_with(format: Format, content: &str, path: &Path) -> Result<RawMap, ConfigError> {
    match format {
        Format::Json => json::parse(content, path),
        Format::Yaml => yaml::parse(content, path),
        Format::Toml => toml_loader::parse(content, path),
        Format::Ini => ini::parse(content, path),
    }
}
