//! INI configuration file loading.
//!
//! Hand-rolled parser for the common INI dialect: `[section]` headers,
//! `key = value` pairs, `#` and `;` comments. Section headers may contain
//! dots (`[outer.inner]`) and are routed through the tree's dotted-path
//! insertion, so they nest. Values stay strings; declared coercion sets on
//! the target schema turn them into numbers or paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::file::{ConfigFile, load_document};
use super::schema::SectionSchema;
use super::value::{RawMap, RawValue};
use crate::error::ConfigError;

/// Load an INI configuration file into a tree with the generic schema.
///
/// A missing file yields an empty tree with the path recorded.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the path is not a regular file, cannot be
/// read, or contains entries outside a section or malformed pairs.
pub fn load(path: &Path) -> Result<ConfigFile, ConfigError> {
    load_with_schema(SectionSchema::generic(), Some(path), &[])
}

/// Load an INI configuration file with a schema and default paths.
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

/// Parse INI content into raw nested mapping data.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for entries outside a section, empty
/// headers or lines without a `=` separator.
pub fn parse(content: &str, path: &Path) -> Result<RawMap, ConfigError> {
    let mut map = RawMap::new();
    let mut current: Option<(String, RawMap)> = None;

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(header) = parse_section_header(trimmed) {
            if header.is_empty() {
                return Err(parse_error(path, line_num, "empty section header"));
            }
            if let Some((name, entries)) = current.take() {
                map.insert(name, RawValue::Object(entries));
            }
            current = Some((header, RawMap::new()));
        } else if let Some((ref _name, ref mut entries)) = current {
            let Some((key, value)) = parse_kv_line(trimmed) else {
                return Err(parse_error(
                    path,
                    line_num,
                    &format!("invalid key-value pair: {trimmed}"),
                ));
            };
            entries.insert(key, RawValue::String(value));
        } else {
            return Err(parse_error(
                path,
                line_num,
                &format!("entry outside of section: {trimmed}"),
            ));
        }
    }

    if let Some((name, entries)) = current {
        map.insert(name, RawValue::Object(entries));
    }
    Ok(map)
}

/// Parse a `[header]` line, preserving case and inner dots.
fn parse_section_header(line: &str) -> Option<String> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.trim().to_string())
}

/// Parse a `key = value` line, stripping inline comments from the value.
fn parse_kv_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((
        key.to_string(),
        strip_inline_comment(value.trim()).to_string(),
    ))
}

/// Strip inline comments (`#` preceded by whitespace) from a value.
fn strip_inline_comment(value: &str) -> &str {
    value
        .find(" #")
        .or_else(|| value.find("\t#"))
        .map_or(value, |idx| value.get(..idx).unwrap_or(value).trim_end())
}

fn parse_error(path: &Path, line_num: usize, message: &str) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("line {}: {message}", line_num + 1),
    }
}
