//! Configuration tree engine and configuration file loaders.
//!
//! The core of this module is [`ConfigTree`]: it turns arbitrary nested
//! data (mappings, lists, scalars) into a typed, attribute-addressable
//! hierarchical configuration object with default values, environment
//! variable overlays, per-field formatting/validation hooks, pluggable
//! nested-section types and dotted-path insertion.
//!
//! Around the core, the format submodules ([`json`], [`yaml`],
//! [`toml_loader`], [`ini`], [`directory`]) read files into the raw nested
//! mapping the tree consumes and own file-existence and permission error
//! handling. The tree itself never performs I/O; environment variables are
//! read once at construction time.
//!
//! # Examples
//!
//! ```
//! use syskit::config::{ConfigTree, SectionSchema};
//!
//! let schema = SectionSchema::builder()
//!     .default("retries", 3)
//!     .integer_setting("retries")
//!     .required("retries")
//!     .build()?;
//! let mut tree = ConfigTree::from_schema(schema)?;
//! tree.set(tree.root(), "server.host", "localhost")?;
//!
//! assert_eq!(tree.get_integer(tree.root(), "retries"), Some(3));
//! assert_eq!(tree.get_str(tree.root(), "server.host"), Some("localhost"));
//! # Ok::<(), syskit::error::ConfigError>(())
//! ```

mod attributes;
pub mod directory;
pub mod file;
pub mod ini;
pub mod json;
mod schema;
pub mod toml_loader;
mod tree;
mod value;
pub mod yaml;

pub use attributes::is_valid_attribute_name;
pub use directory::ConfigDirectory;
pub use file::ConfigFile;
pub use schema::{
    ChildLoader, FormatFn, ListSchema, ListSchemaBuilder, SchemaBuilder, SectionSchema,
    SetInterceptor, ValidateFn,
};
pub use tree::ConfigTree;
pub use value::{NodeId, RawMap, RawValue, Value};
