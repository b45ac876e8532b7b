//! The configuration tree: typed, attribute-addressable nested data.
//!
//! A [`ConfigTree`] owns every node of one configuration hierarchy in an
//! arena. Nodes are sections (named fields) or lists (ordered items),
//! addressed through [`NodeId`] handles; parent references are fixed at
//! construction and the tree root is always the first arena slot, so root
//! lookups never walk the parent chain.
//!
//! Construction follows a fixed priority order: schema defaults, then
//! environment variable overlays, then explicit data, then required-setting
//! validation. All mutation goes through [`ConfigTree::set`] and the list
//! operations; failures abort the operation in progress without rolling back
//! fields that were already assigned.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::attributes::validate_attribute_name;
use super::schema::{ChildLoader, ListSchema, SectionSchema};
use super::value::{
    NodeId, RawMap, RawValue, Value, coerce_float, coerce_integer, coerce_path, scalar_from_raw,
    scalar_to_raw,
};
use crate::error::ConfigError;

const ROOT: NodeId = NodeId(0);

struct SectionNode {
    name: Option<String>,
    schema: Arc<SectionSchema>,
    entries: Vec<(String, Value)>,
}

struct ListNode {
    name: Option<String>,
    schema: Arc<ListSchema>,
    /// Schema of the owning section, used to expand mapping items.
    owner_schema: Arc<SectionSchema>,
    items: Vec<Value>,
}

enum NodeKind {
    Section(SectionNode),
    List(ListNode),
}

struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// A hierarchical configuration tree of sections, lists and scalars.
///
/// # Examples
///
/// ```
/// use syskit::config::ConfigTree;
/// use serde_json::json;
///
/// let data = json!({
///     "test_key": "test value",
///     "nested_level_1": {"test_nested_key": "test nested value"},
/// });
/// let tree = ConfigTree::from_data(data.as_object().cloned().unwrap()).unwrap();
/// let root = tree.root();
/// assert_eq!(tree.get_str(root, "test_key"), Some("test value"));
/// assert_eq!(
///     tree.get_str(root, "nested_level_1.test_nested_key"),
///     Some("test nested value"),
/// );
/// ```
pub struct ConfigTree {
    nodes: Vec<Node>,
}

impl ConfigTree {
    /// Create an empty tree with a generic, schema-less root section.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Section(SectionNode {
                    name: None,
                    schema: SectionSchema::generic(),
                    entries: Vec::new(),
                }),
            }],
        }
    }

    /// Build a tree from raw mapping data with the generic root schema.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when any field fails validation, coercion
    /// or hooks during the load walk.
    pub fn from_data(data: RawMap) -> Result<Self, ConfigError> {
        Self::from_schema_and_data(SectionSchema::generic(), Some(data))
    }

    /// Build an empty tree governed by `schema`.
    ///
    /// Defaults, environment overlays and required-setting validation all
    /// run even without explicit data.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the schema declares invalid names,
    /// nameless loaders or unsatisfied required settings.
    pub fn from_schema(schema: Arc<SectionSchema>) -> Result<Self, ConfigError> {
        Self::from_schema_and_data(schema, None)
    }

    /// Build a tree governed by `schema` from optional raw mapping data.
    ///
    /// The load sequence is fixed: registered child loaders are instantiated
    /// eagerly, declared settings are initialised to null, schema defaults
    /// apply, environment overlays apply, explicit `data` applies, and
    /// finally `required_settings` are validated.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any violation in the sequence above;
    /// fields assigned before the failure are not rolled back.
    pub fn from_schema_and_data(
        schema: Arc<SectionSchema>,
        data: Option<RawMap>,
    ) -> Result<Self, ConfigError> {
        let mut tree = Self {
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Section(SectionNode {
                    name: None,
                    schema,
                    entries: Vec::new(),
                }),
            }],
        };
        tree.init_section(ROOT, data)?;
        Ok(tree)
    }

    /// Handle of the tree root section.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        ROOT
    }

    /// The configuration root for any node of this tree.
    ///
    /// Always the single topmost section, never an intermediate node, even
    /// for sections nested inside lists. `None` when the handle is unknown.
    #[must_use]
    pub fn config_root(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).map(|_| ROOT)
    }

    /// The parent node, `None` for the root or an unknown handle.
    ///
    /// Sections created inside a list report the list's owning section as
    /// their parent; the list is a transparent container for addressing.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    /// The name under which the node was created, `None` for the root.
    #[must_use]
    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Section(section) => section.name.as_deref(),
            NodeKind::List(list) => list.name.as_deref(),
        }
    }

    /// True when the handle refers to a section of this tree.
    #[must_use]
    pub fn is_section(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(node.0),
            Some(Node {
                kind: NodeKind::Section(_),
                ..
            })
        )
    }

    /// True when the handle refers to a list of this tree.
    #[must_use]
    pub fn is_list(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(node.0),
            Some(Node {
                kind: NodeKind::List(_),
                ..
            })
        )
    }

    /// The schema governing a section node.
    #[must_use]
    pub fn schema(&self, section: NodeId) -> Option<&Arc<SectionSchema>> {
        self.section_node(section).map(|s| &s.schema)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Look up a value by dotted path starting from `section`.
    ///
    /// Intermediate segments must be sections; `None` when any segment is
    /// missing or not a section.
    #[must_use]
    pub fn get(&self, section: NodeId, path: &str) -> Option<&Value> {
        let mut current = section;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let value = self
                .section_node(current)?
                .entries
                .iter()
                .find(|(key, _)| key == segment)
                .map(|(_, value)| value)?;
            if segments.peek().is_none() {
                return Some(value);
            }
            current = value.as_section()?;
        }
        None
    }

    /// Look up a string scalar by dotted path.
    #[must_use]
    pub fn get_str(&self, section: NodeId, path: &str) -> Option<&str> {
        self.get(section, path).and_then(Value::as_str)
    }

    /// Look up an integer scalar by dotted path.
    #[must_use]
    pub fn get_integer(&self, section: NodeId, path: &str) -> Option<i64> {
        self.get(section, path).and_then(Value::as_integer)
    }

    /// Look up a float scalar by dotted path.
    #[must_use]
    pub fn get_float(&self, section: NodeId, path: &str) -> Option<f64> {
        self.get(section, path).and_then(Value::as_float)
    }

    /// Look up a boolean scalar by dotted path.
    #[must_use]
    pub fn get_bool(&self, section: NodeId, path: &str) -> Option<bool> {
        self.get(section, path).and_then(Value::as_bool)
    }

    /// Look up a path scalar by dotted path.
    #[must_use]
    pub fn get_path(&self, section: NodeId, path: &str) -> Option<&std::path::Path> {
        self.get(section, path).and_then(Value::as_path)
    }

    /// Handle of a nested section by dotted path.
    #[must_use]
    pub fn child_section(&self, section: NodeId, path: &str) -> Option<NodeId> {
        self.get(section, path).and_then(Value::as_section)
    }

    /// Handle of a nested list by dotted path.
    #[must_use]
    pub fn child_list(&self, section: NodeId, path: &str) -> Option<NodeId> {
        self.get(section, path).and_then(Value::as_list)
    }

    /// Field names of a section in insertion order.
    #[must_use]
    pub fn keys(&self, section: NodeId) -> Vec<&str> {
        self.section_node(section).map_or_else(Vec::new, |node| {
            node.entries.iter().map(|(key, _)| key.as_str()).collect()
        })
    }

    /// Number of fields in a section (zero for non-sections).
    #[must_use]
    pub fn len(&self, section: NodeId) -> usize {
        self.section_node(section).map_or(0, |n| n.entries.len())
    }

    /// True when the section holds no fields.
    #[must_use]
    pub fn is_empty(&self, section: NodeId) -> bool {
        self.len(section) == 0
    }

    /// Serialize a section back to plain nested raw data.
    ///
    /// For data containing only legal field names and scalar/mapping/list
    /// values, `as_dict` of a freshly constructed tree round-trips the
    /// constructor input (when no defaults or environment overlays are
    /// declared).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotASection`] or [`ConfigError::UnknownNode`]
    /// for an invalid handle.
    pub fn as_dict(&self, section: NodeId) -> Result<RawMap, ConfigError> {
        let node = self.section_ref(section)?;
        let mut map = RawMap::new();
        for (key, value) in &node.entries {
            map.insert(key.clone(), self.value_to_raw(value)?);
        }
        Ok(map)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Assign a field, creating intermediate sections for dotted paths.
    ///
    /// `attr` may be a dotted path (`"outer.inner.field"`); every segment is
    /// validated and intermediate sections are created through the loader
    /// resolver. Mappings become nested sections, sequences become nested
    /// lists, scalars pass through coercion and the formatter/validator
    /// hooks. When the final segment addresses an existing child section
    /// whose schema declares a set interceptor, the write is delegated to
    /// the interceptor instead of overwriting the child.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid names, failed coercions or
    /// rejecting hooks. Intermediate sections created before the failure
    /// remain in place.
    pub fn set(
        &mut self,
        section: NodeId,
        attr: &str,
        value: impl Into<RawValue>,
    ) -> Result<(), ConfigError> {
        self.set_value(section, attr, value.into())
    }

    /// Create or overwrite a named child section directly.
    ///
    /// Without `path`, `data` must be a mapping. With `path`, the write is
    /// routed through the path resolver inside the child named `name` and
    /// the leaf field is assigned with [`ConfigTree::set`] semantics, so
    /// scalar and mapping data are both accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedValueType`] for non-mapping data
    /// without a `path`, or any error from the underlying `set`.
    pub fn load_section(
        &mut self,
        section: NodeId,
        name: &str,
        data: impl Into<RawValue>,
        path: Option<&str>,
    ) -> Result<(), ConfigError> {
        let data = data.into();
        tracing::debug!(name, path, "loading configuration section");
        match path {
            Some(path) => {
                let (leaf, field) = self.init_subsection_path(section, name, path)?;
                self.set_value(leaf, &field, data)
            }
            None => match data {
                RawValue::Object(_) => self.set_value(section, name, data),
                other => Err(ConfigError::UnsupportedValueType {
                    field: name.to_string(),
                    detail: format!("cannot load section from {}", raw_type_name(&other)),
                }),
            },
        }
    }

    /// Bulk-load a mapping whose keys may contain dots.
    ///
    /// Each `key, value` pair is routed through the same dotted-path logic
    /// as [`ConfigTree::set`], so `{"foo.bar": "x"}` creates section `foo`
    /// with field `bar`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedValueType`] for non-mapping input,
    /// or any error from the underlying `set`. Pairs applied before a
    /// failure are not rolled back.
    pub fn load_dictionary(
        &mut self,
        section: NodeId,
        data: impl Into<RawValue>,
    ) -> Result<(), ConfigError> {
        match data.into() {
            RawValue::Object(map) => {
                for (key, value) in map {
                    self.set_value(section, &key, value)?;
                }
                Ok(())
            }
            other => Err(ConfigError::UnsupportedValueType {
                field: "data".to_string(),
                detail: format!("cannot load dictionary from {}", raw_type_name(&other)),
            }),
        }
    }

    /// Fetch a named child section, creating it through the loader resolver
    /// when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid name or failed child
    /// construction.
    pub fn get_or_create_section(
        &mut self,
        section: NodeId,
        name: &str,
    ) -> Result<NodeId, ConfigError> {
        validate_attribute_name(name)?;
        if let Some(existing) = self
            .section_ref(section)?
            .entries
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_section())
        {
            return Ok(existing);
        }
        let schema = self.section_ref(section)?.schema.section_loader(name)?;
        let child = self.new_section(Some(section), Some(name.to_string()), schema);
        self.init_section(child, None)?;
        self.insert_entry(section, name, Value::Section(child))?;
        Ok(child)
    }

    /// Resolve a starting field name plus dotted `path` into the leaf
    /// section and the final unconsumed field name.
    ///
    /// Walks each path segment, creating missing intermediate sections of
    /// the declared default type, and returns the section the last segment
    /// should be assigned on together with that segment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid segment names or failed
    /// intermediate construction.
    pub fn init_subsection_path(
        &mut self,
        section: NodeId,
        name: &str,
        path: &str,
    ) -> Result<(NodeId, String), ConfigError> {
        let mut current = self.get_or_create_section(section, name)?;
        match path.rsplit_once('.') {
            None => {
                validate_attribute_name(path)?;
                Ok((current, path.to_string()))
            }
            Some((intermediate, field)) => {
                for segment in intermediate.split('.') {
                    current = self.get_or_create_section(current, segment)?;
                }
                validate_attribute_name(field)?;
                Ok((current, field.to_string()))
            }
        }
    }

    // -----------------------------------------------------------------------
    // List operations
    // -----------------------------------------------------------------------

    /// Append an item to a list.
    ///
    /// Mapping items expand into nested sections whose parent is the list's
    /// owning section; scalar items pass through the list's item formatter.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid handles or rejected items.
    pub fn list_push(
        &mut self,
        list: NodeId,
        value: impl Into<RawValue>,
    ) -> Result<(), ConfigError> {
        let item = self.build_list_item(list, value.into())?;
        self.list_mut(list)?.items.push(item);
        Ok(())
    }

    /// Insert an item at `index`, clamped to the list length.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid handles or rejected items.
    pub fn list_insert(
        &mut self,
        list: NodeId,
        index: usize,
        value: impl Into<RawValue>,
    ) -> Result<(), ConfigError> {
        let item = self.build_list_item(list, value.into())?;
        let node = self.list_mut(list)?;
        let index = index.min(node.items.len());
        node.items.insert(index, item);
        Ok(())
    }

    /// Replace the single item at `index`, scalars included.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IndexOutOfRange`] when `index` is outside the
    /// list.
    pub fn list_assign(
        &mut self,
        list: NodeId,
        index: usize,
        value: impl Into<RawValue>,
    ) -> Result<(), ConfigError> {
        let item = self.build_list_item(list, value.into())?;
        let node = self.list_mut(list)?;
        let len = node.items.len();
        let slot = node
            .items
            .get_mut(index)
            .ok_or(ConfigError::IndexOutOfRange { index, len })?;
        *slot = item;
        Ok(())
    }

    /// Delete the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IndexOutOfRange`] when `index` is outside the
    /// list.
    pub fn list_remove(&mut self, list: NodeId, index: usize) -> Result<(), ConfigError> {
        let node = self.list_mut(list)?;
        let len = node.items.len();
        if index >= len {
            return Err(ConfigError::IndexOutOfRange { index, len });
        }
        node.items.remove(index);
        Ok(())
    }

    /// Remove every item from a list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotAList`] or [`ConfigError::UnknownNode`] for
    /// an invalid handle.
    pub fn list_clear(&mut self, list: NodeId) -> Result<(), ConfigError> {
        self.list_mut(list)?.items.clear();
        Ok(())
    }

    /// Atomically replace the entire list contents.
    ///
    /// `None` (or an empty sequence) empties the list; existing items are
    /// discarded before the new sequence is expanded.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for invalid handles or rejected items;
    /// items expanded before a failure remain.
    pub fn list_replace(
        &mut self,
        list: NodeId,
        data: Option<Vec<RawValue>>,
    ) -> Result<(), ConfigError> {
        self.list_clear(list)?;
        if let Some(items) = data {
            for item in items {
                self.list_push(list, item)?;
            }
        }
        Ok(())
    }

    /// Number of items in a list (zero for non-lists).
    #[must_use]
    pub fn list_len(&self, list: NodeId) -> usize {
        self.list_node(list).map_or(0, |n| n.items.len())
    }

    /// The item at `index`, if present.
    #[must_use]
    pub fn list_get(&self, list: NodeId, index: usize) -> Option<&Value> {
        self.list_node(list)?.items.get(index)
    }

    /// All items of a list in order (empty for non-lists).
    #[must_use]
    pub fn list_items(&self, list: NodeId) -> &[Value] {
        self.list_node(list).map_or(&[], |n| n.items.as_slice())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Full construction contract for one section node.
    fn init_section(&mut self, id: NodeId, data: Option<RawMap>) -> Result<(), ConfigError> {
        let schema = self.section_ref(id)?.schema.clone();

        // Registered loaders become empty named children up front.
        for loader in schema.section_loaders() {
            let name = match loader.name() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => return Err(ConfigError::InvalidSectionLoader),
            };
            validate_attribute_name(&name)?;
            match loader {
                ChildLoader::Section(child_schema) => {
                    let child =
                        self.new_section(Some(id), Some(name.clone()), child_schema.clone());
                    self.init_section(child, None)?;
                    self.insert_entry(id, &name, Value::Section(child))?;
                }
                ChildLoader::List(list_schema) => {
                    let child = self.new_list(
                        id,
                        Some(name.clone()),
                        list_schema.clone(),
                        schema.clone(),
                    );
                    self.insert_entry(id, &name, Value::List(child))?;
                }
            }
        }

        // Declared settings read as null until something assigns them.
        for (_, field) in schema.environment_variables() {
            validate_attribute_name(field)?;
            if self.get(id, field).is_none() {
                self.insert_entry(id, field, Value::Null)?;
            }
        }

        for (field, value) in schema.default_settings() {
            self.set_value(id, field, value.clone())?;
        }

        for (env_name, field) in schema.environment_variables() {
            let value = schema
                .environment_prefix()
                .and_then(|prefix| std::env::var(format!("{prefix}_{env_name}")).ok())
                .or_else(|| std::env::var(env_name).ok());
            if let Some(value) = value {
                self.set_value(id, field, RawValue::String(value))?;
            }
        }

        if let Some(map) = data {
            for (key, value) in map {
                self.set_value(id, &key, value)?;
            }
        }

        for field in schema.required_settings() {
            match self.get(id, field) {
                Some(value) if !value.is_null() => {}
                _ => return Err(ConfigError::MissingRequiredSetting(field.clone())),
            }
        }
        Ok(())
    }

    fn set_value(
        &mut self,
        section: NodeId,
        attr: &str,
        value: RawValue,
    ) -> Result<(), ConfigError> {
        let (target, field) = match attr.rsplit_once('.') {
            None => (section, attr.to_string()),
            Some((intermediate, field)) => {
                let mut current = section;
                for segment in intermediate.split('.') {
                    current = self.get_or_create_section(current, segment)?;
                }
                (current, field.to_string())
            }
        };
        validate_attribute_name(&field)?;

        // Writes aimed at a child section with a set interceptor are
        // delegated, not overwritten.
        let existing_child = self
            .section_ref(target)?
            .entries
            .iter()
            .find(|(key, _)| key == &field)
            .and_then(|(_, value)| value.as_section());
        if let Some(child) = existing_child
            && let Some(hook) = self.section_ref(child)?.schema.set_interceptor().cloned()
        {
            return hook.set(self, child, &field, value);
        }

        match value {
            RawValue::Object(map) => {
                let schema = self.section_ref(target)?.schema.section_loader(&field)?;
                let child = self.new_section(Some(target), Some(field.clone()), schema);
                self.init_section(child, Some(map))?;
                self.insert_entry(target, &field, Value::Section(child))
            }
            RawValue::Array(items) => {
                let owner_schema = self.section_ref(target)?.schema.clone();
                let list_schema = owner_schema.list_loader(&field)?;
                let child =
                    self.new_list(target, Some(field.clone()), list_schema, owner_schema);
                for item in items {
                    self.list_push(child, item)?;
                }
                self.insert_entry(target, &field, Value::List(child))
            }
            scalar => {
                let stored = self.store_scalar(target, &field, scalar)?;
                self.insert_entry(target, &field, stored)
            }
        }
    }

    /// Coercion, formatter and validator pipeline for scalar assignments.
    fn store_scalar(
        &self,
        target: NodeId,
        field: &str,
        raw: RawValue,
    ) -> Result<Value, ConfigError> {
        let schema = &self.section_ref(target)?.schema;
        let mut value = scalar_from_raw(field, raw)?;
        if schema.is_integer_setting(field) {
            value = coerce_integer(field, value)?;
        } else if schema.is_float_setting(field) {
            value = coerce_float(field, value)?;
        } else if schema.is_path_setting(field) {
            value = coerce_path(field, value)?;
        }
        if let Some(hook) = schema.formatter(field) {
            value = hook(value).map_err(|message| ConfigError::FormatterFailed {
                field: field.to_string(),
                message,
            })?;
        }
        if let Some(hook) = schema.validator(field) {
            hook(&value).map_err(|message| ConfigError::ValidatorFailed {
                field: field.to_string(),
                message,
            })?;
        }
        Ok(value)
    }

    /// Expand one raw value into a stored list item.
    fn build_list_item(&mut self, list: NodeId, item: RawValue) -> Result<Value, ConfigError> {
        match item {
            RawValue::Object(map) => {
                // Nested sections attach to the list's owning section, not
                // the list itself; the list is transparent for addressing.
                let owner = self
                    .node_ref(list)?
                    .parent
                    .ok_or(ConfigError::UnknownNode)?;
                let owner_schema = self.list_ref(list)?.owner_schema.clone();
                let schema = owner_schema
                    .dict_loader_class()
                    .cloned()
                    .unwrap_or_else(SectionSchema::generic);
                let child = self.new_section(Some(owner), None, schema);
                self.init_section(child, Some(map))?;
                Ok(Value::Section(child))
            }
            RawValue::Array(items) => {
                let owner = self
                    .node_ref(list)?
                    .parent
                    .ok_or(ConfigError::UnknownNode)?;
                let owner_schema = self.list_ref(list)?.owner_schema.clone();
                let schema = owner_schema
                    .list_loader_class()
                    .cloned()
                    .unwrap_or_else(ListSchema::generic);
                let child = self.new_list(owner, None, schema, owner_schema);
                for item in items {
                    self.list_push(child, item)?;
                }
                Ok(Value::List(child))
            }
            scalar => {
                let node = self.list_ref(list)?;
                let label = node.schema.name().unwrap_or("item").to_string();
                let mut value = scalar_from_raw(&label, scalar)?;
                if let Some(hook) = node.schema.item_formatter() {
                    value = hook(value).map_err(|message| ConfigError::FormatterFailed {
                        field: label,
                        message,
                    })?;
                }
                Ok(value)
            }
        }
    }

    fn value_to_raw(&self, value: &Value) -> Result<RawValue, ConfigError> {
        match value {
            Value::Section(id) => Ok(RawValue::Object(self.as_dict(*id)?)),
            Value::List(id) => {
                let items = self
                    .list_ref(*id)?
                    .items
                    .iter()
                    .map(|item| self.value_to_raw(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RawValue::Array(items))
            }
            scalar => Ok(scalar_to_raw(scalar)),
        }
    }

    fn new_section(
        &mut self,
        parent: Option<NodeId>,
        name: Option<String>,
        schema: Arc<SectionSchema>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            kind: NodeKind::Section(SectionNode {
                name,
                schema,
                entries: Vec::new(),
            }),
        });
        id
    }

    fn new_list(
        &mut self,
        parent: NodeId,
        name: Option<String>,
        schema: Arc<ListSchema>,
        owner_schema: Arc<SectionSchema>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            kind: NodeKind::List(ListNode {
                name,
                schema,
                owner_schema,
                items: Vec::new(),
            }),
        });
        id
    }

    /// Replace an existing field in place or append a new one.
    fn insert_entry(
        &mut self,
        section: NodeId,
        field: &str,
        value: Value,
    ) -> Result<(), ConfigError> {
        let node = self.section_mut(section)?;
        if let Some(slot) = node.entries.iter_mut().find(|(key, _)| key == field) {
            slot.1 = value;
        } else {
            node.entries.push((field.to_string(), value));
        }
        Ok(())
    }

    fn node_ref(&self, id: NodeId) -> Result<&Node, ConfigError> {
        self.nodes.get(id.0).ok_or(ConfigError::UnknownNode)
    }

    fn section_node(&self, id: NodeId) -> Option<&SectionNode> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Section(section) => Some(section),
            NodeKind::List(_) => None,
        }
    }

    fn list_node(&self, id: NodeId) -> Option<&ListNode> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Section(_) => None,
            NodeKind::List(list) => Some(list),
        }
    }

    fn section_ref(&self, id: NodeId) -> Result<&SectionNode, ConfigError> {
        match &self.node_ref(id)?.kind {
            NodeKind::Section(section) => Ok(section),
            NodeKind::List(_) => Err(ConfigError::NotASection),
        }
    }

    fn section_mut(&mut self, id: NodeId) -> Result<&mut SectionNode, ConfigError> {
        match &mut self
            .nodes
            .get_mut(id.0)
            .ok_or(ConfigError::UnknownNode)?
            .kind
        {
            NodeKind::Section(section) => Ok(section),
            NodeKind::List(_) => Err(ConfigError::NotASection),
        }
    }

    fn list_ref(&self, id: NodeId) -> Result<&ListNode, ConfigError> {
        match &self.node_ref(id)?.kind {
            NodeKind::Section(_) => Err(ConfigError::NotAList),
            NodeKind::List(list) => Ok(list),
        }
    }

    fn list_mut(&mut self, id: NodeId) -> Result<&mut ListNode, ConfigError> {
        match &mut self
            .nodes
            .get_mut(id.0)
            .ok_or(ConfigError::UnknownNode)?
            .kind
        {
            NodeKind::Section(_) => Err(ConfigError::NotAList),
            NodeKind::List(list) => Ok(list),
        }
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigTree")
            .field("nodes", &self.nodes.len())
            .field("root_keys", &self.keys(ROOT))
            .finish()
    }
}

/// Diagnostic representation: the root section's field names.
impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keys(ROOT).join(", "))
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_dict(ROOT)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

fn raw_type_name(value: &RawValue) -> &'static str {
    match value {
        RawValue::Null => "null",
        RawValue::Bool(_) => "boolean",
        RawValue::Number(_) => "number",
        RawValue::String(_) => "string",
        RawValue::Array(_) => "list",
        RawValue::Object(_) => "mapping",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    fn default_data() -> RawMap {
        json!({
            "test_key": "test value",
            "nested_level_1": {"test_nested_key": "test nested value"},
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn empty_tree_has_empty_root_section() {
        let tree = ConfigTree::new();
        assert!(tree.is_section(tree.root()));
        assert!(tree.is_empty(tree.root()));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.config_root(tree.root()), Some(tree.root()));
    }

    #[test]
    fn nested_data_walk() {
        let tree = ConfigTree::from_data(default_data()).unwrap();
        let root = tree.root();
        assert_eq!(tree.get_str(root, "test_key"), Some("test value"));

        let nested = tree.child_section(root, "nested_level_1").unwrap();
        assert_eq!(tree.parent(nested), Some(root));
        assert_eq!(tree.config_root(nested), Some(root));
        assert_eq!(tree.node_name(nested), Some("nested_level_1"));
        assert_eq!(
            tree.get_str(nested, "test_nested_key"),
            Some("test nested value"),
        );
    }

    #[test]
    fn empty_string_values_normalise_to_null() {
        let data = json!({"test_key_empty": "", "nested_level_1": {}})
            .as_object()
            .cloned()
            .unwrap();
        let tree = ConfigTree::from_data(data).unwrap();
        assert!(tree.get(tree.root(), "test_key_empty").unwrap().is_null());
        assert!(tree.child_section(tree.root(), "nested_level_1").is_some());
    }

    #[test]
    fn set_rejects_invalid_attribute_names() {
        let mut tree = ConfigTree::new();
        for attr in ["spaced out", "dashed-string", "hähää", ""] {
            let err = tree.set(tree.root(), attr, "value");
            assert!(
                matches!(err, Err(ConfigError::InvalidAttributeName(_))),
                "{attr} should be rejected",
            );
        }
    }

    #[test]
    fn set_with_mapping_creates_section() {
        let mut tree = ConfigTree::new();
        tree.set(tree.root(), "test", json!({"key": "value"})).unwrap();
        assert_eq!(tree.get_str(tree.root(), "test.key"), Some("value"));
    }

    #[test]
    fn set_with_dotted_path_creates_chain() {
        let mut tree = ConfigTree::new();
        tree.set(tree.root(), "outer.inner.k", "v").unwrap();

        let outer = tree.child_section(tree.root(), "outer").unwrap();
        let inner = tree.child_section(outer, "inner").unwrap();
        assert_eq!(tree.parent(inner), Some(outer));
        assert_eq!(tree.get_str(tree.root(), "outer.inner.k"), Some("v"));
    }

    #[test]
    fn set_with_invalid_middle_segment_aborts() {
        let mut tree = ConfigTree::new();
        let err = tree.set(tree.root(), "outer.in ner.k", "v");
        assert!(matches!(err, Err(ConfigError::InvalidAttributeName(_))));
        // Fail-fast: the leading segment created before the failure stays.
        assert!(tree.child_section(tree.root(), "outer").is_some());
    }

    #[test]
    fn load_section_explicit() {
        let mut tree = ConfigTree::new();
        tree.load_section(tree.root(), "test", json!({"test_key": "test value"}), None)
            .unwrap();
        assert_eq!(tree.get_str(tree.root(), "test.test_key"), Some("test value"));
    }

    #[test]
    fn load_section_rejects_non_mapping_without_path() {
        let mut tree = ConfigTree::new();
        for data in [RawValue::Null, json!([1, 2, 3])] {
            let err = tree.load_section(tree.root(), "test", data, None);
            assert!(matches!(
                err,
                Err(ConfigError::UnsupportedValueType { .. })
            ));
        }
    }

    #[test]
    fn load_section_with_path_routes_to_leaf() {
        let mut tree = ConfigTree::new();
        tree.load_section(tree.root(), "test", "123", Some("other.bar.test_key"))
            .unwrap();
        assert_eq!(
            tree.get_str(tree.root(), "test.other.bar.test_key"),
            Some("123"),
        );

        tree.load_section(tree.root(), "sub", json!({"test": "value"}), Some("outer"))
            .unwrap();
        assert_eq!(tree.get_str(tree.root(), "sub.outer.test"), Some("value"));
    }

    #[test]
    fn load_dictionary_handles_dotted_keys() {
        let mut tree = ConfigTree::new();
        tree.load_dictionary(
            tree.root(),
            json!({
                "foo.bar": "test",
                "bar.baz": {"zyxxy": "item"},
            }),
        )
        .unwrap();
        assert_eq!(tree.get_str(tree.root(), "foo.bar"), Some("test"));
        assert_eq!(tree.get_str(tree.root(), "bar.baz.zyxxy"), Some("item"));
        assert!(tree.as_dict(tree.root()).is_ok());
    }

    #[test]
    fn load_dictionary_rejects_non_mapping() {
        let mut tree = ConfigTree::new();
        for data in [RawValue::Null, json!([1, 2, 3])] {
            assert!(matches!(
                tree.load_dictionary(tree.root(), data),
                Err(ConfigError::UnsupportedValueType { .. }),
            ));
        }
    }

    #[test]
    fn init_subsection_path_creates_and_names_sections() {
        let mut tree = ConfigTree::new();

        let (section, field) = tree
            .init_subsection_path(tree.root(), "test", "test_field")
            .unwrap();
        assert_eq!(tree.config_root(section), Some(tree.root()));
        assert_eq!(tree.node_name(section), Some("test"));
        assert_eq!(field, "test_field");

        let (section, field) = tree
            .init_subsection_path(tree.root(), "test", "inner.value")
            .unwrap();
        assert_eq!(tree.node_name(section), Some("inner"));
        let parent = tree.parent(section).unwrap();
        assert_eq!(tree.node_name(parent), Some("test"));
        assert_eq!(field, "value");
    }

    #[test]
    fn as_dict_round_trips_plain_data() {
        let data = json!({
            "test_key": "test value",
            "numbers": [1, 2, 3],
            "nested_level_1": {"test_nested_key": "test nested value", "flag": true},
        })
        .as_object()
        .cloned()
        .unwrap();
        let tree = ConfigTree::from_data(data.clone()).unwrap();
        assert_eq!(tree.as_dict(tree.root()).unwrap(), data);
    }

    #[test]
    fn display_lists_root_keys() {
        let tree = ConfigTree::from_data(default_data()).unwrap();
        assert_eq!(tree.to_string(), "test_key, nested_level_1");
    }

    #[test]
    fn serialize_matches_as_dict() {
        let tree = ConfigTree::from_data(default_data()).unwrap();
        let serialized = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            serialized.as_object().cloned().unwrap(),
            tree.as_dict(tree.root()).unwrap(),
        );
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    fn nested_list_data() -> RawMap {
        json!({
            "nested_item_1": {
                "list_field": [
                    {"list_nested_item": {"field": 1234}},
                    "text list item",
                ],
            },
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn list_items_of_mixed_content() {
        let tree = ConfigTree::from_data(nested_list_data()).unwrap();
        let root = tree.root();
        let nested = tree.child_section(root, "nested_item_1").unwrap();
        let list = tree.child_list(nested, "list_field").unwrap();

        assert_eq!(tree.list_len(list), 2);
        assert_eq!(tree.config_root(list), Some(root));

        let first = tree.list_get(list, 0).unwrap().as_section().unwrap();
        // List sections share the owning section as parent, not the list.
        assert_eq!(tree.parent(first), Some(nested));
        assert_eq!(tree.config_root(first), Some(root));
        assert_eq!(
            tree.get_integer(first, "list_nested_item.field"),
            Some(1234),
        );
        assert_eq!(
            tree.list_get(list, 1).unwrap().as_str(),
            Some("text list item"),
        );
    }

    #[test]
    fn list_mutation_and_replacement() {
        let tree_data = nested_list_data();
        let mut tree = ConfigTree::from_data(tree_data).unwrap();
        let nested = tree.child_section(tree.root(), "nested_item_1").unwrap();
        let list = tree.child_list(nested, "list_field").unwrap();

        tree.list_insert(list, 1, "inserted").unwrap();
        assert_eq!(tree.list_len(list), 3);

        let replacement = vec![json!(1234), json!(2234), json!(3334), json!(4444)];
        tree.list_replace(list, Some(replacement)).unwrap();
        assert_eq!(tree.list_len(list), 4);

        tree.list_assign(list, 1, RawValue::Null).unwrap();
        assert_eq!(tree.list_len(list), 4);
        assert!(tree.list_get(list, 1).unwrap().is_null());

        tree.list_replace(list, None).unwrap();
        assert_eq!(tree.list_len(list), 0);
    }

    #[test]
    fn list_remove_out_of_range() {
        let mut tree = ConfigTree::new();
        tree.set(tree.root(), "values", json!([1])).unwrap();
        let list = tree.child_list(tree.root(), "values").unwrap();
        assert!(matches!(
            tree.list_remove(list, 5),
            Err(ConfigError::IndexOutOfRange { index: 5, len: 1 }),
        ));
    }

    #[test]
    fn list_item_formatter_coerces_scalars() {
        let formatted = ListSchema::builder()
            .name("numbers")
            .format_item(|value| match value {
                Value::String(s) => s
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|e| e.to_string()),
                other => Ok(other),
            })
            .build();
        let schema = SectionSchema::builder().list_loader(formatted).build().unwrap();
        let mut tree = ConfigTree::from_schema(schema).unwrap();
        tree.set(tree.root(), "numbers", json!(["1", "2"])).unwrap();

        let list = tree.child_list(tree.root(), "numbers").unwrap();
        tree.list_insert(list, 1, "2").unwrap();
        assert_eq!(tree.list_len(list), 3);
        for item in tree.list_items(list) {
            assert!(item.as_integer().is_some());
        }
    }

    // -----------------------------------------------------------------------
    // Schemas: defaults, environment, required, coercion, hooks
    // -----------------------------------------------------------------------

    #[test]
    fn defaults_apply_without_data() {
        let schema = SectionSchema::builder()
            .default("test_key", "test value")
            .default("nested_default", json!({"test_nested_key": "nested value"}))
            .build()
            .unwrap();
        let tree = ConfigTree::from_schema(schema).unwrap();
        assert_eq!(tree.get_str(tree.root(), "test_key"), Some("test value"));
        assert_eq!(
            tree.get_str(tree.root(), "nested_default.test_nested_key"),
            Some("nested value"),
        );
    }

    #[test]
    fn explicit_data_overrides_defaults() {
        let schema = SectionSchema::builder()
            .default("test_key", "test value")
            .build()
            .unwrap();
        let data = json!({"test_key": "explicit"}).as_object().cloned().unwrap();
        let tree = ConfigTree::from_schema_and_data(schema, Some(data)).unwrap();
        assert_eq!(tree.get_str(tree.root(), "test_key"), Some("explicit"));
    }

    #[test]
    fn invalid_default_setting_name_fails_construction() {
        let schema = SectionSchema::builder()
            .default("test key", "test value")
            .build()
            .unwrap();
        assert!(matches!(
            ConfigTree::from_schema(schema),
            Err(ConfigError::InvalidAttributeName(_)),
        ));
    }

    #[test]
    fn invalid_environment_field_name_fails_construction() {
        let schema = SectionSchema::builder()
            .environment_variable("TEST_RESULT_KEY", "test key")
            .build()
            .unwrap();
        assert!(matches!(
            ConfigTree::from_schema(schema),
            Err(ConfigError::InvalidAttributeName(_)),
        ));
    }

    #[test]
    fn required_settings_validation() {
        let schema = || {
            SectionSchema::builder()
                .required("test_key")
                .build()
                .unwrap()
        };

        let tree = ConfigTree::from_schema_and_data(schema(), Some(default_data())).unwrap();
        assert_eq!(tree.get_str(tree.root(), "test_key"), Some("test value"));

        let mut invalid = default_data();
        invalid.insert("test_key".to_string(), RawValue::Null);
        assert!(matches!(
            ConfigTree::from_schema_and_data(schema(), Some(invalid)),
            Err(ConfigError::MissingRequiredSetting(field)) if field == "test_key",
        ));

        assert!(matches!(
            ConfigTree::from_schema(schema()),
            Err(ConfigError::MissingRequiredSetting(_)),
        ));
    }

    #[test]
    fn number_coercion_settings() {
        let schema = SectionSchema::builder()
            .integer_setting("integrity")
            .float_setting("floating")
            .path_setting("root")
            .build()
            .unwrap();
        let mut tree = ConfigTree::from_schema(schema).unwrap();
        let root = tree.root();

        tree.set(root, "integrity", "123").unwrap();
        assert_eq!(tree.get_integer(root, "integrity"), Some(123));

        tree.set(root, "floating", "123.25").unwrap();
        assert_eq!(tree.get_float(root, "floating"), Some(123.25));

        tree.set(root, "root", "/tmp").unwrap();
        assert_eq!(tree.get_path(root, "root"), Some(std::path::Path::new("/tmp")));
    }

    #[test]
    fn field_formatter_transforms_and_rejects() {
        let schema = || {
            SectionSchema::builder()
                .format("test_key", |value| match value {
                    Value::String(s) => Ok(Value::String(s.to_uppercase())),
                    other => Err(format!("expected string, got {}", other.type_name())),
                })
                .build()
                .unwrap()
        };

        let tree = ConfigTree::from_schema_and_data(schema(), Some(default_data())).unwrap();
        assert_eq!(tree.get_str(tree.root(), "test_key"), Some("TEST VALUE"));

        let data = json!({"test_key": 123}).as_object().cloned().unwrap();
        assert!(matches!(
            ConfigTree::from_schema_and_data(schema(), Some(data)),
            Err(ConfigError::FormatterFailed { field, .. }) if field == "test_key",
        ));
    }

    #[test]
    fn field_validator_runs_after_formatter() {
        let passing = SectionSchema::builder()
            .validate("test_key", |_| Ok(()))
            .build()
            .unwrap();
        let tree = ConfigTree::from_schema_and_data(passing, Some(default_data())).unwrap();
        assert_eq!(tree.get_str(tree.root(), "test_key"), Some("test value"));

        let rejecting = SectionSchema::builder()
            .validate("test_key", |_| Err("Invalid value".to_string()))
            .build()
            .unwrap();
        assert!(matches!(
            ConfigTree::from_schema_and_data(rejecting, Some(default_data())),
            Err(ConfigError::ValidatorFailed { field, .. }) if field == "test_key",
        ));
    }

    // -----------------------------------------------------------------------
    // Loader registration and resolution
    // -----------------------------------------------------------------------

    fn nested_root_schema() -> Arc<SectionSchema> {
        let nested = SectionSchema::builder().name("nested").build().unwrap();
        let lists = ListSchema::builder().name("lists").build();
        let dict_default = SectionSchema::builder().name("subsection").build().unwrap();
        SectionSchema::builder()
            .child_section(nested)
            .child_list(lists.clone())
            .dict_loader(dict_default)
            .list_loader(lists)
            .build()
            .unwrap()
    }

    #[test]
    fn registered_loaders_create_eager_children() {
        let tree = ConfigTree::from_schema(nested_root_schema()).unwrap();
        let root = tree.root();

        let nested = tree.child_section(root, "nested").unwrap();
        assert_eq!(tree.node_name(nested), Some("nested"));
        assert_eq!(tree.schema(nested).unwrap().name(), Some("nested"));

        let lists = tree.child_list(root, "lists").unwrap();
        assert_eq!(tree.node_name(lists), Some("lists"));
        assert_eq!(tree.list_len(lists), 0);
    }

    #[test]
    fn untyped_children_use_dict_loader_fallback() {
        let mut tree = ConfigTree::from_schema(nested_root_schema()).unwrap();
        tree.load_section(tree.root(), "test", json!({"test_key": "test value"}), None)
            .unwrap();
        let section = tree.child_section(tree.root(), "test").unwrap();
        assert_eq!(tree.schema(section).unwrap().name(), Some("subsection"));
        assert_eq!(tree.get_str(section, "test_key"), Some("test value"));
    }

    #[test]
    fn get_or_create_section_names_unknown_children() {
        let mut tree = ConfigTree::from_schema(nested_root_schema()).unwrap();
        let unknown = tree.get_or_create_section(tree.root(), "unknown").unwrap();
        assert_eq!(tree.node_name(unknown), Some("unknown"));
    }

    #[test]
    fn nameless_registered_loader_fails_construction() {
        // The builder refuses nameless loaders, so resolution-time checks
        // are exercised through the unchecked generic constructor.
        assert!(matches!(
            SectionSchema::builder()
                .child_section(SectionSchema::generic())
                .build(),
            Err(ConfigError::InvalidSectionLoader),
        ));
    }

    // -----------------------------------------------------------------------
    // Set interception
    // -----------------------------------------------------------------------

    #[derive(Debug, Default)]
    struct RecordingInterceptor {
        calls: Mutex<Vec<(String, RawValue)>>,
    }

    impl super::super::schema::SetInterceptor for RecordingInterceptor {
        fn set(
            &self,
            _tree: &mut ConfigTree,
            _section: NodeId,
            attr: &str,
            value: RawValue,
        ) -> Result<(), ConfigError> {
            self.calls
                .lock()
                .map_err(|_| ConfigError::UnknownNode)?
                .push((attr.to_string(), value));
            Ok(())
        }
    }

    #[test]
    fn set_delegates_to_child_interceptor() {
        let interceptor = Arc::new(RecordingInterceptor::default());
        let child = SectionSchema::builder()
            .name("callme")
            .intercept_set(interceptor.clone())
            .build()
            .unwrap();
        let schema = SectionSchema::builder().child_section(child).build().unwrap();

        let mut tree = ConfigTree::from_schema(schema).unwrap();
        assert!(tree.child_section(tree.root(), "callme").is_some());
        assert_eq!(interceptor.calls.lock().unwrap().len(), 0);

        tree.set(tree.root(), "callme", "test callable value").unwrap();
        let calls = interceptor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls.first().unwrap().0, "callme");
        // The child section was not overwritten by the write.
        drop(calls);
        assert!(tree.child_section(tree.root(), "callme").is_some());
    }
}
