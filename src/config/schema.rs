//! Declarative per-type settings for configuration sections and lists.
//!
//! The original design attaches defaults, environment overlays, coercion
//! sets and loader registrations to the section *type*. Here they live in an
//! explicit immutable [`SectionSchema`] built once through [`SchemaBuilder`]
//! and shared by reference between every node instantiated from it.
//!
//! Per-field formatter/validator hooks and the section-level set interceptor
//! are explicit callback tables resolved at build time, not discovered by
//! reflection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use super::tree::ConfigTree;
use super::value::{NodeId, RawValue, Value};
use crate::error::ConfigError;

/// Per-field formatter hook: transforms an incoming scalar after coercion.
///
/// Returning `Err` aborts the assignment with
/// [`ConfigError::FormatterFailed`].
pub type FormatFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Per-field validator hook: runs after the formatter, may reject the value.
///
/// Returning `Err` aborts the assignment with
/// [`ConfigError::ValidatorFailed`].
pub type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Capability interface for sections that intercept writes directed at them.
///
/// When a `set` call's final segment addresses an existing child section
/// whose schema declares an interceptor, the write is delegated here instead
/// of overwriting the child. Implementations receive the owning tree, their
/// own node handle, the addressed attribute and the raw incoming value.
pub trait SetInterceptor: Send + Sync {
    /// Handle a write delegated to this section.
    fn set(
        &self,
        tree: &mut ConfigTree,
        section: NodeId,
        attr: &str,
        value: RawValue,
    ) -> Result<(), ConfigError>;
}

/// A named child node type registered in a section's `section_loaders`.
#[derive(Clone)]
pub enum ChildLoader {
    /// A named child section schema.
    Section(Arc<SectionSchema>),
    /// A named child list schema.
    List(Arc<ListSchema>),
}

impl ChildLoader {
    /// The declared name of the registered loader, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Section(schema) => schema.name(),
            Self::List(schema) => schema.name(),
        }
    }
}

impl fmt::Debug for ChildLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section(schema) => write!(f, "ChildLoader::Section({:?})", schema.name()),
            Self::List(schema) => write!(f, "ChildLoader::List({:?})", schema.name()),
        }
    }
}

/// Immutable declarative settings for a configuration section type.
///
/// Recognized options are exactly: `default_settings`,
/// `environment_variables` (plus optional prefix), `required_settings`,
/// `integer_settings` / `float_settings` / `path_settings`,
/// `section_loaders`, `dict_loader_class` and `list_loader_class`, plus the
/// formatter/validator/set-interceptor hook tables.
pub struct SectionSchema {
    name: Option<String>,
    default_settings: Vec<(String, RawValue)>,
    environment_variables: Vec<(String, String)>,
    environment_prefix: Option<String>,
    required_settings: Vec<String>,
    integer_settings: BTreeSet<String>,
    float_settings: BTreeSet<String>,
    path_settings: BTreeSet<String>,
    section_loaders: Vec<ChildLoader>,
    dict_loader_class: Option<Arc<SectionSchema>>,
    list_loader_class: Option<Arc<ListSchema>>,
    formatters: BTreeMap<String, FormatFn>,
    validators: BTreeMap<String, ValidateFn>,
    set_interceptor: Option<Arc<dyn SetInterceptor>>,
}

impl SectionSchema {
    /// Start building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        <SchemaBuilder as Default>::default()
    }

    /// The generic schema: no name, no declared settings, no hooks.
    ///
    /// Used for untyped sections when no loader matches and no fallback is
    /// declared.
    #[must_use]
    pub fn generic() -> Arc<Self> {
        <SchemaBuilder as Default>::default().build_unchecked()
    }

    /// The declared type name, used for loader matching.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared default settings, lowest priority in the load sequence.
    #[must_use]
    pub fn default_settings(&self) -> &[(String, RawValue)] {
        &self.default_settings
    }

    /// Declared `(environment variable, field name)` overlay pairs.
    #[must_use]
    pub fn environment_variables(&self) -> &[(String, String)] {
        &self.environment_variables
    }

    /// Optional prefix tried before the plain environment variable name.
    #[must_use]
    pub fn environment_prefix(&self) -> Option<&str> {
        self.environment_prefix.as_deref()
    }

    /// Fields that must be non-null after the full load sequence.
    #[must_use]
    pub fn required_settings(&self) -> &[String] {
        &self.required_settings
    }

    /// Registered named child loaders.
    #[must_use]
    pub fn section_loaders(&self) -> &[ChildLoader] {
        &self.section_loaders
    }

    /// Fallback schema for untyped mapping children.
    #[must_use]
    pub fn dict_loader_class(&self) -> Option<&Arc<Self>> {
        self.dict_loader_class.as_ref()
    }

    /// Fallback schema for untyped sequence children.
    #[must_use]
    pub fn list_loader_class(&self) -> Option<&Arc<ListSchema>> {
        self.list_loader_class.as_ref()
    }

    /// The set of known scalar setting names declared on this schema:
    /// defaults, environment-mapped fields, coercion sets and required
    /// fields.
    #[must_use]
    pub fn known_settings(&self) -> BTreeSet<String> {
        let mut known: BTreeSet<String> = BTreeSet::new();
        for (field, value) in &self.default_settings {
            if !value.is_object() {
                known.insert(field.clone());
            }
        }
        for (_, field) in &self.environment_variables {
            known.insert(field.clone());
        }
        for field in &self.required_settings {
            known.insert(field.clone());
        }
        for field in self
            .integer_settings
            .iter()
            .chain(&self.float_settings)
            .chain(&self.path_settings)
        {
            known.insert(field.clone());
        }
        known
    }

    /// Resolve the section schema to instantiate for a mapping child named
    /// `name`.
    ///
    /// Resolution order: a registered loader with a matching declared name,
    /// then the `dict_loader_class` fallback, then the generic schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSectionLoader`] when `name` is empty.
    pub fn section_loader(&self, name: &str) -> Result<Arc<Self>, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::InvalidSectionLoader);
        }
        for loader in &self.section_loaders {
            if let ChildLoader::Section(schema) = loader
                && schema.name() == Some(name)
            {
                return Ok(schema.clone());
            }
        }
        Ok(self
            .dict_loader_class
            .clone()
            .unwrap_or_else(Self::generic))
    }

    /// Resolve the list schema to instantiate for a sequence child named
    /// `name`.
    ///
    /// Resolution order mirrors [`Self::section_loader`] with the
    /// `list_loader_class` fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSectionLoader`] when `name` is empty.
    pub fn list_loader(&self, name: &str) -> Result<Arc<ListSchema>, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::InvalidSectionLoader);
        }
        for loader in &self.section_loaders {
            if let ChildLoader::List(schema) = loader
                && schema.name() == Some(name)
            {
                return Ok(schema.clone());
            }
        }
        Ok(self
            .list_loader_class
            .clone()
            .unwrap_or_else(ListSchema::generic))
    }

    pub(crate) fn is_integer_setting(&self, field: &str) -> bool {
        self.integer_settings.contains(field)
    }

    pub(crate) fn is_float_setting(&self, field: &str) -> bool {
        self.float_settings.contains(field)
    }

    pub(crate) fn is_path_setting(&self, field: &str) -> bool {
        self.path_settings.contains(field)
    }

    pub(crate) fn formatter(&self, field: &str) -> Option<&FormatFn> {
        self.formatters.get(field)
    }

    pub(crate) fn validator(&self, field: &str) -> Option<&ValidateFn> {
        self.validators.get(field)
    }

    pub(crate) fn set_interceptor(&self) -> Option<&Arc<dyn SetInterceptor>> {
        self.set_interceptor.as_ref()
    }
}

impl fmt::Debug for SectionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionSchema")
            .field("name", &self.name)
            .field("default_settings", &self.default_settings)
            .field("environment_variables", &self.environment_variables)
            .field("environment_prefix", &self.environment_prefix)
            .field("required_settings", &self.required_settings)
            .field("integer_settings", &self.integer_settings)
            .field("float_settings", &self.float_settings)
            .field("path_settings", &self.path_settings)
            .field("section_loaders", &self.section_loaders)
            .field("formatters", &self.formatters.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("set_interceptor", &self.set_interceptor.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`SectionSchema`].
#[derive(Default)]
pub struct SchemaBuilder {
    name: Option<String>,
    default_settings: Vec<(String, RawValue)>,
    environment_variables: Vec<(String, String)>,
    environment_prefix: Option<String>,
    required_settings: Vec<String>,
    integer_settings: BTreeSet<String>,
    float_settings: BTreeSet<String>,
    path_settings: BTreeSet<String>,
    section_loaders: Vec<ChildLoader>,
    dict_loader_class: Option<Arc<SectionSchema>>,
    list_loader_class: Option<Arc<ListSchema>>,
    formatters: BTreeMap<String, FormatFn>,
    validators: BTreeMap<String, ValidateFn>,
    set_interceptor: Option<Arc<dyn SetInterceptor>>,
}

impl SchemaBuilder {
    /// Declare the type name used for loader matching.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a default setting (lowest priority).
    #[must_use]
    pub fn default(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.default_settings.push((field.into(), value.into()));
        self
    }

    /// Map an environment variable onto a field.
    #[must_use]
    pub fn environment_variable(
        mut self,
        env_name: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.environment_variables
            .push((env_name.into(), field.into()));
        self
    }

    /// Declare the prefix tried before plain environment variable names.
    #[must_use]
    pub fn environment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.environment_prefix = Some(prefix.into());
        self
    }

    /// Require a field to be non-null after the full load sequence.
    #[must_use]
    pub fn required(mut self, field: impl Into<String>) -> Self {
        self.required_settings.push(field.into());
        self
    }

    /// Coerce the field to an integer on assignment.
    #[must_use]
    pub fn integer_setting(mut self, field: impl Into<String>) -> Self {
        self.integer_settings.insert(field.into());
        self
    }

    /// Coerce the field to a float on assignment.
    #[must_use]
    pub fn float_setting(mut self, field: impl Into<String>) -> Self {
        self.float_settings.insert(field.into());
        self
    }

    /// Coerce the field to a filesystem path on assignment.
    #[must_use]
    pub fn path_setting(mut self, field: impl Into<String>) -> Self {
        self.path_settings.insert(field.into());
        self
    }

    /// Register a named child section type.
    #[must_use]
    pub fn child_section(mut self, schema: Arc<SectionSchema>) -> Self {
        self.section_loaders.push(ChildLoader::Section(schema));
        self
    }

    /// Register a named child list type.
    #[must_use]
    pub fn child_list(mut self, schema: Arc<ListSchema>) -> Self {
        self.section_loaders.push(ChildLoader::List(schema));
        self
    }

    /// Declare the fallback schema for untyped mapping children.
    #[must_use]
    pub fn dict_loader(mut self, schema: Arc<SectionSchema>) -> Self {
        self.dict_loader_class = Some(schema);
        self
    }

    /// Declare the fallback schema for untyped sequence children.
    #[must_use]
    pub fn list_loader(mut self, schema: Arc<ListSchema>) -> Self {
        self.list_loader_class = Some(schema);
        self
    }

    /// Attach a formatter hook to a field.
    #[must_use]
    pub fn format<F>(mut self, field: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.formatters.insert(field.into(), Arc::new(hook));
        self
    }

    /// Attach a validator hook to a field.
    #[must_use]
    pub fn validate<F>(mut self, field: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.insert(field.into(), Arc::new(hook));
        self
    }

    /// Intercept writes directed at sections of this type.
    #[must_use]
    pub fn intercept_set(mut self, interceptor: Arc<dyn SetInterceptor>) -> Self {
        self.set_interceptor = Some(interceptor);
        self
    }

    /// Build the schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSectionLoader`] when a registered child
    /// loader has an empty or missing name, whether or not it would ever be
    /// matched.
    pub fn build(self) -> Result<Arc<SectionSchema>, ConfigError> {
        for loader in &self.section_loaders {
            match loader.name() {
                Some(name) if !name.is_empty() => {}
                _ => return Err(ConfigError::InvalidSectionLoader),
            }
        }
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> Arc<SectionSchema> {
        Arc::new(SectionSchema {
            name: self.name,
            default_settings: self.default_settings,
            environment_variables: self.environment_variables,
            environment_prefix: self.environment_prefix,
            required_settings: self.required_settings,
            integer_settings: self.integer_settings,
            float_settings: self.float_settings,
            path_settings: self.path_settings,
            section_loaders: self.section_loaders,
            dict_loader_class: self.dict_loader_class,
            list_loader_class: self.list_loader_class,
            formatters: self.formatters,
            validators: self.validators,
            set_interceptor: self.set_interceptor,
        })
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Immutable declarative settings for a configuration list type.
pub struct ListSchema {
    name: Option<String>,
    format_item: Option<FormatFn>,
}

impl ListSchema {
    /// Start building a list schema.
    #[must_use]
    pub fn builder() -> ListSchemaBuilder {
        ListSchemaBuilder::default()
    }

    /// The generic list schema: no name, no item formatter.
    #[must_use]
    pub fn generic() -> Arc<Self> {
        Arc::new(Self {
            name: None,
            format_item: None,
        })
    }

    /// The declared type name, used for loader matching.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn item_formatter(&self) -> Option<&FormatFn> {
        self.format_item.as_ref()
    }
}

impl fmt::Debug for ListSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSchema")
            .field("name", &self.name)
            .field("format_item", &self.format_item.is_some())
            .finish()
    }
}

/// Builder for [`ListSchema`].
#[derive(Default)]
pub struct ListSchemaBuilder {
    name: Option<String>,
    format_item: Option<FormatFn>,
}

impl ListSchemaBuilder {
    /// Declare the type name used for loader matching.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Coerce every inserted scalar item with the hook.
    #[must_use]
    pub fn format_item<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.format_item = Some(Arc::new(hook));
        self
    }

    /// Build the list schema.
    #[must_use]
    pub fn build(self) -> Arc<ListSchema> {
        Arc::new(ListSchema {
            name: self.name,
            format_item: self.format_item,
        })
    }
}

impl fmt::Debug for ListSchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSchemaBuilder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
