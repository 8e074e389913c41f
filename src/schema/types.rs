//! Raw schema types: capabilities, editable fields, search rules, path
//! resolution. Plain data: screens compose a controller around a schema
//! value instead of inheriting behavior.

use crate::root::ApiRoot;
use crate::search::{FilterKind, SearchCaps};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Resolves one operation's path template out of the discovery document.
pub type PathResolver = fn(&ApiRoot) -> Option<String>;

/// Resolves the schema's path-parameter names out of the discovery
/// document.
pub type IdentifiersResolver = fn(&ApiRoot) -> Option<Vec<String>>;

pub struct Creatable {
    pub resolve_path: PathResolver,
}

pub struct Destroyable {
    pub resolve_path: PathResolver,
}

pub struct Updatable {
    pub resolve_path: PathResolver,
}

pub struct Listable {
    pub resolve_path: PathResolver,
    /// Fetch the listing on activation.
    pub on_init_action: bool,
}

/// What a single-resource fetch does when the server reports the
/// resource missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Missing resource is fatal.
    Error,
    /// Transition to create mode with blank form values.
    TreatAsCreate,
}

pub struct Resource {
    pub resolve_path: PathResolver,
    pub on_not_found: NotFoundPolicy,
    /// Fetch the resource on activation.
    pub on_init_action: bool,
}

/// Which operations the schema enables. Invoking an operation without
/// its entry is a contract violation, not a runtime error.
#[derive(Default)]
pub struct Operations {
    pub creatable: Option<Creatable>,
    pub destroyable: Option<Destroyable>,
    pub updatable: Option<Updatable>,
    pub listable: Option<Listable>,
    pub resource: Option<Resource>,
}

/// One editable field: its blank default and which write operations it
/// participates in.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub default: Value,
    pub enable_create: bool,
    pub enable_update: bool,
}

impl FieldSpec {
    /// Empty-string default, participating in create and update.
    pub fn text() -> FieldSpec {
        FieldSpec {
            default: Value::String(String::new()),
            enable_create: true,
            enable_update: true,
        }
    }
}

/// One searchable field: its legal filter/sort modes and the filter mode
/// its control starts on.
#[derive(Clone, Debug)]
pub struct SearchFieldSpec {
    pub field: String,
    pub caps: SearchCaps,
    pub default_filter: Option<FilterKind>,
}

/// Post-operation hooks, invoked only when present.
#[derive(Default)]
pub struct Hooks {
    /// Runs after a create round-trip with the created resource (when
    /// the server returned one), e.g. to capture a server-assigned id.
    pub after_create: Option<Box<dyn Fn(Option<&Value>) + Send + Sync>>,
    /// Runs after every listing load.
    pub after_load_listing: Option<Box<dyn Fn() + Send + Sync>>,
}

/// Everything a screen declares about its resource.
pub struct ResourceSchema {
    pub resource_name: String,
    pub operations: Operations,
    pub fields: BTreeMap<String, FieldSpec>,
    pub search: Vec<SearchFieldSpec>,
    pub resolve_path_identifiers: IdentifiersResolver,
    pub resolve_primary_identifier: PathResolver,
    /// Values merged over the form payload on create (e.g. the route's
    /// imdb_id for a review).
    pub base_value: Box<dyn Fn() -> Map<String, Value> + Send + Sync>,
    pub hooks: Hooks,
}

impl ResourceSchema {
    /// A schema with no operations, fields, or search rules.
    pub fn new(resource_name: impl Into<String>) -> ResourceSchema {
        ResourceSchema {
            resource_name: resource_name.into(),
            operations: Operations::default(),
            fields: BTreeMap::new(),
            search: Vec::new(),
            resolve_path_identifiers: |_| None,
            resolve_primary_identifier: |_| None,
            base_value: Box::new(Map::new),
            hooks: Hooks::default(),
        }
    }

    pub fn search_spec(&self, field: &str) -> Option<&SearchFieldSpec> {
        self.search.iter().find(|spec| spec.field == field)
    }
}
