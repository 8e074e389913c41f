//! The four Movieship screens as thin schema configuration.

use movieship_sdk::{
    Creatable, Destroyable, FieldSpec, FilterKind, Listable, NotFoundPolicy, Resource,
    ResourceSchema, SearchCaps, SearchFieldSpec, Updatable,
};
use serde_json::{Map, Value};

fn searchable(field: &str) -> SearchFieldSpec {
    SearchFieldSpec {
        field: field.into(),
        caps: SearchCaps::all(),
        default_filter: Some(FilterKind::Like),
    }
}

/// Explore: browse and filter the title catalog; detail routes show one
/// title.
pub fn explore_schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new("Explore");
    schema.operations.listable = Some(Listable {
        resolve_path: |api| api.template("EXPLORE_LISTING"),
        on_init_action: true,
    });
    schema.operations.resource = Some(Resource {
        resolve_path: |api| api.template("EXPLORE_RESOURCE"),
        on_not_found: NotFoundPolicy::Error,
        on_init_action: true,
    });
    schema.resolve_path_identifiers = |api| api.identifiers("EXPLORE_PATH_IDENTIFIERS");
    schema.resolve_primary_identifier = |api| api.template("EXPLORE_PRIMARY_IDENTIFIER");
    schema.search = vec![
        searchable("imdb_id"),
        searchable("primaryTitle"),
        searchable("titleType"),
    ];
    schema
}

/// Review: one review per user per title, created under the title's
/// detail route.
pub fn review_schema(imdb_id: String) -> ResourceSchema {
    let mut schema = ResourceSchema::new("Review");
    schema.operations.creatable = Some(Creatable {
        resolve_path: |api| api.template("REVIEW_CREATE"),
    });
    schema.operations.updatable = Some(Updatable {
        resolve_path: |api| api.template("REVIEW_UPDATE"),
    });
    schema.operations.destroyable = Some(Destroyable {
        resolve_path: |api| api.template("REVIEW_DELETE"),
    });
    schema.operations.listable = Some(Listable {
        resolve_path: |api| api.template("REVIEW_LISTING"),
        on_init_action: true,
    });
    schema.operations.resource = Some(Resource {
        resolve_path: |api| api.template("REVIEW_RESOURCE"),
        on_not_found: NotFoundPolicy::TreatAsCreate,
        on_init_action: true,
    });
    schema.resolve_path_identifiers = |api| api.identifiers("REVIEW_PATH_IDENTIFIERS");
    schema.fields.insert(
        "comment".into(),
        FieldSpec {
            default: Value::String(String::new()),
            enable_create: true,
            enable_update: false,
        },
    );
    schema.fields.insert(
        "rating".into(),
        FieldSpec {
            default: Value::Null,
            enable_create: true,
            enable_update: false,
        },
    );
    // The reviewed title comes from the route, not the form.
    schema.base_value = Box::new(move || {
        let mut base = Map::new();
        base.insert("imdb_id".into(), Value::String(imdb_id.clone()));
        base
    });
    schema
}

/// Profile: a singleton resource; a missing profile flips the screen into
/// create mode.
pub fn profile_schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new("Profile");
    schema.operations.resource = Some(Resource {
        resolve_path: |api| api.template("PROFILE_RESOURCE"),
        on_not_found: NotFoundPolicy::TreatAsCreate,
        on_init_action: true,
    });
    schema.operations.creatable = Some(Creatable {
        resolve_path: |api| api.template("PROFILE_CREATE"),
    });
    schema.operations.updatable = Some(Updatable {
        resolve_path: |api| api.template("PROFILE_UPDATE"),
    });
    schema.fields.insert(
        "name".into(),
        FieldSpec {
            default: Value::String(String::new()),
            enable_create: false,
            enable_update: false,
        },
    );
    schema
}

/// Watchlist: full CRUD; the acted-on list is picked from the listing via
/// a selected identifier, and a freshly created list captures its
/// server-assigned id through the after-create hook.
pub fn watchlist_schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new("Watchlist");
    schema.operations.resource = Some(Resource {
        resolve_path: |api| api.template("WATCHLIST_RESOURCE"),
        on_not_found: NotFoundPolicy::Error,
        on_init_action: false,
    });
    schema.operations.creatable = Some(Creatable {
        resolve_path: |api| api.template("WATCHLIST_CREATE"),
    });
    schema.operations.updatable = Some(Updatable {
        resolve_path: |api| api.template("WATCHLIST_UPDATE"),
    });
    schema.operations.listable = Some(Listable {
        resolve_path: |api| api.template("WATCHLIST_LISTING"),
        on_init_action: true,
    });
    schema.operations.destroyable = Some(Destroyable {
        resolve_path: |api| api.template("WATCHLIST_DELETE"),
    });
    schema.resolve_path_identifiers = |api| api.identifiers("WATCHLIST_PATH_IDENTIFIERS");
    schema.resolve_primary_identifier = |api| api.template("WATCHLIST_PRIMARY_IDENTIFIER");
    schema.fields.insert(
        "title".into(),
        FieldSpec {
            default: Value::String(String::new()),
            enable_create: true,
            enable_update: false,
        },
    );
    schema.fields.insert(
        "watchlist_movies".into(),
        FieldSpec {
            default: Value::Array(Vec::new()),
            enable_create: true,
            enable_update: false,
        },
    );
    schema
}
