//! Movieship SDK: schema-driven REST client engine.
//!
//! A screen declares a [`schema::ResourceSchema`] (capabilities, editable
//! fields, search rules, path resolution) and composes a
//! [`controller::ResourceController`] around it; the controller maps the
//! schema onto REST calls with cursor pagination, debounced search,
//! bearer-token auth, dirty-field diffing, and a cached API root
//! discovery document.

pub mod controller;
pub mod environment;
pub mod error;
pub mod form;
pub mod http;
pub mod notify;
pub mod page;
pub mod path;
pub mod response;
pub mod root;
pub mod schema;
pub mod search;

pub use controller::{LifecycleState, ResourceController, RouteParams};
pub use environment::Environment;
pub use error::{ApiError, BindError, ErrorCode};
pub use http::{
    Anonymous, HttpTransport, Identity, Method, OutboundRequest, RawReply, ReqwestTransport,
    RequestPipeline, StaticToken, TransportError,
};
pub use notify::{Notification, Notifier, Severity, TracingNotifier};
pub use response::{ApiEnvelope, Cursor, PageEnvelope};
pub use root::{ApiRoot, ApiRootCache, MemoryStore, RootEntry, SessionStore};
pub use schema::{
    Creatable, Destroyable, FieldSpec, Hooks, Listable, NotFoundPolicy, Operations, Resource,
    ResourceSchema, SearchFieldSpec, Updatable,
};
pub use search::{FilterKind, SearchCaps, SearchCriterion, DEBOUNCE_WINDOW};
