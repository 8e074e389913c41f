//! The declarative schema a screen supplies to the controller.

pub mod types;
pub mod validator;

pub use types::{
    Creatable, Destroyable, FieldSpec, Hooks, IdentifiersResolver, Listable, NotFoundPolicy,
    Operations, PathResolver, Resource, ResourceSchema, SearchFieldSpec, Updatable,
};
pub use validator::validate;
