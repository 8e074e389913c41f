//! Schema validation: internal consistency before a controller is built.

use crate::error::BindError;
use crate::schema::ResourceSchema;
use std::collections::HashSet;

pub fn validate(schema: &ResourceSchema) -> Result<(), BindError> {
    if schema.resource_name.trim().is_empty() {
        return Err(BindError::Schema("resource name must not be empty".into()));
    }

    let ops = &schema.operations;
    if ops.creatable.is_none()
        && ops.destroyable.is_none()
        && ops.updatable.is_none()
        && ops.listable.is_none()
        && ops.resource.is_none()
    {
        return Err(BindError::Schema(format!(
            "schema '{}' enables no operations",
            schema.resource_name
        )));
    }

    let mut seen = HashSet::new();
    for spec in &schema.search {
        if !seen.insert(spec.field.as_str()) {
            return Err(BindError::Schema(format!(
                "duplicate search field '{}'",
                spec.field
            )));
        }
        if !spec.caps.any() {
            return Err(BindError::Schema(format!(
                "search field '{}' enables no filter or sort mode",
                spec.field
            )));
        }
    }

    Ok(())
}
