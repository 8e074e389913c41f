//! Editable-field bindings: patch-from-resource and dirty-field diffing.

use crate::schema::FieldSpec;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One bound field: current value, dirty marker, write-participation
/// flags.
#[derive(Clone, Debug)]
pub struct FieldBinding {
    pub value: Value,
    pub dirty: bool,
    pub enable_create: bool,
    pub enable_update: bool,
}

/// Binds the schema's editable fields to a resource instance and tracks
/// which of them the user has touched since the last patch.
#[derive(Debug, Default)]
pub struct FormSync {
    fields: BTreeMap<String, FieldBinding>,
}

impl FormSync {
    pub fn from_specs(specs: &BTreeMap<String, FieldSpec>) -> FormSync {
        FormSync {
            fields: specs
                .iter()
                .map(|(name, spec)| {
                    (
                        name.clone(),
                        FieldBinding {
                            value: spec.default.clone(),
                            dirty: false,
                            enable_create: spec.enable_create,
                            enable_update: spec.enable_update,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Edit one field's value, marking it dirty. Unknown fields are
    /// ignored.
    pub fn set(&mut self, field: &str, value: Value) {
        if let Some(binding) = self.fields.get_mut(field) {
            binding.value = value;
            binding.dirty = true;
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).map(|binding| &binding.value)
    }

    /// Copy every declared field from the resource (or the empty default
    /// when the resource lacks it) and mark the form clean. `None`
    /// resets all fields to defaults.
    pub fn patch(&mut self, resource: Option<&Value>) {
        for (name, binding) in &mut self.fields {
            binding.value = resource
                .and_then(|r| r.get(name))
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            binding.dirty = false;
        }
    }

    /// The partial update payload: dirty update-enabled fields only,
    /// stringified.
    pub fn diff(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(_, binding)| binding.dirty && binding.enable_update)
            .map(|(name, binding)| (name.clone(), Value::String(stringify(&binding.value))))
            .collect()
    }

    /// The create payload: create-enabled fields with the base value
    /// merged over them.
    pub fn create_payload(&self, base: &Map<String, Value>) -> Map<String, Value> {
        let mut payload: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(_, binding)| binding.enable_create)
            .map(|(name, binding)| (name.clone(), binding.value.clone()))
            .collect();
        for (key, value) in base {
            payload.insert(key.clone(), value.clone());
        }
        payload
    }

    pub fn is_dirty(&self) -> bool {
        self.fields.values().any(|binding| binding.dirty)
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
