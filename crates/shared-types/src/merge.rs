//! Non-destructive merger for `type_specific_fields` documents.
//!
//! A patch only ever touches the family owned by the case's type;
//! sibling family keys survive byte-for-byte. This is what lets a case
//! keep field data from a previous life after its type was corrected.

use serde_json::{Map, Value};

use crate::case::CaseType;
use crate::schema::{CaseFamily, FieldKind, FieldSpec};

/// Merge `patch` into the family document for `case_type` inside
/// `current`, returning the whole new `type_specific_fields` value.
///
/// - omitted patch keys keep their stored value
/// - explicit JSON `null` clears a field (the null is stored)
/// - declared sub-objects merge one level deep
/// - declared registration fields are uppercased
/// - negation flags blank their target fields in the same operation
///
/// Pure and idempotent. Last write wins per field.
pub fn merge_fields(current: &Value, case_type: CaseType, patch: &Value) -> Value {
    let family = CaseFamily::for_case_type(case_type);
    let mut root = match current.as_object() {
        Some(obj) => obj.clone(),
        None => Map::new(),
    };

    let key = family.canonical_key();
    let mut doc = root
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(patch_obj) = patch.as_object() {
        apply_patch(family.field_specs(), &mut doc, patch_obj);
    }
    apply_negations(family.field_specs(), &mut doc);

    root.insert(key.to_string(), Value::Object(doc));
    Value::Object(root)
}

fn apply_patch(
    specs: &[FieldSpec],
    doc: &mut Map<String, Value>,
    patch: &Map<String, Value>,
) {
    for (name, value) in patch {
        let spec = specs.iter().find(|s| s.name == name);
        let merged = match (spec.map(|s| s.kind), value.as_object()) {
            (Some(FieldKind::Object(sub_specs)), Some(patch_sub)) => {
                let mut sub = doc
                    .get(name)
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                apply_patch(sub_specs, &mut sub, patch_sub);
                Value::Object(sub)
            }
            _ => normalize(spec, value.clone()),
        };
        doc.insert(name.clone(), merged);
    }
}

fn normalize(spec: Option<&FieldSpec>, value: Value) -> Value {
    match (spec, value) {
        (Some(s), Value::String(text)) if s.uppercase => Value::String(text.to_uppercase()),
        (_, value) => value,
    }
}

fn apply_negations(specs: &[FieldSpec], doc: &mut Map<String, Value>) {
    for spec in specs {
        if spec.clears_on_true.is_empty() {
            continue;
        }
        if doc.get(spec.name) == Some(&Value::Bool(true)) {
            for cleared in spec.clears_on_true {
                doc.insert((*cleared).to_string(), Value::String(String::new()));
            }
        }
    }
}
