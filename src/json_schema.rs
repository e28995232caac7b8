// src/json_schema.rs
//! JSON Schema → `ir::Ty`.
//!
//! Covers the subset tool/function-calling contracts actually use:
//! objects with `properties`, `items`, `anyOf`/`oneOf`, `type` arrays,
//! `enum`/`const`, single-element `allOf`, and local `$ref`s into `$defs` or
//! `definitions` (recursive ones included). Anything else lowers to
//! `Ty::Other` with a readable description rather than failing.
//!
//! Property order is the document's order (`serde_json` is built with
//! `preserve_order`). `required` is not consulted: optionality is whatever
//! the schema spells out (`anyOf [.., null]`, `type: [.., "null"]`).
use std::collections::{HashMap, HashSet};

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::descriptor::TyRef;
use crate::ir::{Record, Registry, Ty};
use crate::render::{self, Schema};

#[derive(Debug, Error, PartialEq)]
pub enum JsonSchemaError {
    #[error("no schema at JSON pointer `{0}`")]
    PointerNotFound(String),
    #[error("schema at `{path}` must be an object or boolean, found {found}")]
    NotASchema { path: String, found: &'static str },
    #[error("`{keyword}` at `{path}` must be {expected}")]
    BadKeyword { path: String, keyword: &'static str, expected: &'static str },
    #[error("$ref `{reference}` at `{path}` is not a local reference")]
    ExternalRef { path: String, reference: String },
    #[error("$ref `{reference}` at `{path}` does not resolve")]
    DanglingRef { path: String, reference: String },
}

type Result<T> = std::result::Result<T, JsonSchemaError>;

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

/// Lower a whole JSON Schema document.
pub fn lower_schema(doc: &Value) -> Result<Schema> {
    lower_schema_at(doc, "")
}

/// Lower the sub-schema at `pointer`; `$ref`s still resolve against `doc`.
pub fn lower_schema_at(doc: &Value, pointer: &str) -> Result<Schema> {
    let node = doc
        .pointer(pointer)
        .ok_or_else(|| JsonSchemaError::PointerNotFound(pointer.to_string()))?;
    let mut lowerer = Lowerer::new(doc);
    let root = if is_record_schema(node) {
        let base = node.get("title").and_then(Value::as_str).unwrap_or("Root");
        let name = lowerer.claim_name(base);
        lowerer.resolved.insert(format!("#{pointer}"), Ty::named(&name));
        let record = lowerer.lower_record(node, pointer)?;
        lowerer.registry.define(&name, record)
    } else {
        lowerer.lower(node, pointer)?
    };
    tracing::debug!(definitions = lowerer.registry.len(), "lowered JSON schema");
    Ok(Schema::new(lowerer.registry, root))
}

// ————————————————————————————————————————————————————————————————————————————
// LOWERING
// ————————————————————————————————————————————————————————————————————————————

struct Lowerer<'a> {
    doc: &'a Value,
    registry: Registry,
    /// `$ref` string → lowered type, once known.
    resolved: HashMap<String, Ty>,
    /// Non-record definitions currently being lowered.
    pending: HashSet<String>,
}

impl<'a> Lowerer<'a> {
    fn new(doc: &'a Value) -> Self {
        Self {
            doc,
            registry: Registry::new(),
            resolved: HashMap::new(),
            pending: HashSet::new(),
        }
    }

    fn lower(&mut self, schema: &Value, path: &str) -> Result<Ty> {
        let obj = match schema {
            Value::Bool(true) => return Ok(Ty::other("any")),
            Value::Bool(false) => return Ok(Ty::other("never")),
            Value::Object(obj) => obj,
            other => {
                return Err(JsonSchemaError::NotASchema {
                    path: path.to_string(),
                    found: kind_name(other),
                })
            }
        };

        if let Some(reference) = obj.get("$ref") {
            let reference = reference.as_str().ok_or_else(|| bad(path, "$ref", "a string"))?;
            return self.lower_ref(reference, path);
        }
        if let Some(value) = obj.get("const") {
            return Ok(Ty::other(format!("Literal[{}]", literal(value))));
        }
        if let Some(values) = obj.get("enum") {
            let values = values.as_array().ok_or_else(|| bad(path, "enum", "an array"))?;
            let parts = values.iter().map(literal).collect::<Vec<_>>();
            return Ok(Ty::other(format!("Literal[{}]", parts.join(", "))));
        }
        for keyword in ["anyOf", "oneOf"] {
            if let Some(arms) = obj.get(keyword) {
                let arms = arms.as_array().ok_or_else(|| bad(path, keyword, "an array"))?;
                let members = arms
                    .iter()
                    .enumerate()
                    .map(|(i, arm)| self.lower(arm, &format!("{path}/{keyword}/{i}")))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Ty::Union(members));
            }
        }
        if let Some(parts) = obj.get("allOf") {
            let parts = parts.as_array().ok_or_else(|| bad(path, "allOf", "an array"))?;
            let lowered = parts
                .iter()
                .enumerate()
                .map(|(i, part)| self.lower(part, &format!("{path}/allOf/{i}")))
                .collect::<Result<Vec<_>>>()?;
            return Ok(match <[Ty; 1]>::try_from(lowered) {
                Ok([single]) => single,
                Err(many) => {
                    let texts = many.iter().map(|t| self.text_of(t)).collect::<Vec<_>>();
                    Ty::other(format!("AllOf[{}]", texts.join(", ")))
                }
            });
        }

        match obj.get("type") {
            Some(Value::String(t)) => self.lower_typed(obj, t, path),
            Some(Value::Array(types)) => {
                let members = types
                    .iter()
                    .map(|t| {
                        let t = t.as_str().ok_or_else(|| bad(path, "type", "a string or an array of strings"))?;
                        self.lower_typed(obj, t, path)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Ty::Union(members))
            }
            Some(_) => Err(bad(path, "type", "a string or an array of strings")),
            None if obj.contains_key("properties") => self.lower_typed(obj, "object", path),
            None if obj.contains_key("items") || obj.contains_key("prefixItems") => {
                self.lower_typed(obj, "array", path)
            }
            None => Ok(Ty::other("any")),
        }
    }

    fn lower_typed(&mut self, obj: &Map<String, Value>, t: &str, path: &str) -> Result<Ty> {
        match t {
            "null" => Ok(Ty::Null),
            "string" | "integer" | "number" | "boolean" => Ok(Ty::primitive(t)),
            "object" => {
                if obj.contains_key("properties") {
                    let record = self.lower_record_map(obj, path)?;
                    return Ok(Ty::Record(record));
                }
                match obj.get("additionalProperties") {
                    Some(value @ Value::Object(_)) => {
                        let ty = self.lower(value, &format!("{path}/additionalProperties"))?;
                        Ok(Ty::other(format!("Dict[string, {}]", self.text_of(&ty))))
                    }
                    _ => Ok(Ty::primitive("object")),
                }
            }
            "array" => {
                let tuple = match (obj.get("prefixItems"), obj.get("items")) {
                    (Some(Value::Array(elems)), _) => Some(("prefixItems", elems)),
                    (None, Some(Value::Array(elems))) => Some(("items", elems)),
                    (Some(_), _) => return Err(bad(path, "prefixItems", "an array")),
                    _ => None,
                };
                if let Some((keyword, elems)) = tuple {
                    let mut texts = Vec::with_capacity(elems.len());
                    for (i, elem) in elems.iter().enumerate() {
                        let ty = self.lower(elem, &format!("{path}/{keyword}/{i}"))?;
                        texts.push(self.text_of(&ty));
                    }
                    return Ok(Ty::other(format!("Tuple[{}]", texts.join(", "))));
                }
                match obj.get("items") {
                    Some(items) => Ok(Ty::list(self.lower(items, &format!("{path}/items"))?)),
                    None => Ok(Ty::list(Ty::other("any"))),
                }
            }
            other => Ok(Ty::other(other)),
        }
    }

    fn lower_record(&mut self, schema: &Value, path: &str) -> Result<Record> {
        match schema {
            Value::Object(obj) => self.lower_record_map(obj, path),
            other => Err(JsonSchemaError::NotASchema {
                path: path.to_string(),
                found: kind_name(other),
            }),
        }
    }

    fn lower_record_map(&mut self, obj: &Map<String, Value>, path: &str) -> Result<Record> {
        let props = obj
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| bad(path, "properties", "an object"))?;
        let mut record = match obj.get("title").and_then(Value::as_str) {
            Some(title) => Record::named(title),
            None => Record::new(),
        };
        for (name, prop) in props {
            let ty = self.lower(prop, &format!("{path}/properties/{}", escape_token(name)))?;
            record.push(name.as_str(), ty);
        }
        Ok(record)
    }

    fn lower_ref(&mut self, reference: &str, path: &str) -> Result<Ty> {
        if let Some(ty) = self.resolved.get(reference) {
            return Ok(ty.clone());
        }
        let fragment = reference.strip_prefix('#').ok_or_else(|| JsonSchemaError::ExternalRef {
            path: path.to_string(),
            reference: reference.to_string(),
        })?;
        // URI fragment first, JSON Pointer escapes second.
        let decoded = percent_decode_str(fragment).decode_utf8_lossy();
        let pointer = decoded.as_ref();
        let base = pointer
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(unescape_token)
            .unwrap_or_else(|| "Root".to_string());
        if self.pending.contains(reference) {
            return Ok(Ty::other(format!("<recursive {base}>")));
        }
        let target = self.doc.pointer(pointer).ok_or_else(|| JsonSchemaError::DanglingRef {
            path: path.to_string(),
            reference: reference.to_string(),
        })?;

        if is_record_schema(target) {
            let name = self.claim_name(&base);
            self.resolved.insert(reference.to_string(), Ty::named(&name));
            let record = self.lower_record(target, pointer)?;
            Ok(self.registry.define(&name, record))
        } else {
            self.pending.insert(reference.to_string());
            let ty = self.lower(target, pointer)?;
            self.pending.remove(reference);
            self.resolved.insert(reference.to_string(), ty.clone());
            Ok(ty)
        }
    }

    /// Declare a registry name derived from `base`, suffixing on collision.
    fn claim_name(&mut self, base: &str) -> String {
        if self.registry.declare(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}{n}");
            if self.registry.declare(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn text_of(&self, ty: &Ty) -> String {
        render::describe(&TyRef::new(&self.registry, ty))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn is_record_schema(schema: &Value) -> bool {
    let Some(obj) = schema.as_object() else { return false };
    let typed_object = match obj.get("type") {
        None => true,
        Some(Value::String(t)) => t == "object",
        Some(_) => false,
    };
    typed_object
        && obj.get("properties").is_some_and(Value::is_object)
        && !obj.contains_key("$ref")
        && !obj.contains_key("anyOf")
        && !obj.contains_key("oneOf")
        && !obj.contains_key("allOf")
}

fn bad(path: &str, keyword: &'static str, expected: &'static str) -> JsonSchemaError {
    JsonSchemaError::BadKeyword { path: path.to_string(), keyword, expected }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn literal(v: &Value) -> String {
    match v {
        Value::String(s) => format!("'{s}'"),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

fn escape_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn unescape_token(s: &str) -> String {
    s.replace("~1", "/").replace("~0", "~")
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(doc: Value) -> String {
        lower_schema(&doc).unwrap().render().unwrap()
    }

    #[test]
    fn tool_arguments_render() {
        let doc = json!({
            "title": "SearchArgs",
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "limit": { "anyOf": [{ "type": "integer" }, { "type": "null" }] },
                "filters": {
                    "type": "object",
                    "properties": {
                        "lang": { "type": ["string", "null"] },
                        "since": { "type": "string", "format": "date" }
                    }
                },
                "sort": { "enum": ["asc", "desc"] },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["query"]
        });
        assert_eq!(
            render(doc),
            "{\n    'query': 'string',\n    'limit': Union['integer'],\n    'filters': {\n        'lang': Union['string'],\n        'since': 'string'\n    },\n    'sort': 'Literal['asc', 'desc']',\n    'tags': [string]\n}"
        );
    }

    #[test]
    fn defs_refs_and_list_of_records() {
        let doc = json!({
            "type": "object",
            "properties": {
                "items": { "type": "array", "items": { "$ref": "#/$defs/Item" } },
                "primary": { "$ref": "#/$defs/Item" }
            },
            "$defs": {
                "Item": {
                    "type": "object",
                    "properties": { "id": { "type": "integer" } }
                }
            }
        });
        let schema = lower_schema(&doc).unwrap();
        assert!(schema.registry().contains("Item"));
        assert_eq!(
            schema.render().unwrap(),
            "{\n    'items': [{\n        'id': 'integer'\n    }],\n    'primary': {\n        'id': 'integer'\n    }\n}"
        );
    }

    #[test]
    fn recursive_definition_is_marked() {
        let doc = json!({
            "$ref": "#/definitions/Category",
            "definitions": {
                "Category": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "sub": { "type": "array", "items": { "$ref": "#/definitions/Category" } }
                    }
                }
            }
        });
        assert_eq!(
            render(doc),
            "{\n    'name': 'string',\n    'sub': ['<recursive Category>']\n}"
        );
    }

    #[test]
    fn root_self_reference() {
        let doc = json!({
            "title": "Node",
            "type": "object",
            "properties": { "next": { "anyOf": [{ "$ref": "#" }, { "type": "null" }] } }
        });
        assert_eq!(render(doc), "{\n    'next': Union['<recursive Node>']\n}");
    }

    #[test]
    fn recursive_non_record_alias_terminates() {
        let doc = json!({
            "type": "object",
            "properties": { "payload": { "$ref": "#/$defs/Json" } },
            "$defs": {
                "Json": { "anyOf": [
                    { "type": "string" },
                    { "type": "array", "items": { "$ref": "#/$defs/Json" } }
                ] }
            }
        });
        assert_eq!(render(doc), "{\n    'payload': Union['string', [<recursive Json>]]\n}");
    }

    #[test]
    fn recursive_nullable_object_definition_is_marked() {
        let doc = json!({
            "type": "object",
            "properties": { "head": { "$ref": "#/$defs/N" } },
            "$defs": {
                "N": {
                    "type": ["object", "null"],
                    "properties": {
                        "v": { "type": "integer" },
                        "next": { "$ref": "#/$defs/N" }
                    }
                }
            }
        });
        assert_eq!(
            render(doc),
            "{\n    'head': Union[{\n        'v': 'integer',\n        'next': '<recursive N>'\n    }]\n}"
        );
    }

    #[test]
    fn percent_encoded_ref_resolves() {
        let doc = json!({
            "type": "object",
            "properties": {
                "a": { "$ref": "#/$defs/My%20Type" },
                "b": { "$ref": "#/$defs/a~1b" }
            },
            "$defs": {
                "My Type": { "type": "object", "properties": { "x": { "type": "string" } } },
                "a/b": { "type": "integer" }
            }
        });
        let schema = lower_schema(&doc).unwrap();
        assert!(schema.registry().contains("My Type"));
        assert_eq!(
            schema.render().unwrap(),
            "{\n    'a': {\n        'x': 'string'\n    },\n    'b': 'integer'\n}"
        );
    }

    #[test]
    fn tuples_maps_and_single_all_of() {
        let doc = json!({
            "type": "object",
            "properties": {
                "point": { "type": "array", "prefixItems": [{ "type": "number" }, { "type": "number" }] },
                "labels": { "type": "object", "additionalProperties": { "type": "string" } },
                "owner": { "allOf": [{ "$ref": "#/$defs/User" }] },
                "blob": {},
                "kind": { "const": "v1" }
            },
            "$defs": { "User": { "properties": { "id": { "type": "integer" } } } }
        });
        assert_eq!(
            render(doc),
            "{\n    'point': 'Tuple[number, number]',\n    'labels': 'Dict[string, string]',\n    'owner': {\n        'id': 'integer'\n    },\n    'blob': 'any',\n    'kind': 'Literal['v1']'\n}"
        );
    }

    #[test]
    fn pointer_selects_sub_schema_with_shared_defs() {
        let doc = json!({
            "tools": [{
                "parameters": {
                    "type": "object",
                    "properties": { "who": { "$ref": "#/$defs/Person" } }
                }
            }],
            "$defs": { "Person": { "type": "object", "properties": { "name": { "type": "string" } } } }
        });
        let schema = lower_schema_at(&doc, "/tools/0/parameters").unwrap();
        assert_eq!(
            schema.render().unwrap(),
            "{\n    'who': {\n        'name': 'string'\n    }\n}"
        );
    }

    #[test]
    fn errors_are_descriptive() {
        assert_eq!(
            lower_schema_at(&json!({}), "/nope").unwrap_err(),
            JsonSchemaError::PointerNotFound("/nope".to_string())
        );
        let external = json!({ "properties": { "a": { "$ref": "other.json#/A" } } });
        assert!(matches!(lower_schema(&external), Err(JsonSchemaError::ExternalRef { .. })));
        let dangling = json!({ "properties": { "a": { "$ref": "#/$defs/Missing" } } });
        assert!(matches!(
            lower_schema(&dangling),
            Err(JsonSchemaError::DanglingRef { ref path, .. }) if path == "/properties/a"
        ));
        let bad_type = json!({ "properties": { "a": { "type": 7 } } });
        assert!(matches!(lower_schema(&bad_type), Err(JsonSchemaError::BadKeyword { keyword: "type", .. })));
        let not_schema = json!({ "properties": { "a": 3 } });
        assert!(matches!(lower_schema(&not_schema), Err(JsonSchemaError::NotASchema { .. })));
    }

    #[test]
    fn non_record_root_lowers_but_does_not_render() {
        let schema = lower_schema(&json!({ "type": "array", "items": { "type": "integer" } })).unwrap();
        assert!(schema.render().is_err());
        assert_eq!(schema.render_type(), "[integer]");
    }
}
