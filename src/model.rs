//! JSON model definitions.
//!
//! ```json
//! {
//!   "root": "Order",
//!   "records": {
//!     "Order": {
//!       "id": "int",
//!       "items": { "list": "Item" },
//!       "note": { "optional": "str" }
//!     },
//!     "Item": { "sku": "str", "qty": "int" }
//!   }
//! }
//! ```
//!
//! A type expression is either a string (a record defined in `records`,
//! `none`/`null`, or a primitive name taken verbatim) or a single-key object:
//! `list`, `union`, `optional`, `record` (inline fields) or `other` (text).
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::ir::{Record, Registry, Ty};
use crate::path_de::{self, PathError};
use crate::render::Schema;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid model definition {0}")]
    Parse(#[from] PathError),
    #[error("model defines no records")]
    Empty,
    #[error("root record `{0}` is not defined in `records`")]
    UnknownRoot(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Model {
    #[serde(default)]
    pub root: Option<String>,
    pub records: IndexMap<String, IndexMap<String, TypeExpr>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Name(String),
    Compound(Compound),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compound {
    List(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    Optional(Box<TypeExpr>),
    Record(IndexMap<String, TypeExpr>),
    Other(String),
}

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

pub fn parse_model(src: &str) -> Result<Model, ModelError> {
    Ok(path_de::from_str_with_path(src)?)
}

pub fn model_from_value(value: serde_json::Value) -> Result<Model, ModelError> {
    Ok(path_de::from_value_with_path(value)?)
}

impl Model {
    /// Build the schema rooted at `root` (or the model's own root, or the
    /// first record).
    pub fn schema(&self, root: Option<&str>) -> Result<Schema, ModelError> {
        let root = match root.or(self.root.as_deref()) {
            Some(name) => name,
            None => self.records.keys().next().map(String::as_str).ok_or(ModelError::Empty)?,
        };
        if !self.records.contains_key(root) {
            return Err(ModelError::UnknownRoot(root.to_string()));
        }

        let mut registry = Registry::new();
        for (name, fields) in &self.records {
            let record = self.lower_fields(fields);
            registry.define(name.as_str(), record);
        }
        tracing::debug!(records = registry.len(), root, "built model schema");
        Ok(Schema::new(registry, Ty::named(root)))
    }

    fn lower_fields(&self, fields: &IndexMap<String, TypeExpr>) -> Record {
        let mut record = Record::new();
        for (name, expr) in fields {
            record.push(name.as_str(), self.lower(expr));
        }
        record
    }

    fn lower(&self, expr: &TypeExpr) -> Ty {
        match expr {
            TypeExpr::Name(name) if self.records.contains_key(name) => Ty::named(name.as_str()),
            TypeExpr::Name(name) if matches!(name.as_str(), "none" | "null" | "None") => Ty::Null,
            TypeExpr::Name(name) => Ty::primitive(name.as_str()),
            TypeExpr::Compound(Compound::List(item)) => Ty::list(self.lower(item)),
            TypeExpr::Compound(Compound::Union(members)) => {
                Ty::union(members.iter().map(|m| self.lower(m)))
            }
            TypeExpr::Compound(Compound::Optional(inner)) => Ty::optional(self.lower(inner)),
            TypeExpr::Compound(Compound::Record(fields)) => Ty::Record(self.lower_fields(fields)),
            TypeExpr::Compound(Compound::Other(text)) => Ty::other(text.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: &str = r#"{
        "root": "Order",
        "records": {
            "Item": { "sku": "str", "qty": "int" },
            "Order": {
                "id": "int",
                "items": { "list": "Item" },
                "note": { "optional": "str" },
                "status": { "other": "Literal['open', 'closed']" },
                "meta": { "record": { "source": { "union": ["str", "int", "none"] } } }
            }
        }
    }"#;

    #[test]
    fn model_renders_from_declared_root() {
        let out = parse_model(ORDER).unwrap().schema(None).unwrap().render().unwrap();
        assert_eq!(
            out,
            "{\n    'id': 'int',\n    'items': [{\n        'sku': 'str',\n        'qty': 'int'\n    }],\n    'note': Union['str'],\n    'status': 'Literal['open', 'closed']',\n    'meta': {\n        'source': Union['str', 'int']\n    }\n}"
        );
    }

    #[test]
    fn root_override_and_default() {
        let model = parse_model(ORDER).unwrap();
        let item = model.schema(Some("Item")).unwrap().render().unwrap();
        assert_eq!(item, "{\n    'sku': 'str',\n    'qty': 'int'\n}");

        let no_root = parse_model(r#"{"records": {"A": {"x": "int"}, "B": {}}}"#).unwrap();
        assert_eq!(no_root.schema(None).unwrap().root(), &Ty::named("A"));
    }

    #[test]
    fn recursive_model() {
        let model = parse_model(r#"{"records": {"Node": {"next": {"optional": "Node"}}}}"#).unwrap();
        assert_eq!(
            model.schema(None).unwrap().render().unwrap(),
            "{\n    'next': Union['<recursive Node>']\n}"
        );
    }

    #[test]
    fn errors() {
        let model = parse_model(ORDER).unwrap();
        assert!(matches!(model.schema(Some("Nope")), Err(ModelError::UnknownRoot(name)) if name == "Nope"));
        assert!(matches!(
            parse_model(r#"{"records": {}}"#).unwrap().schema(None),
            Err(ModelError::Empty)
        ));
        match parse_model(r#"{"records": {"A": {"x": 5}}}"#) {
            Err(ModelError::Parse(err)) => assert_eq!(err.path, "records.A.x"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn model_from_json_value() {
        let value = serde_json::json!({"records": {"P": {"x": "float"}}});
        let out = model_from_value(value).unwrap().schema(None).unwrap().render().unwrap();
        assert_eq!(out, "{\n    'x': 'float'\n}");
    }
}
