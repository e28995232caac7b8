//! The capability interface the renderer consumes.
//!
//! A host type system plugs in by implementing [`TypeDescriptor`]. The
//! renderer only ever asks two questions: what shape is this type, and (for
//! records) what identity does it have, so that recursive definitions can be
//! cut off instead of expanding forever.
use std::borrow::Cow;

use crate::ir::{Registry, Ty};

/// Classification of a single type descriptor.
#[derive(Debug, Clone)]
pub enum Shape<'a, D> {
    /// Ordered fields, declaration order.
    Record { name: Option<&'a str>, fields: Vec<(&'a str, D)> },
    /// Homogeneous list; the element type.
    List(D),
    /// Alternatives in declared order. May contain a `Null` member.
    Union(Vec<D>),
    /// The none/null alternative.
    Null,
    /// Display name, rendered verbatim.
    Primitive(&'a str),
    /// Unrecognized. Carries the best available description.
    Other(Cow<'a, str>),
}

pub trait TypeDescriptor: Sized {
    fn shape(&self) -> Shape<'_, Self>;

    /// Identity used for cycle detection. Only types that can be reached
    /// again through a reference (named definitions) need one.
    fn record_id(&self) -> Option<Cow<'_, str>> {
        None
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IR VIEW
// ————————————————————————————————————————————————————————————————————————————

/// A `Ty` seen through the `Registry` that resolves its `Named` references.
#[derive(Debug, Clone, Copy)]
pub struct TyRef<'a> {
    registry: &'a Registry,
    ty: &'a Ty,
}

impl<'a> TyRef<'a> {
    pub fn new(registry: &'a Registry, ty: &'a Ty) -> Self {
        Self { registry, ty }
    }

    pub fn ty(&self) -> &'a Ty {
        self.ty
    }

    fn child(&self, ty: &'a Ty) -> Self {
        Self { registry: self.registry, ty }
    }
}

impl<'a> TypeDescriptor for TyRef<'a> {
    fn shape(&self) -> Shape<'_, Self> {
        match self.ty {
            Ty::Record(record) => Shape::Record {
                name: record.name.as_deref(),
                fields: record
                    .fields
                    .iter()
                    .map(|f| (f.name.as_str(), self.child(&f.ty)))
                    .collect(),
            },
            Ty::Named(name) => match self.registry.get(name) {
                Some(record) => Shape::Record {
                    name: Some(name.as_str()),
                    fields: record
                        .fields
                        .iter()
                        .map(|f| (f.name.as_str(), self.child(&f.ty)))
                        .collect(),
                },
                None => {
                    tracing::debug!(target: "shape_schema::render", name = %name, "unresolved reference");
                    Shape::Other(Cow::Borrowed(name.as_str()))
                }
            },
            Ty::List(item) => Shape::List(self.child(item)),
            Ty::Union(members) => Shape::Union(members.iter().map(|m| self.child(m)).collect()),
            Ty::Null => Shape::Null,
            Ty::Primitive(name) => Shape::Primitive(name.as_str()),
            Ty::Other(text) => Shape::Other(Cow::Borrowed(text.as_str())),
        }
    }

    fn record_id(&self) -> Option<Cow<'_, str>> {
        match self.ty {
            Ty::Named(name) if self.registry.contains(name) => Some(Cow::Borrowed(name.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Record;

    #[test]
    fn named_resolves_through_registry() {
        let mut reg = Registry::new();
        let user = reg.define("User", Record::new().field("id", Ty::primitive("int")));
        let view = TyRef::new(&reg, &user);
        match view.shape() {
            Shape::Record { name, fields } => {
                assert_eq!(name, Some("User"));
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].0, "id");
            }
            other => panic!("expected record, got {other:?}"),
        }
        assert_eq!(view.record_id().as_deref(), Some("User"));
    }

    #[test]
    fn dangling_reference_is_other() {
        let reg = Registry::new();
        let ty = Ty::named("Missing");
        let view = TyRef::new(&reg, &ty);
        assert!(matches!(view.shape(), Shape::Other(text) if text == "Missing"));
        assert!(view.record_id().is_none());
    }

    #[test]
    fn inline_records_have_no_identity() {
        let reg = Registry::new();
        let ty: Ty = Record::named("Inline").field("x", Ty::primitive("int")).into();
        assert!(TyRef::new(&reg, &ty).record_id().is_none());
    }
}
