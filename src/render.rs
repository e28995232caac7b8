//! Schema rendering.
//!
//! Output grammar (4 spaces per nesting level, no trailing commas):
//!
//! ```text
//! {
//!     'field_a': 'TypeName',
//!     'field_b': [TypeName],
//!     'field_c': {
//!         'nested_field': 'TypeName'
//!     },
//!     'field_d': Union['TypeA', 'TypeB']
//! }
//! ```
//!
//! Rendering never fails once the root is accepted: types outside the shape
//! vocabulary are rendered as their quoted description, and a record that is
//! re-entered while it is still being expanded is rendered as
//! `'<recursive Name>'`.
//!
//! Two degenerate cases are kept compact: a record with no fields renders as
//! `{}` (and `[{}]` as a list element) rather than a brace pair around an
//! empty line, and a union whose members are all null renders as `'None'`
//! rather than `Union[]`.
use std::borrow::Cow;

use thiserror::Error;
use tracing::trace;

use crate::descriptor::{Shape, TyRef, TypeDescriptor};
use crate::ir::{Registry, Ty};

const INDENT: usize = 4;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("root type must be a record, found `{found}`")]
    NonRecordRoot { found: String },
    #[error("no record named `{0}` is defined")]
    UnknownRecord(String),
}

/// Walk state for one render call: the records currently being expanded.
#[derive(Debug, Default)]
pub struct Renderer {
    in_progress: Vec<String>,
}

/// A root type together with the definitions it refers to.
#[derive(Debug, Clone)]
pub struct Schema {
    registry: Registry,
    root: Ty,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Render a record type. Fails fast if `root` is not a record.
pub fn render<D: TypeDescriptor>(root: &D) -> Result<String, RenderError> {
    if !matches!(root.shape(), Shape::Record { .. }) {
        return Err(RenderError::NonRecordRoot { found: describe(root) });
    }
    Ok(render_type(root))
}

/// Render any type as a single unnamed value at depth 0.
///
/// For a record this is byte-identical to [`render`]; for anything else it
/// yields the same text the type would get as a field value.
#[tracing::instrument(level = "debug", name = "shape_schema.render", skip_all)]
pub fn render_type<D: TypeDescriptor>(root: &D) -> String {
    let out = Renderer::new().render_field_type(root, 0);
    tracing::debug!(bytes = out.len(), "rendered schema");
    out
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field lines of `record` at `depth`, joined by `",\n"`, without the
    /// enclosing braces. `None` if `record` is not a record.
    pub fn render_record<D: TypeDescriptor>(&mut self, record: &D, depth: usize) -> Option<String> {
        match record.shape() {
            Shape::Record { fields, .. } => Some(self.record_body(&fields, depth)),
            _ => None,
        }
    }

    /// Render one field's type; `depth` is the nesting level of the field.
    pub fn render_field_type<D: TypeDescriptor>(&mut self, ty: &D, depth: usize) -> String {
        match ty.shape() {
            Shape::List(item) => {
                if matches!(item.shape(), Shape::Record { .. }) {
                    trace!(target: "shape_schema::render", depth, "list of records");
                    format!("[{}]", self.render_field_type(&item, depth))
                } else {
                    format!("[{}]", describe(&item))
                }
            }
            Shape::Union(members) => {
                let arms = members
                    .iter()
                    .filter(|m| !matches!(m.shape(), Shape::Null))
                    .map(|m| self.render_field_type(m, depth))
                    .collect::<Vec<_>>();
                if arms.is_empty() {
                    "'None'".to_string()
                } else {
                    format!("Union[{}]", arms.join(", "))
                }
            }
            Shape::Record { name, fields } => {
                let id = ty.record_id().map(Cow::into_owned);
                if let Some(id) = &id {
                    if self.in_progress.contains(id) {
                        trace!(target: "shape_schema::render", depth, record = %id, "recursive reference");
                        return format!("'<recursive {id}>'");
                    }
                    self.in_progress.push(id.clone());
                }
                trace!(target: "shape_schema::render", depth, record = name.unwrap_or("<inline>"), "expand record");
                let out = if fields.is_empty() {
                    "{}".to_string()
                } else {
                    let body = self.record_body(&fields, depth);
                    format!("{{\n{body}\n{}}}", pad(depth))
                };
                if id.is_some() {
                    self.in_progress.pop();
                }
                out
            }
            Shape::Null => "'None'".to_string(),
            Shape::Primitive(name) => format!("'{name}'"),
            Shape::Other(text) => {
                trace!(target: "shape_schema::render", depth, text = %text, "fallback");
                format!("'{text}'")
            }
        }
    }

    fn record_body<D: TypeDescriptor>(&mut self, fields: &[(&str, D)], depth: usize) -> String {
        let indent = pad(depth + 1);
        fields
            .iter()
            .map(|(name, ty)| {
                trace!(target: "shape_schema::render", depth = depth + 1, field = %name, "field");
                format!("{indent}'{name}': {}", self.render_field_type(ty, depth + 1))
            })
            .collect::<Vec<_>>()
            .join(",\n")
    }
}

fn pad(depth: usize) -> String {
    " ".repeat(INDENT * depth)
}

/// Compact, unquoted, single-line description of a type.
///
/// Used for list elements that are not records and for error messages.
/// Records are described by name when they have one, so this never
/// recurses through a named definition.
pub fn describe<D: TypeDescriptor>(ty: &D) -> String {
    match ty.shape() {
        Shape::Primitive(name) => name.to_string(),
        Shape::Null => "None".to_string(),
        Shape::Other(text) => text.into_owned(),
        Shape::List(item) => format!("List[{}]", describe(&item)),
        Shape::Union(members) => {
            let arms = members
                .iter()
                .filter(|m| !matches!(m.shape(), Shape::Null))
                .map(describe)
                .collect::<Vec<_>>();
            if arms.is_empty() {
                "None".to_string()
            } else {
                format!("Union[{}]", arms.join(", "))
            }
        }
        Shape::Record { name: Some(name), .. } => name.to_string(),
        Shape::Record { name: None, fields } => {
            let inner = fields
                .iter()
                .map(|(name, ty)| format!("{name}: {}", describe(ty)))
                .collect::<Vec<_>>();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IR CONVENIENCE
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    pub fn new(registry: Registry, root: Ty) -> Self {
        Self { registry, root }
    }

    pub fn root(&self) -> &Ty {
        &self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn view(&self) -> TyRef<'_> {
        TyRef::new(&self.registry, &self.root)
    }

    pub fn render(&self) -> Result<String, RenderError> {
        render(&self.view())
    }

    pub fn render_type(&self) -> String {
        render_type(&self.view())
    }

    /// Same definitions, different root.
    pub fn with_root(self, root: Ty) -> Self {
        Self { registry: self.registry, root }
    }
}

impl Registry {
    /// Render the named definition as a root record.
    pub fn render(&self, name: &str) -> Result<String, RenderError> {
        if !self.contains(name) {
            return Err(RenderError::UnknownRecord(name.to_string()));
        }
        let root = Ty::named(name);
        render(&TyRef::new(self, &root))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
