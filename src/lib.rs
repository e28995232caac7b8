//! Render nested type definitions (records, lists, unions, primitives) as
//! an indented, quoted, JSON-like schema string for prompts and docs.
//!
//! ```
//! use shape_schema::ir::{Record, Ty};
//! use shape_schema::Schema;
//!
//! let root = Record::new()
//!     .field("a", Ty::primitive("Int"))
//!     .field("b", Ty::optional(Ty::primitive("String")));
//! let out = Schema::new(Default::default(), root.into()).render().unwrap();
//! assert_eq!(out, "{\n    'a': 'Int',\n    'b': Union['String']\n}");
//! ```
pub mod ir;
pub mod descriptor;
pub mod render;
pub mod describe;
pub mod json_schema;
pub mod model;
pub mod path_de;
pub mod jq_exec;
pub mod telemetry;
pub mod cli;

pub use descriptor::{Shape, TyRef, TypeDescriptor};
pub use describe::{Describe, schema_of};
pub use render::{RenderError, Renderer, Schema, describe, render, render_type};
