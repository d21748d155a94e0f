//! Core model shared by every stage of a sync run.
//!
//! - [`kind`]: object kinds, fill modes and template keys
//! - [`schema`]: schemas, objects, links, fill targets and object states
//! - [`value`]: driver values and materialized result rows

pub mod kind;
pub mod schema;
pub mod value;

pub use kind::{FillMode, ObjectKind, TemplateKey};
pub use schema::{DbObject, FillTarget, Link, ObjectState, Schema};
pub use value::{materialize_rows, BufferedLob, LargeObject, RawRecord, RawRow, RawValue, Row, Value};
