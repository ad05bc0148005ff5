//! Target query model for qstream.
//!
//! This crate holds the mutable query objects that a stream chain is lowered
//! into: entity metadata, expression trees, SELECT/UPDATE/DELETE query
//! objects, and rendering to parameterized SQL.

pub mod builder;
pub mod entity;
pub mod error;
pub mod expr;
pub mod macros;
pub mod query;
pub mod render;
pub mod selection;
pub mod traits;
pub mod value;

pub use builder::CriteriaBuilder;
pub use entity::{validate_identifier, Assoc, Attr, Cardinality, EntityType};
pub use error::{CriteriaError, Result};
pub use expr::{Direction, Expr, JoinKind, Order, Source};
pub use query::{CriteriaDelete, CriteriaQuery, CriteriaUpdate, JoinClause, RootClause};
pub use render::{render_delete, render_query, render_update, Dialect, RenderOptions, Statement};
pub use selection::{Selected, Selection};
pub use traits::CommonCriteria;
pub use value::Value;
