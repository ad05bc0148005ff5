//! The contract shared by every query object.

use crate::{
    builder::CriteriaBuilder,
    entity::{Assoc, EntityType},
    error::Result,
    expr::{Expr, JoinKind, Source},
};

/// Operations available on SELECT, UPDATE and DELETE query objects alike.
///
/// Query objects accumulate clauses: `from` and `join` register sources and
/// return handles to them, and the restriction is a single slot the caller
/// reads and overwrites. Combining several predicates into that slot is the
/// caller's job.
pub trait CommonCriteria {
    /// Human readable query kind, e.g. `"select"`.
    fn kind_name(&self) -> &'static str;

    /// The primary root, if one exists yet.
    fn root(&self) -> Option<&Source>;

    /// Adds a new root.
    fn from(&mut self, entity: EntityType, cb: &mut CriteriaBuilder) -> Result<Source>;

    /// Joins `assoc` starting at `parent`, which must belong to this query.
    fn join(
        &mut self,
        parent: &Source,
        assoc: &Assoc,
        kind: JoinKind,
        cb: &mut CriteriaBuilder,
    ) -> Result<Source>;

    fn restriction(&self) -> Option<&Expr>;

    fn set_restriction(&mut self, restriction: Expr);
}
