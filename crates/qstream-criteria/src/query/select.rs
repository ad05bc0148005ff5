//! SELECT query objects, used both for top-level queries and subqueries.

use crate::{
    builder::CriteriaBuilder,
    entity::{Assoc, EntityType},
    error::Result,
    expr::{Expr, JoinKind, Order, Source},
    query::clause::{attach_join, RootClause},
    traits::CommonCriteria,
};

/// A clause-accumulating SELECT.
///
/// Grouping, ordering and having are single slots that are replaced by their
/// setters; accumulation policies belong to whoever drives the query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CriteriaQuery {
    subquery: bool,
    distinct: bool,
    selection: Vec<Expr>,
    roots: Vec<RootClause>,
    restriction: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl CriteriaQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_subquery() -> Self {
        Self {
            subquery: true,
            ..Self::default()
        }
    }

    pub fn is_subquery(&self) -> bool {
        self.subquery
    }

    /// Replaces the SELECT list.
    pub fn select(&mut self, selection: Vec<Expr>) {
        self.selection = selection;
    }

    pub fn selection(&self) -> &[Expr] {
        &self.selection
    }

    pub fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn roots(&self) -> &[RootClause] {
        &self.roots
    }

    /// Replaces the GROUP BY list.
    pub fn set_group_by(&mut self, group_by: Vec<Expr>) {
        self.group_by = group_by;
    }

    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    pub fn set_having(&mut self, having: Expr) {
        self.having = Some(having);
    }

    pub fn having(&self) -> Option<&Expr> {
        self.having.as_ref()
    }

    /// Replaces the ORDER BY list.
    pub fn set_order_by(&mut self, order_by: Vec<Order>) {
        self.order_by = order_by;
    }

    pub fn order_by(&self) -> &[Order] {
        &self.order_by
    }

    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.limit = limit;
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn set_offset(&mut self, offset: Option<u64>) {
        self.offset = offset;
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl CommonCriteria for CriteriaQuery {
    fn kind_name(&self) -> &'static str {
        if self.subquery {
            "subquery"
        } else {
            "select"
        }
    }

    fn root(&self) -> Option<&Source> {
        self.roots.first().map(|root| &root.source)
    }

    fn from(&mut self, entity: EntityType, cb: &mut CriteriaBuilder) -> Result<Source> {
        entity.validate()?;
        let source = cb.source(entity);
        self.roots.push(RootClause::new(source.clone()));
        Ok(source)
    }

    fn join(
        &mut self,
        parent: &Source,
        assoc: &Assoc,
        kind: JoinKind,
        cb: &mut CriteriaBuilder,
    ) -> Result<Source> {
        attach_join(&mut self.roots, parent, assoc, kind, cb)
    }

    fn restriction(&self) -> Option<&Expr> {
        self.restriction.as_ref()
    }

    fn set_restriction(&mut self, restriction: Expr) {
        self.restriction = Some(restriction);
    }
}
