//! Query object factory and expression helpers.

use crate::{
    entity::EntityType,
    expr::{AggregateFn, Expr, Function, Source},
    query::{CriteriaDelete, CriteriaQuery, CriteriaUpdate},
};

/// Creates query objects and allocates aliases.
///
/// One builder is used for a whole statement, outer query and subqueries
/// alike, so every alias it hands out is unique within that statement.
/// Alias numbering restarts for every new builder, which makes two builds of
/// the same chain render identically.
#[derive(Debug, Default)]
pub struct CriteriaBuilder {
    next_alias: u32,
}

impl CriteriaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next alias for a source of `entity`, e.g. `e0`, `d1`.
    pub fn alias_for(&mut self, entity: EntityType) -> String {
        let alias = format!("{}{}", entity.alias_prefix(), self.next_alias);
        self.next_alias += 1;
        alias
    }

    /// Creates a source handle with a freshly allocated alias.
    pub fn source(&mut self, entity: EntityType) -> Source {
        let alias = self.alias_for(entity);
        Source::new(alias, entity)
    }

    pub fn create_query(&self) -> CriteriaQuery {
        CriteriaQuery::new()
    }

    pub fn create_subquery(&self) -> CriteriaQuery {
        CriteriaQuery::new_subquery()
    }

    pub fn create_update(&mut self, entity: EntityType) -> CriteriaUpdate {
        let root = self.source(entity);
        CriteriaUpdate::new(root)
    }

    pub fn create_delete(&mut self, entity: EntityType) -> CriteriaDelete {
        let root = self.source(entity);
        CriteriaDelete::new(root)
    }

    pub fn count_all(&self) -> Expr {
        Expr::Aggregate {
            func: AggregateFn::Count,
            arg: None,
            distinct: false,
        }
    }

    pub fn count(&self, expr: Expr) -> Expr {
        aggregate(AggregateFn::Count, expr, false)
    }

    pub fn count_distinct(&self, expr: Expr) -> Expr {
        aggregate(AggregateFn::Count, expr, true)
    }

    pub fn sum(&self, expr: Expr) -> Expr {
        aggregate(AggregateFn::Sum, expr, false)
    }

    pub fn avg(&self, expr: Expr) -> Expr {
        aggregate(AggregateFn::Avg, expr, false)
    }

    pub fn min(&self, expr: Expr) -> Expr {
        aggregate(AggregateFn::Min, expr, false)
    }

    pub fn max(&self, expr: Expr) -> Expr {
        aggregate(AggregateFn::Max, expr, false)
    }

    pub fn coalesce(&self, args: Vec<Expr>) -> Expr {
        Expr::Function {
            func: Function::Coalesce,
            args,
        }
    }

    pub fn lower(&self, expr: Expr) -> Expr {
        function(Function::Lower, expr)
    }

    pub fn upper(&self, expr: Expr) -> Expr {
        function(Function::Upper, expr)
    }

    pub fn abs(&self, expr: Expr) -> Expr {
        function(Function::Abs, expr)
    }

    pub fn exists(&self, subquery: CriteriaQuery) -> Expr {
        Expr::Exists(Box::new(subquery))
    }

    /// Conjunction of all predicates; `None` when there are none.
    pub fn and(&self, predicates: Vec<Expr>) -> Option<Expr> {
        predicates.into_iter().reduce(|acc, p| acc.and(p))
    }

    /// Disjunction of all predicates; `None` when there are none.
    pub fn or(&self, predicates: Vec<Expr>) -> Option<Expr> {
        predicates.into_iter().reduce(|acc, p| acc.or(p))
    }
}

fn aggregate(func: AggregateFn, expr: Expr, distinct: bool) -> Expr {
    Expr::Aggregate {
        func,
        arg: Some(Box::new(expr)),
        distinct,
    }
}

fn function(func: Function, expr: Expr) -> Expr {
    Expr::Function {
        func,
        args: vec![expr],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_unique_per_builder() {
        let mut cb = CriteriaBuilder::new();
        let emp = EntityType::new("employee");
        let dept = EntityType::new("department");

        assert_eq!(cb.alias_for(emp), "e0");
        assert_eq!(cb.alias_for(dept), "d1");
        assert_eq!(cb.alias_for(emp), "e2");

        let mut fresh = CriteriaBuilder::new();
        assert_eq!(fresh.alias_for(emp), "e0");
    }

    #[test]
    fn test_and_of_empty_is_none() {
        let cb = CriteriaBuilder::new();
        assert!(cb.and(vec![]).is_none());
        let p = Expr::literal(true);
        assert_eq!(cb.and(vec![p.clone()]), Some(p));
    }
}
