//! Query kinds and the target objects they build.
//!
//! A stream's kind decides which query object a build allocates and what
//! the terminal operations produce. The kind is carried in the stream type
//! as a [`Kind`] marker and resolved to a [`QueryKind`] value once per build.

use qstream_criteria::{
    render_delete, render_query, render_update, CommonCriteria, CriteriaBuilder, CriteriaDelete,
    CriteriaError, CriteriaQuery, CriteriaUpdate, EntityType, Expr, RenderOptions, Selected,
    Source, Statement,
};

use crate::{context::FrameKind, error::Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// SELECT returning rows or a single value.
    Search,
    /// Bulk UPDATE returning the affected row count.
    Update,
    /// Bulk DELETE returning the affected row count.
    Delete,
}

impl QueryKind {
    pub fn name(self) -> &'static str {
        match self {
            QueryKind::Search => "search",
            QueryKind::Update => "update",
            QueryKind::Delete => "delete",
        }
    }

    pub(crate) fn frame_kind(self) -> FrameKind {
        match self {
            QueryKind::Search => FrameKind::Query,
            QueryKind::Update => FrameKind::Update,
            QueryKind::Delete => FrameKind::Delete,
        }
    }

    /// Allocates a fresh target rooted at `entity` and returns it with its
    /// root handle.
    pub(crate) fn allocate(
        self,
        entity: EntityType,
        subquery: bool,
        cb: &mut CriteriaBuilder,
    ) -> Result<(Target, Source)> {
        let target = match self {
            QueryKind::Search => {
                let mut query = if subquery {
                    cb.create_subquery()
                } else {
                    cb.create_query()
                };
                let root = query.from(entity, cb)?;
                return Ok((Target::Query(query), root));
            }
            QueryKind::Update => Target::Update(cb.create_update(entity)),
            QueryKind::Delete => Target::Delete(cb.create_delete(entity)),
        };

        let root = target
            .criteria()
            .root()
            .cloned()
            .ok_or(CriteriaError::MissingRoot(target.kind_name()))?;
        Ok((target, root))
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Type-level query kind of a stream.
pub trait Kind: sealed::Sealed + Send + Sync + 'static {
    const QUERY_KIND: QueryKind;
}

#[derive(Debug, Clone, Copy)]
pub struct Search;

#[derive(Debug, Clone, Copy)]
pub struct Update;

#[derive(Debug, Clone, Copy)]
pub struct Delete;

macro_rules! impl_kind {
    ($($marker:ident => $kind:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $marker {}

            impl Kind for $marker {
                const QUERY_KIND: QueryKind = $kind;
            }
        )*
    };
}

impl_kind!(
    Search => QueryKind::Search,
    Update => QueryKind::Update,
    Delete => QueryKind::Delete,
);

/// The query object a build writes into.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Query(CriteriaQuery),
    Update(CriteriaUpdate),
    Delete(CriteriaDelete),
}

impl Target {
    pub fn kind_name(&self) -> &'static str {
        self.criteria().kind_name()
    }

    pub fn criteria(&self) -> &dyn CommonCriteria {
        match self {
            Target::Query(query) => query,
            Target::Update(update) => update,
            Target::Delete(delete) => delete,
        }
    }

    pub fn criteria_mut(&mut self) -> &mut dyn CommonCriteria {
        match self {
            Target::Query(query) => query,
            Target::Update(update) => update,
            Target::Delete(delete) => delete,
        }
    }

    /// The SELECT object, or `Unsupported` naming `op` for other kinds.
    pub fn query_mut(&mut self, op: &'static str) -> Result<&mut CriteriaQuery> {
        match self {
            Target::Query(query) => Ok(query),
            other => Err(CriteriaError::Unsupported {
                op,
                kind: other.kind_name(),
            }
            .into()),
        }
    }

    /// ANDs `predicate` into the restriction; the first one becomes the
    /// whole restriction.
    pub fn restrict(&mut self, predicate: Expr) {
        let criteria = self.criteria_mut();
        let combined = match criteria.restriction() {
            Some(existing) => existing.clone().and(predicate),
            None => predicate,
        };
        criteria.set_restriction(combined);
    }

    /// Makes `selected` the SELECT list. Updates and deletes ignore it.
    pub(crate) fn apply_selection(&mut self, selected: &Selected) {
        if let Target::Query(query) = self {
            query.select(selected.expressions());
        }
    }

    pub fn render(&self, options: RenderOptions) -> Result<Statement> {
        let statement = match self {
            Target::Query(query) => render_query(query, options)?,
            Target::Update(update) => render_update(update, options)?,
            Target::Delete(delete) => render_delete(delete, options)?,
        };
        Ok(statement)
    }

    pub fn into_query(self) -> Result<CriteriaQuery> {
        match self {
            Target::Query(query) => Ok(query),
            other => Err(unsupported("select", &other)),
        }
    }

    pub fn into_update(self) -> Result<CriteriaUpdate> {
        match self {
            Target::Update(update) => Ok(update),
            other => Err(unsupported("update", &other)),
        }
    }

    pub fn into_delete(self) -> Result<CriteriaDelete> {
        match self {
            Target::Delete(delete) => Ok(delete),
            other => Err(unsupported("delete", &other)),
        }
    }
}

fn unsupported(op: &'static str, target: &Target) -> crate::error::StreamError {
    CriteriaError::Unsupported {
        op,
        kind: target.kind_name(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPLOYEE: EntityType = EntityType::new("employee");

    #[test]
    fn test_allocate_each_kind() {
        let mut cb = CriteriaBuilder::new();
        let (search, root) = QueryKind::Search.allocate(EMPLOYEE, false, &mut cb).unwrap();
        assert_eq!(root.alias(), "e0");
        assert_eq!(search.kind_name(), "select");

        let (sub, _) = QueryKind::Search.allocate(EMPLOYEE, true, &mut cb).unwrap();
        assert_eq!(sub.kind_name(), "subquery");

        let (update, root) = QueryKind::Update.allocate(EMPLOYEE, false, &mut cb).unwrap();
        assert_eq!(root.alias(), "e2");
        assert!(matches!(update, Target::Update(_)));

        let (delete, _) = QueryKind::Delete.allocate(EMPLOYEE, false, &mut cb).unwrap();
        assert!(delete.into_query().is_err());
    }

    #[test]
    fn test_restrict_combines_with_and() {
        let mut cb = CriteriaBuilder::new();
        let (mut target, root) = QueryKind::Delete.allocate(EMPLOYEE, false, &mut cb).unwrap();
        let a = root.column("a").eq(1);
        let b = root.column("b").eq(2);

        target.restrict(a.clone());
        assert_eq!(target.criteria().restriction(), Some(&a));
        target.restrict(b.clone());
        assert_eq!(target.criteria().restriction(), Some(&Expr::And(vec![a, b])));
    }

    #[test]
    fn test_query_only_operations() {
        let mut cb = CriteriaBuilder::new();
        let (mut target, _) = QueryKind::Update.allocate(EMPLOYEE, false, &mut cb).unwrap();
        assert!(target.query_mut("order by").is_err());
    }
}
