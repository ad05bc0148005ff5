//! Nesting a stream inside the query being built.

use qstream_criteria::{CriteriaQuery, Expr, Selection};
use tracing::trace;

use super::Stream;
use crate::{
    context::{BuildContext, FrameKind},
    error::{Result, StreamError},
    query_kind::{Kind, QueryKind},
};

impl<S: Selection, K: Kind> Stream<S, K> {
    /// Builds this stream as a subquery of the query `ctx` is currently
    /// building and returns it as a scalar expression.
    ///
    /// Only valid inside a step closure of an enclosing build; with no
    /// active frame this fails with [`StreamError::NoEnclosingQuery`].
    pub fn as_subquery(&self, ctx: &mut BuildContext) -> Result<Expr> {
        Ok(Expr::Subquery(Box::new(self.to_subquery(ctx)?)))
    }

    /// `EXISTS (subquery)` over this stream.
    pub fn exists(&self, ctx: &mut BuildContext) -> Result<Expr> {
        let subquery = self.to_subquery(ctx)?;
        Ok(ctx.criteria_builder().exists(subquery))
    }

    pub fn to_subquery(&self, ctx: &mut BuildContext) -> Result<CriteriaQuery> {
        let parent = ctx.current_frame()?.id;
        if K::QUERY_KIND != QueryKind::Search {
            return Err(StreamError::NotInContainingQuery {
                kind: K::QUERY_KIND.name(),
            });
        }

        trace!(parent, entity = %self.entity, "building subquery");
        self.run(FrameKind::Subquery, ctx)?.into_query()
    }
}
