//! Aggregate projections. Each one maps the stream to a single expression
//! and therefore yields a search.

use qstream_criteria::{CriteriaBuilder, Expr, Selected, Selection};

use super::{step::Step, Stream};
use crate::{
    error::{Result, StreamError},
    query_kind::{Kind, Search},
};

impl<S: Selection, K: Kind> Stream<S, K> {
    /// Number of rows the stream selects: `COUNT(expr)` when the selection
    /// is one expression, `COUNT(*)` otherwise. A distinct stream counts
    /// distinct values.
    ///
    /// Streams with a limit, skip, grouping or having clause cannot be
    /// counted in place; building such a count fails with an argument
    /// error.
    pub fn count(&self) -> Stream<Expr, Search> {
        self.append(count_step(false))
    }

    /// `COUNT(DISTINCT ...)`; a source counts its distinct ids.
    pub fn count_distinct(&self) -> Stream<Expr, Search> {
        self.append(count_step(true))
    }
}

fn count_step(distinct: bool) -> Step {
    Step::custom(move |target, selected, ctx| {
        let query = target.query_mut("count")?;
        if query.limit().is_some()
            || query.offset().is_some()
            || !query.group_by().is_empty()
            || query.having().is_some()
        {
            return Err(StreamError::Argument {
                op: "count",
                reason: "the stream is limited, skipped or grouped; count before those steps"
                    .into(),
            });
        }

        // The count replaces the row set, so row-level clauses go.
        let distinct = distinct || query.is_distinct();
        query.set_distinct(false);
        query.set_order_by(Vec::new());

        let cb = ctx.criteria_builder();
        let count = match (selected, distinct) {
            (Selected::Expr(expr), false) => cb.count(expr.clone()),
            (_, false) => cb.count_all(),
            (Selected::Source(source), true) => cb.count_distinct(source.id()),
            (other, true) => cb.count_distinct(Expr::from_selected(other.clone())?),
        };
        Ok(Selected::Expr(count))
    })
}

impl<K: Kind> Stream<Expr, K> {
    pub fn sum(&self) -> Stream<Expr, Search> {
        self.aggregate(|cb, expr| cb.sum(expr))
    }

    pub fn average(&self) -> Stream<Expr, Search> {
        self.aggregate(|cb, expr| cb.avg(expr))
    }

    pub fn min(&self) -> Stream<Expr, Search> {
        self.aggregate(|cb, expr| cb.min(expr))
    }

    pub fn max(&self) -> Stream<Expr, Search> {
        self.aggregate(|cb, expr| cb.max(expr))
    }

    fn aggregate<F>(&self, func: F) -> Stream<Expr, Search>
    where
        F: Fn(&CriteriaBuilder, Expr) -> Expr + Send + Sync + 'static,
    {
        self.append(Step::map(move |selected, ctx| -> Result<Selected> {
            let expr = Expr::from_selected(selected.clone())?;
            Ok(Selected::Expr(func(ctx.criteria_builder(), expr)))
        }))
    }
}
