//! The step evaluator.

use qstream_criteria::{CommonCriteria, Selected, Selection, Source};
use tracing::trace;

use crate::{
    context::BuildContext,
    error::Result,
    query_kind::Target,
    stream::step::{Step, StepList},
};

/// Runs every step against `target`, oldest first, starting from `initial`
/// and returning the final selection.
pub(crate) fn evaluate(
    steps: &StepList,
    target: &mut Target,
    initial: Selected,
    ctx: &mut BuildContext,
) -> Result<Selected> {
    let mut selected = initial;

    for (index, step) in steps.in_order().into_iter().enumerate() {
        trace!(index, step = step.name(), depth = ctx.depth(), "applying step");

        match step {
            Step::Filter(predicate) => {
                let predicate = predicate(&selected, ctx)?;
                target.restrict(predicate);
            }
            Step::Peek(effect) | Step::Bind(effect) => effect(&selected, ctx)?,
            Step::Map(map) => selected = map(&selected, ctx)?,
            Step::Join { assoc, kind } => {
                let parent = Source::from_selected(selected)?;
                let child =
                    target
                        .criteria_mut()
                        .join(&parent, assoc, *kind, ctx.criteria_builder())?;
                selected = Selected::Source(child);
            }
            Step::Distinct => target.query_mut("distinct")?.set_distinct(true),
            Step::OrderBy(orders) => {
                let orders = orders(&selected, ctx)?;
                target.query_mut("order by")?.set_order_by(orders);
            }
            Step::GroupBy(exprs) => {
                let exprs = exprs(&selected, ctx)?;
                let query = target.query_mut("group by")?;
                let mut group_by = query.group_by().to_vec();
                group_by.extend(exprs);
                query.set_group_by(group_by);
            }
            Step::Having(predicate) => {
                let predicate = predicate(&selected, ctx)?;
                let query = target.query_mut("having")?;
                let combined = match query.having() {
                    Some(existing) => existing.clone().and(predicate),
                    None => predicate,
                };
                query.set_having(combined);
            }
            Step::AddRoot { entity, slot } => {
                let query = target.query_mut("add root")?;
                let root = query.from(*entity, ctx.criteria_builder())?;
                ctx.bind(slot, root)?;
            }
            Step::Limit(n) => {
                let query = target.query_mut("limit")?;
                let limit = query.limit().map_or(*n, |current| current.min(*n));
                query.set_limit(Some(limit));
            }
            Step::Skip(n) => {
                // Skipping inside a limited window shrinks the window.
                let query = target.query_mut("skip")?;
                let offset = query.offset().unwrap_or(0).saturating_add(*n);
                query.set_offset(Some(offset));
                if let Some(limit) = query.limit() {
                    query.set_limit(Some(limit.saturating_sub(*n)));
                }
            }
            Step::Custom(custom) => selected = custom(target, &selected, ctx)?,
        }
    }

    Ok(selected)
}
