//! Chain steps and the persistent list holding them.

use std::{fmt, sync::Arc};

use qstream_criteria::{Assoc, EntityType, Expr, JoinKind, Order, Selected, Source};

use crate::{context::BuildContext, error::Result, query_kind::Target, refs::Ref};

pub(crate) type SelectFn =
    Arc<dyn Fn(&Selected, &mut BuildContext) -> Result<Selected> + Send + Sync>;
pub(crate) type PredicateFn =
    Arc<dyn Fn(&Selected, &mut BuildContext) -> Result<Expr> + Send + Sync>;
pub(crate) type EffectFn = Arc<dyn Fn(&Selected, &mut BuildContext) -> Result<()> + Send + Sync>;
pub(crate) type ExprsFn =
    Arc<dyn Fn(&Selected, &mut BuildContext) -> Result<Vec<Expr>> + Send + Sync>;
pub(crate) type OrdersFn =
    Arc<dyn Fn(&Selected, &mut BuildContext) -> Result<Vec<Order>> + Send + Sync>;
pub(crate) type CustomFn =
    Arc<dyn Fn(&mut Target, &Selected, &mut BuildContext) -> Result<Selected> + Send + Sync>;
pub(crate) type SetFn = Arc<dyn Fn(&Source, &mut BuildContext) -> Result<Expr> + Send + Sync>;

/// One operation of a chain, interpreted at build time.
#[derive(Clone)]
pub(crate) enum Step {
    Filter(PredicateFn),
    Peek(EffectFn),
    /// Binds a value derived from the selection; the selection passes through.
    Bind(EffectFn),
    Map(SelectFn),
    Join { assoc: Assoc, kind: JoinKind },
    Distinct,
    OrderBy(OrdersFn),
    GroupBy(ExprsFn),
    Having(PredicateFn),
    AddRoot { entity: EntityType, slot: Ref<Source> },
    Limit(u64),
    Skip(u64),
    Custom(CustomFn),
}

impl Step {
    pub(crate) fn filter<F>(f: F) -> Self
    where
        F: Fn(&Selected, &mut BuildContext) -> Result<Expr> + Send + Sync + 'static,
    {
        Step::Filter(Arc::new(f))
    }

    pub(crate) fn peek<F>(f: F) -> Self
    where
        F: Fn(&Selected, &mut BuildContext) -> Result<()> + Send + Sync + 'static,
    {
        Step::Peek(Arc::new(f))
    }

    pub(crate) fn bind<F>(f: F) -> Self
    where
        F: Fn(&Selected, &mut BuildContext) -> Result<()> + Send + Sync + 'static,
    {
        Step::Bind(Arc::new(f))
    }

    pub(crate) fn map<F>(f: F) -> Self
    where
        F: Fn(&Selected, &mut BuildContext) -> Result<Selected> + Send + Sync + 'static,
    {
        Step::Map(Arc::new(f))
    }

    pub(crate) fn order_by<F>(f: F) -> Self
    where
        F: Fn(&Selected, &mut BuildContext) -> Result<Vec<Order>> + Send + Sync + 'static,
    {
        Step::OrderBy(Arc::new(f))
    }

    pub(crate) fn group_by<F>(f: F) -> Self
    where
        F: Fn(&Selected, &mut BuildContext) -> Result<Vec<Expr>> + Send + Sync + 'static,
    {
        Step::GroupBy(Arc::new(f))
    }

    pub(crate) fn having<F>(f: F) -> Self
    where
        F: Fn(&Selected, &mut BuildContext) -> Result<Expr> + Send + Sync + 'static,
    {
        Step::Having(Arc::new(f))
    }

    pub(crate) fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut Target, &Selected, &mut BuildContext) -> Result<Selected>
            + Send
            + Sync
            + 'static,
    {
        Step::Custom(Arc::new(f))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Step::Filter(_) => "filter",
            Step::Peek(_) => "peek",
            Step::Bind(_) => "bind",
            Step::Map(_) => "map",
            Step::Join { .. } => "join",
            Step::Distinct => "distinct",
            Step::OrderBy(_) => "order_by",
            Step::GroupBy(_) => "group_by",
            Step::Having(_) => "having",
            Step::AddRoot { .. } => "add_root",
            Step::Limit(_) => "limit",
            Step::Skip(_) => "skip",
            Step::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Join { assoc, kind } => write!(f, "join({}, {:?})", assoc.name(), kind),
            Step::AddRoot { entity, slot } => write!(f, "add_root({entity}, {slot})"),
            Step::Limit(n) => write!(f, "limit({n})"),
            Step::Skip(n) => write!(f, "skip({n})"),
            other => f.write_str(other.name()),
        }
    }
}

struct Node {
    step: Step,
    parent: Option<Arc<Node>>,
    len: usize,
}

/// An append-only list of steps with structural sharing.
///
/// Appending returns a new list whose tail is the old one, so every stream
/// derived from a common prefix shares that prefix.
#[derive(Clone, Default)]
pub(crate) struct StepList {
    tip: Option<Arc<Node>>,
}

impl StepList {
    pub(crate) fn push(&self, step: Step) -> Self {
        let len = self.len() + 1;
        Self {
            tip: Some(Arc::new(Node {
                step,
                parent: self.tip.clone(),
                len,
            })),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tip.as_ref().map_or(0, |node| node.len)
    }

    /// Steps newest first.
    fn iter_rev(&self) -> impl Iterator<Item = &Step> {
        std::iter::successors(self.tip.as_deref(), |node| node.parent.as_deref())
            .map(|node| &node.step)
    }

    /// Steps in the order they were appended.
    pub(crate) fn in_order(&self) -> Vec<&Step> {
        let mut steps: Vec<_> = self.iter_rev().collect();
        steps.reverse();
        steps
    }

    pub(crate) fn any(&self, pred: impl Fn(&Step) -> bool) -> bool {
        self.iter_rev().any(pred)
    }
}

impl fmt::Debug for StepList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.in_order()).finish()
    }
}
