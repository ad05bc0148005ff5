//! Deferred query streams.
//!
//! A [`Stream`] is an immutable description of a query: the root entity, the
//! query kind and an append-only list of steps. Chain operations return a new
//! stream sharing the previous steps; nothing touches a query object until a
//! terminal operation builds one. Every build starts from a fresh
//! [`BuildContext`] and a freshly allocated target, so a stream can be built
//! any number of times.
//!
//! `S` is what the chain currently selects (a [`Source`], an [`Expr`], or a
//! tuple of those) and `K` is the query kind marker.

mod aggregate;
mod eval;
mod mutation;
mod search;
mod step;
mod subquery;

use std::{fmt, marker::PhantomData, sync::Arc};

use qstream_config::StreamConfig;
use qstream_criteria::{
    Assoc, Attr, EntityType, Expr, JoinKind, Selected, Selection, Source, Statement,
};
use tracing::{debug, warn};

use crate::{
    context::{BuildContext, FrameKind},
    error::{Result, StreamError},
    exec::EntityManager,
    query_kind::{Delete, Kind, QueryKind, Search, Target, Update},
    refs::Ref,
};
use step::{SetFn, Step, StepList};

#[derive(Clone)]
struct Setter {
    column: &'static str,
    value: SetFn,
}

pub struct Stream<S, K> {
    manager: Arc<dyn EntityManager>,
    config: Arc<StreamConfig>,
    entity: EntityType,
    steps: StepList,
    setters: Vec<Setter>,
    _marker: PhantomData<fn() -> (S, K)>,
}

pub type SearchStream<S = Source> = Stream<S, Search>;
pub type UpdateStream<S = Source> = Stream<S, Update>;
pub type DeleteStream<S = Source> = Stream<S, Delete>;

impl<S, K> Clone for Stream<S, K> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            config: self.config.clone(),
            entity: self.entity,
            steps: self.steps.clone(),
            setters: self.setters.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S, K: Kind> fmt::Debug for Stream<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let setters: Vec<_> = self.setters.iter().map(|s| s.column).collect();
        f.debug_struct("Stream")
            .field("kind", &K::QUERY_KIND)
            .field("entity", &self.entity.table())
            .field("steps", &self.steps)
            .field("setters", &setters)
            .finish()
    }
}

impl<K: Kind> Stream<Source, K> {
    pub(crate) fn new(
        manager: Arc<dyn EntityManager>,
        config: Arc<StreamConfig>,
        entity: EntityType,
    ) -> Self {
        Self {
            manager,
            config,
            entity,
            steps: StepList::default(),
            setters: vec![],
            _marker: PhantomData,
        }
    }

    /// Navigates a to-one or to-many association with an inner join.
    pub fn join(&self, assoc: Assoc) -> Result<Stream<Source, Search>> {
        self.join_kind(assoc, JoinKind::Inner)
    }

    pub fn left_join(&self, assoc: Assoc) -> Result<Stream<Source, Search>> {
        self.join_kind(assoc, JoinKind::Left)
    }

    /// Fans out over a to-many association.
    pub fn flat_map(&self, assoc: Assoc) -> Result<Stream<Source, Search>> {
        if !assoc.is_plural() {
            return Err(StreamError::Argument {
                op: "flat_map",
                reason: format!("association `{}` is not plural, use `join`", assoc.name()),
            });
        }
        self.join_kind(assoc, JoinKind::Inner)
    }

    fn join_kind(&self, assoc: Assoc, kind: JoinKind) -> Result<Stream<Source, Search>> {
        let limited = self
            .steps
            .any(|step| matches!(step, Step::Limit(_) | Step::Skip(_)));
        if assoc.is_plural() && limited {
            return Err(StreamError::PluralJoinAfterLimit(assoc.name().to_string()));
        }
        Ok(self.append(Step::Join {
            assoc,
            kind,
        }))
    }

    /// Selects one attribute of the current source.
    pub fn select<T: 'static>(&self, attr: Attr<T>) -> Stream<Expr, Search> {
        self.map(move |source: Source| source.get(attr))
    }
}

impl<S: Selection, K: Kind> Stream<S, K> {
    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn query_kind(&self) -> QueryKind {
        K::QUERY_KIND
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// A stream with `step` appended. Setters survive only while the query
    /// kind stays the same.
    fn append<T, K2: Kind>(&self, step: Step) -> Stream<T, K2> {
        let setters = if K2::QUERY_KIND == K::QUERY_KIND {
            self.setters.clone()
        } else {
            vec![]
        };
        Stream {
            manager: self.manager.clone(),
            config: self.config.clone(),
            entity: self.entity,
            steps: self.steps.push(step),
            setters,
            _marker: PhantomData,
        }
    }

    /// Restricts the query; repeated filters are combined with AND.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(S) -> Expr + Send + Sync + 'static,
    {
        self.append(Step::filter(move |selected, _| {
            Ok(predicate(S::from_selected(selected.clone())?))
        }))
    }

    /// Like [`Stream::filter`], with access to the build context for
    /// subqueries and reference reads.
    pub fn filter_with<F>(&self, predicate: F) -> Self
    where
        F: Fn(S, &mut BuildContext) -> Result<Expr> + Send + Sync + 'static,
    {
        self.append(Step::filter(move |selected, ctx| {
            predicate(S::from_selected(selected.clone())?, ctx)
        }))
    }

    pub fn peek<F>(&self, action: F) -> Self
    where
        F: Fn(S) + Send + Sync + 'static,
    {
        self.append(Step::peek(move |selected, _| {
            action(S::from_selected(selected.clone())?);
            Ok(())
        }))
    }

    pub fn peek_with<F>(&self, action: F) -> Self
    where
        F: Fn(S, &mut BuildContext) -> Result<()> + Send + Sync + 'static,
    {
        self.append(Step::peek(move |selected, ctx| {
            action(S::from_selected(selected.clone())?, ctx)
        }))
    }

    /// Binds the current selection to `r`.
    pub fn bind(&self, r: &Ref<S>) -> Self {
        self.bind_project(r, |selected| selected)
    }

    /// Binds `project(selection)` to `r`; the selection passes through.
    pub fn bind_project<T, F>(&self, r: &Ref<T>, project: F) -> Self
    where
        T: Send + 'static,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        let r = r.clone();
        self.append(Step::bind(move |selected, ctx| {
            let value = project(S::from_selected(selected.clone())?);
            ctx.bind(&r, value)
        }))
    }

    pub fn bind_with<T, F>(&self, r: &Ref<T>, project: F) -> Self
    where
        T: Send + 'static,
        F: Fn(S, &mut BuildContext) -> Result<T> + Send + Sync + 'static,
    {
        let r = r.clone();
        self.append(Step::bind(move |selected, ctx| {
            let value = project(S::from_selected(selected.clone())?, ctx)?;
            ctx.bind(&r, value)
        }))
    }

    /// Derives a new selection. The derived stream is always a search.
    pub fn map<T, F>(&self, mapper: F) -> Stream<T, Search>
    where
        T: Selection,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        self.append(Step::map(move |selected, _| {
            Ok(mapper(S::from_selected(selected.clone())?).into_selected())
        }))
    }

    pub fn map_with<T, F>(&self, mapper: F) -> Stream<T, Search>
    where
        T: Selection,
        F: Fn(S, &mut BuildContext) -> Result<T> + Send + Sync + 'static,
    {
        self.append(Step::map(move |selected, ctx| {
            Ok(mapper(S::from_selected(selected.clone())?, ctx)?.into_selected())
        }))
    }

    /// Raw access to the target query object.
    pub fn custom<T, F>(&self, step: F) -> Stream<T, K>
    where
        T: Selection,
        F: Fn(&mut Target, S, &mut BuildContext) -> Result<T> + Send + Sync + 'static,
    {
        self.append(Step::custom(move |target, selected, ctx| {
            Ok(step(target, S::from_selected(selected.clone())?, ctx)?.into_selected())
        }))
    }

    /// Builds the target query object.
    pub fn to_target(&self) -> Result<Target> {
        let mut ctx = BuildContext::new(self.config.clone());
        self.realize(&mut ctx)
    }

    /// Builds and renders the statement without executing it.
    pub fn to_statement(&self) -> Result<Statement> {
        let target = self.to_target()?;
        self.prepare(&target)
    }

    pub(crate) fn realize(&self, ctx: &mut BuildContext) -> Result<Target> {
        let kind = K::QUERY_KIND;
        debug!(
            kind = kind.name(),
            entity = %self.entity,
            steps = self.steps.len(),
            "realizing stream"
        );
        self.run(kind.frame_kind(), ctx)
    }

    fn run(&self, frame: FrameKind, ctx: &mut BuildContext) -> Result<Target> {
        ctx.push_frame(frame, self.entity)?;
        let result = self.run_in_frame(frame == FrameKind::Subquery, ctx);
        ctx.pop_frame();
        result
    }

    fn run_in_frame(&self, subquery: bool, ctx: &mut BuildContext) -> Result<Target> {
        let (mut target, root) =
            K::QUERY_KIND.allocate(self.entity, subquery, ctx.criteria_builder())?;
        let selected =
            eval::evaluate(&self.steps, &mut target, Selected::Source(root.clone()), ctx)?;

        if let Target::Update(update) = &mut target {
            for setter in &self.setters {
                let value = (setter.value)(&root, ctx)?;
                update.set_column(setter.column, value);
            }
        }

        target.apply_selection(&selected);
        Ok(target)
    }

    pub(crate) fn prepare(&self, target: &Target) -> Result<Statement> {
        if self.config.warn_on_unrestricted
            && !matches!(target, Target::Query(_))
            && target.criteria().restriction().is_none()
        {
            warn!(
                entity = %self.entity,
                "{} without restriction affects every row",
                target.kind_name()
            );
        }

        let statement = target.render(self.config.render_options())?;
        if self.config.log_statements {
            debug!(
                sql = %statement.sql,
                params = statement.params.len(),
                "prepared statement"
            );
        }
        Ok(statement)
    }
}
