//! Build context threaded through every step of a realization.
//!
//! A [`BuildContext`] owns everything that is scoped to one terminal build:
//! the criteria builder that allocates aliases, the stack of frames for the
//! query and any subqueries currently being constructed, and the reference
//! bindings. Independent builds never share a context.

use std::sync::Arc;

use qstream_config::{get_config, StreamConfig};
use qstream_criteria::{CriteriaBuilder, EntityType};
use tracing::trace;

use crate::{
    error::{Result, StreamError},
    refs::{Bindings, Ref},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Query,
    Subquery,
    Update,
    Delete,
}

/// One query under construction.
///
/// The frame does not hold the query itself: the running build owns its
/// target, and every frame of a build allocates aliases from the context's
/// single [`CriteriaBuilder`], so a subquery can reference any source of an
/// enclosing frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: u64,
    /// The enclosing frame, `None` for the top-level query.
    pub parent: Option<u64>,
    pub kind: FrameKind,
    /// Zero for the top-level query of a build.
    pub depth: usize,
    pub root_entity: EntityType,
}

#[derive(Debug)]
pub struct BuildContext {
    builder: CriteriaBuilder,
    frames: Vec<Frame>,
    bindings: Bindings,
    config: Arc<StreamConfig>,
    next_frame: u64,
}

impl BuildContext {
    pub fn new(config: Arc<StreamConfig>) -> Self {
        Self {
            builder: CriteriaBuilder::new(),
            frames: vec![],
            bindings: Bindings::new(),
            config,
            next_frame: 0,
        }
    }

    /// A context with no active frame, using the process-wide configuration.
    pub fn detached() -> Self {
        Self::new(Arc::new(get_config()))
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn criteria_builder(&mut self) -> &mut CriteriaBuilder {
        &mut self.builder
    }

    /// The innermost query under construction.
    pub fn current_frame(&self) -> Result<&Frame> {
        self.frames.last().ok_or(StreamError::NoEnclosingQuery)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push_frame(&mut self, kind: FrameKind, root_entity: EntityType) -> Result<()> {
        let depth = self.frames.len();
        if depth > self.config.max_subquery_depth {
            return Err(StreamError::SubqueryDepthExceeded {
                max: self.config.max_subquery_depth,
            });
        }

        let frame = Frame {
            id: self.next_frame,
            parent: self.frames.last().map(|frame| frame.id),
            kind,
            depth,
            root_entity,
        };
        self.next_frame += 1;
        trace!(
            frame = frame.id,
            depth,
            entity = %root_entity,
            "entering {:?} frame",
            kind
        );
        self.frames.push(frame);
        Ok(())
    }

    pub(crate) fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            trace!(frame = frame.id, depth = frame.depth, "leaving {:?} frame", frame.kind);
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bind<T: Send + 'static>(&mut self, r: &Ref<T>, value: T) -> Result<()> {
        self.bindings.bind(r, value)
    }

    pub fn get<T: Clone + 'static>(&self, r: &Ref<T>) -> Result<T> {
        self.bindings.get(r)
    }

    pub fn unbind<T>(&mut self, r: &Ref<T>) {
        self.bindings.unbind(r)
    }
}
