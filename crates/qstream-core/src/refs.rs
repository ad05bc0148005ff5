//! Forward references between stream fragments.
//!
//! A [`Ref`] names a value that one step of a build produces and another step
//! (possibly inside a subquery) consumes. The handle itself is immutable and
//! cheap to clone; bound values live in [`Bindings`], which every build
//! creates fresh. Realizing the same stream twice therefore never sees a
//! value from an earlier build.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::error::{Result, StreamError};

static NEXT_REF_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a [`Ref`], unique within the process.
pub type RefId = u64;

/// A single-assignment handle to a value of type `T`.
pub struct Ref<T> {
    id: RefId,
    name: Option<String>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    pub fn new() -> Self {
        Self {
            id: NEXT_REF_ID.fetch_add(1, Ordering::Relaxed),
            name: None,
            _type: PhantomData,
        }
    }

    /// A reference carrying a name for error messages.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    pub fn id(&self) -> RefId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<T> Default for Ref<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Display for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "`{name}`"),
            None => write!(f, "#{}", self.id),
        }
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Values bound to references during one build.
#[derive(Default)]
pub struct Bindings {
    slots: HashMap<RefId, Box<dyn Any + Send>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to `r`. Fails if `r` is already bound.
    pub fn bind<T: Send + 'static>(&mut self, r: &Ref<T>, value: T) -> Result<()> {
        if self.slots.contains_key(&r.id) {
            return Err(StreamError::RefAlreadyBound(r.to_string()));
        }
        self.slots.insert(r.id, Box::new(value));
        Ok(())
    }

    /// Reads the value bound to `r`. Fails if `r` is unbound.
    pub fn get<T: Clone + 'static>(&self, r: &Ref<T>) -> Result<T> {
        self.slots
            .get(&r.id)
            .and_then(|slot| slot.downcast_ref::<T>())
            .cloned()
            .ok_or_else(|| StreamError::RefUnbound(r.to_string()))
    }

    pub fn is_bound<T>(&self, r: &Ref<T>) -> bool {
        self.slots.contains_key(&r.id)
    }

    /// Clears the binding of `r`, bound or not.
    pub fn unbind<T>(&mut self, r: &Ref<T>) {
        self.slots.remove(&r.id);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.slots.keys().collect();
        ids.sort();
        f.debug_struct("Bindings").field("bound", &ids).finish()
    }
}
