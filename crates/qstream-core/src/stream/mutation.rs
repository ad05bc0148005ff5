//! Update and delete streams.

use std::sync::Arc;

use qstream_criteria::{Attr, CriteriaDelete, CriteriaUpdate, Expr, Selection, Source};

use super::{Setter, Stream};
use crate::{
    context::BuildContext,
    error::{Result, StreamError},
    exec::{DeleteQuery, UpdateQuery},
    query_kind::{Delete, Update},
};

impl<S: Selection> Stream<S, Update> {
    /// Assigns a fixed value to `attr`. A later `set` of the same attribute
    /// wins.
    pub fn set<T>(&self, attr: Attr<T>, value: impl Into<Expr>) -> Result<Self> {
        let value = value.into();
        self.set_with(attr, move |_, _| Ok(value.clone()))
    }

    /// Assigns an expression computed from the update root, e.g.
    /// `salary * 1.1`.
    pub fn set_with<T, F>(&self, attr: Attr<T>, value: F) -> Result<Self>
    where
        F: Fn(&Source, &mut BuildContext) -> Result<Expr> + Send + Sync + 'static,
    {
        if attr.entity() != self.entity.table() {
            return Err(StreamError::Argument {
                op: "set",
                reason: format!(
                    "attribute `{}.{}` does not belong to `{}`",
                    attr.entity(),
                    attr.column(),
                    self.entity
                ),
            });
        }

        let mut stream = self.clone();
        stream.setters.push(Setter {
            column: attr.column(),
            value: Arc::new(value),
        });
        Ok(stream)
    }

    pub fn to_criteria_update(&self) -> Result<CriteriaUpdate> {
        self.to_target()?.into_update()
    }

    pub fn to_query(&self) -> Result<UpdateQuery> {
        let statement = self.to_statement()?;
        Ok(UpdateQuery::new(statement, self.manager.clone()))
    }

    /// Executes the update and returns the affected row count.
    pub fn update(&self) -> Result<u64> {
        self.to_query()?.execute()
    }
}

impl<S: Selection> Stream<S, Delete> {
    pub fn to_criteria_delete(&self) -> Result<CriteriaDelete> {
        self.to_target()?.into_delete()
    }

    pub fn to_query(&self) -> Result<DeleteQuery> {
        let statement = self.to_statement()?;
        Ok(DeleteQuery::new(statement, self.manager.clone()))
    }

    /// Executes the delete and returns the affected row count.
    pub fn delete(&self) -> Result<u64> {
        self.to_query()?.execute()
    }
}
