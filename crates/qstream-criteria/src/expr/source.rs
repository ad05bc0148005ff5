use crate::{
    entity::{Attr, EntityType},
    expr::Expr,
};

/// A row source of a query: a root table or a join, identified by its alias.
///
/// Sources are plain handles. The query object that created one keeps the
/// authoritative clause; the handle is only used to build expressions that
/// refer to it and to attach further joins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    alias: String,
    entity: EntityType,
}

impl Source {
    pub fn new(alias: impl Into<String>, entity: EntityType) -> Self {
        Self {
            alias: alias.into(),
            entity,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    /// Path to an attribute of this source.
    pub fn get<T>(&self, attr: Attr<T>) -> Expr {
        self.column(attr.column())
    }

    /// Path to a column by name.
    pub fn column(&self, column: &'static str) -> Expr {
        Expr::Column {
            alias: self.alias.clone(),
            column,
        }
    }

    /// Shorthand for the conventional `id` primary key column.
    pub fn id(&self) -> Expr {
        self.column("id")
    }

    /// The whole row, as selected by `alias.*`.
    pub fn all(&self) -> Expr {
        Expr::Entity {
            alias: self.alias.clone(),
        }
    }
}
