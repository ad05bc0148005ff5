//! Static entity metadata.
//!
//! Entities, their columns and associations are declared once (usually through
//! [`crate::define_entity!`]) as `const` values. Nothing here is reflected at
//! runtime; the query model only needs table, column and key names.

use std::{fmt, marker::PhantomData, sync::LazyLock};

use regex::Regex;

use crate::{
    error::{CriteriaError, Result},
    expr::{Expr, Source},
};

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("unable to compile identifier regex")
});

/// Checks that `name` can be spliced into SQL as a bare identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(CriteriaError::InvalidIdentifier(name.to_string()))
    }
}

/// A mapped table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityType {
    table: &'static str,
}

impl EntityType {
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
        }
    }

    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Validates the table name.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(self.table)
    }

    /// Alias prefix used for roots and joins of this entity.
    pub(crate) fn alias_prefix(&self) -> char {
        self.table
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or('t')
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table)
    }
}

/// A typed reference to a column of an entity.
///
/// `T` records the Rust type the column decodes to. It is not enforced by the
/// renderer, only carried for readability of entity declarations.
pub struct Attr<T> {
    entity: &'static str,
    column: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Attr<T> {
    pub const fn new(entity: &'static str, column: &'static str) -> Self {
        Self {
            entity,
            column,
            _type: PhantomData,
        }
    }

    pub const fn entity(&self) -> &'static str {
        self.entity
    }

    pub const fn column(&self) -> &'static str {
        self.column
    }
}

impl<T> Clone for Attr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Attr<T> {}

impl<T> fmt::Debug for Attr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attr({}.{})", self.entity, self.column)
    }
}

/// Whether navigating an association yields at most one row or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// The foreign key lives on the source table.
    ToOne,
    /// The foreign key lives on the target table.
    ToMany,
}

/// A navigable relationship between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assoc {
    source: &'static str,
    name: &'static str,
    target: EntityType,
    cardinality: Cardinality,
    foreign_key: &'static str,
    referenced_key: &'static str,
}

impl Assoc {
    /// Many-to-one / one-to-one: `source.foreign_key` references `target.id`.
    pub const fn to_one(
        source: &'static str,
        name: &'static str,
        target: &'static str,
        foreign_key: &'static str,
    ) -> Self {
        Self {
            source,
            name,
            target: EntityType::new(target),
            cardinality: Cardinality::ToOne,
            foreign_key,
            referenced_key: "id",
        }
    }

    /// One-to-many: `target.foreign_key` references `source.id`.
    pub const fn to_many(
        source: &'static str,
        name: &'static str,
        target: &'static str,
        foreign_key: &'static str,
    ) -> Self {
        Self {
            source,
            name,
            target: EntityType::new(target),
            cardinality: Cardinality::ToMany,
            foreign_key,
            referenced_key: "id",
        }
    }

    /// Overrides the referenced key column (defaults to `id`).
    pub const fn references(self, referenced_key: &'static str) -> Self {
        Self {
            referenced_key,
            ..self
        }
    }

    pub const fn source(&self) -> &'static str {
        self.source
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn target(&self) -> EntityType {
        self.target
    }

    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub const fn is_plural(&self) -> bool {
        matches!(self.cardinality, Cardinality::ToMany)
    }

    /// The ON condition linking `parent` (the source side) to `child`.
    pub fn on_condition(&self, parent: &Source, child: &Source) -> Expr {
        match self.cardinality {
            Cardinality::ToOne => child
                .column(self.referenced_key)
                .eq(parent.column(self.foreign_key)),
            Cardinality::ToMany => child
                .column(self.foreign_key)
                .eq(parent.column(self.referenced_key)),
        }
    }
}
