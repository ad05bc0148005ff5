//! FROM clause bookkeeping shared by the query objects.

use crate::{
    builder::CriteriaBuilder,
    entity::Assoc,
    error::{CriteriaError, Result},
    expr::{Expr, JoinKind, Source},
};

/// A join attached to a root.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub source: Source,
    pub on: Expr,
}

/// A root together with every join reachable from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RootClause {
    pub source: Source,
    pub joins: Vec<JoinClause>,
}

impl RootClause {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            joins: vec![],
        }
    }

    fn owns(&self, alias: &str) -> bool {
        self.source.alias() == alias || self.joins.iter().any(|j| j.source.alias() == alias)
    }
}

/// Attaches a join of `assoc` starting at `parent` to whichever root owns it.
pub(crate) fn attach_join(
    roots: &mut [RootClause],
    parent: &Source,
    assoc: &Assoc,
    kind: JoinKind,
    cb: &mut CriteriaBuilder,
) -> Result<Source> {
    if assoc.source() != parent.entity().table() {
        return Err(CriteriaError::UnknownAssociation {
            assoc: assoc.name().to_string(),
            entity: parent.entity().table().to_string(),
        });
    }

    let root = roots
        .iter_mut()
        .find(|root| root.owns(parent.alias()))
        .ok_or_else(|| CriteriaError::UnknownAlias(parent.alias().to_string()))?;

    let child = cb.source(assoc.target());
    let on = assoc.on_condition(parent, &child);
    root.joins.push(JoinClause {
        kind,
        source: child.clone(),
        on,
    });
    Ok(child)
}
