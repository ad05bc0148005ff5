use crate::{
    builder::CriteriaBuilder,
    entity::{Assoc, EntityType},
    error::{CriteriaError, Result},
    expr::{Expr, JoinKind, Source},
    traits::CommonCriteria,
};

/// A bulk DELETE over a single root.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaDelete {
    root: Source,
    restriction: Option<Expr>,
}

impl CriteriaDelete {
    pub fn new(root: Source) -> Self {
        Self {
            root,
            restriction: None,
        }
    }

    pub fn root_source(&self) -> &Source {
        &self.root
    }
}

impl CommonCriteria for CriteriaDelete {
    fn kind_name(&self) -> &'static str {
        "delete"
    }

    fn root(&self) -> Option<&Source> {
        Some(&self.root)
    }

    fn from(&mut self, _entity: EntityType, _cb: &mut CriteriaBuilder) -> Result<Source> {
        Err(CriteriaError::Unsupported {
            op: "additional root",
            kind: "delete",
        })
    }

    fn join(
        &mut self,
        _parent: &Source,
        _assoc: &Assoc,
        _kind: JoinKind,
        _cb: &mut CriteriaBuilder,
    ) -> Result<Source> {
        Err(CriteriaError::Unsupported {
            op: "join",
            kind: "delete",
        })
    }

    fn restriction(&self) -> Option<&Expr> {
        self.restriction.as_ref()
    }

    fn set_restriction(&mut self, restriction: Expr) {
        self.restriction = Some(restriction);
    }
}
