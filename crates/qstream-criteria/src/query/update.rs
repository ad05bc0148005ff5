use crate::{
    builder::CriteriaBuilder,
    entity::{Assoc, Attr, EntityType},
    error::{CriteriaError, Result},
    expr::{Expr, JoinKind, Source},
    traits::CommonCriteria,
};

/// A bulk UPDATE over a single root.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaUpdate {
    root: Source,
    assignments: Vec<(&'static str, Expr)>,
    restriction: Option<Expr>,
}

impl CriteriaUpdate {
    pub fn new(root: Source) -> Self {
        Self {
            root,
            assignments: vec![],
            restriction: None,
        }
    }

    pub fn root_source(&self) -> &Source {
        &self.root
    }

    /// Assigns `value` to the column; a later assignment to the same column
    /// replaces the earlier one.
    pub fn set<T>(&mut self, attr: Attr<T>, value: impl Into<Expr>) {
        self.set_column(attr.column(), value.into());
    }

    pub fn set_column(&mut self, column: &'static str, value: Expr) {
        match self
            .assignments
            .iter_mut()
            .find(|(existing, _)| *existing == column)
        {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((column, value)),
        }
    }

    pub fn assignments(&self) -> &[(&'static str, Expr)] {
        &self.assignments
    }
}

impl CommonCriteria for CriteriaUpdate {
    fn kind_name(&self) -> &'static str {
        "update"
    }

    fn root(&self) -> Option<&Source> {
        Some(&self.root)
    }

    fn from(&mut self, _entity: EntityType, _cb: &mut CriteriaBuilder) -> Result<Source> {
        Err(CriteriaError::Unsupported {
            op: "additional root",
            kind: "update",
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
            kind: "update",
        })
    }

    fn restriction(&self) -> Option<&Expr> {
        self.restriction.as_ref()
    }

    fn set_restriction(&mut self, restriction: Expr) {
        self.restriction = Some(restriction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALARY: Attr<f64> = Attr::new("employee", "salary");

    #[test]
    fn test_set_replaces_same_column() {
        let mut cb = CriteriaBuilder::new();
        let mut update = cb.create_update(EntityType::new("employee"));
        update.set(SALARY, 10.0);
        update.set(SALARY, 20.0);

        assert_eq!(update.assignments().len(), 1);
        assert_eq!(update.assignments()[0].1, Expr::literal(20.0));
    }

    #[test]
    fn test_update_has_single_root() {
        let mut cb = CriteriaBuilder::new();
        let mut update = cb.create_update(EntityType::new("employee"));
        let err = update
            .from(EntityType::new("department"), &mut cb)
            .unwrap_err();
        assert!(matches!(err, CriteriaError::Unsupported { kind: "update", .. }));
    }
}
