//! Executable statements produced by stream terminals.

use std::fmt;

use qstream_criteria::Statement;
use tracing::debug;

use super::{manager::EntityManagerHandle, row::FromRow};
use crate::error::Result;

/// A prepared SELECT bound to the manager that runs it.
#[derive(Clone)]
pub struct TypedQuery {
    statement: Statement,
    manager: EntityManagerHandle,
}

impl TypedQuery {
    pub fn new(statement: Statement, manager: EntityManagerHandle) -> Self {
        Self {
            statement,
            manager,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn get_result_list<R: FromRow>(&self) -> Result<Vec<R>> {
        let rows = self.manager.fetch(&self.statement)?;
        debug!(rows = rows.len(), "fetched result list");
        rows.iter().map(R::from_row).collect()
    }

    /// The first row, if any. Further rows are ignored. A lone NULL read
    /// into a scalar counts as no result.
    pub fn single_result<R: FromRow>(&self) -> Result<Option<R>> {
        let rows = self.manager.fetch(&self.statement)?;
        Ok(rows.first().map(R::from_single_row).transpose()?.flatten())
    }
}

impl fmt::Debug for TypedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedQuery")
            .field("statement", &self.statement)
            .finish_non_exhaustive()
    }
}

/// A prepared UPDATE or DELETE.
#[derive(Clone)]
pub struct MutationQuery {
    statement: Statement,
    manager: EntityManagerHandle,
}

pub type UpdateQuery = MutationQuery;
pub type DeleteQuery = MutationQuery;

impl MutationQuery {
    pub fn new(statement: Statement, manager: EntityManagerHandle) -> Self {
        Self {
            statement,
            manager,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Runs the statement and returns the affected row count.
    pub fn execute(&self) -> Result<u64> {
        let affected = self.manager.execute(&self.statement)?;
        debug!(affected, "executed mutation");
        Ok(affected)
    }
}

impl fmt::Debug for MutationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationQuery")
            .field("statement", &self.statement)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qstream_criteria::Value;

    use super::*;
    use crate::exec::{RecordingEntityManager, Row};

    fn statement() -> Statement {
        Statement {
            sql: "SELECT e0.name FROM employee e0".into(),
            params: vec![],
        }
    }

    #[test]
    fn test_single_result_takes_first_row() {
        let manager = Arc::new(RecordingEntityManager::new());
        manager.push_rows(vec![Row::new(["a"]), Row::new(["b"])]);
        manager.push_rows(vec![]);

        let query = TypedQuery::new(statement(), manager.clone());
        assert_eq!(query.single_result::<String>().unwrap().as_deref(), Some("a"));
        assert_eq!(query.single_result::<String>().unwrap(), None);
    }

    #[test]
    fn test_single_result_null_scalar() {
        let manager = Arc::new(RecordingEntityManager::new());
        manager.push_rows(vec![Row::new([Value::Null])]);
        manager.push_rows(vec![Row::new([Value::Null])]);

        let query = TypedQuery::new(statement(), manager);
        assert_eq!(query.single_result::<f64>().unwrap(), None);
        assert_eq!(query.single_result::<Option<f64>>().unwrap(), Some(None));
    }

    #[test]
    fn test_result_list_propagates_decode_errors() {
        let manager = Arc::new(RecordingEntityManager::new());
        manager.push_rows(vec![Row::new([Value::Int(1)])]);

        let query = TypedQuery::new(statement(), manager);
        assert!(query.get_result_list::<String>().is_err());
    }

    #[test]
    fn test_mutation_execute() {
        let manager = Arc::new(RecordingEntityManager::new());
        manager.push_affected(9);

        let query = MutationQuery::new(statement(), manager.clone());
        assert_eq!(query.execute().unwrap(), 9);
        assert_eq!(manager.statements().len(), 1);
        assert!(format!("{query:?}").contains("MutationQuery"));
    }
}
