use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use qstream_criteria::Statement;
use tracing::trace;

use super::row::Row;
use crate::error::{Result, StreamError};

/// Executes rendered statements against a store.
///
/// Each backend provides its own implementation; streams only ever hand it a
/// finished [`Statement`].
pub trait EntityManager: Send + Sync {
    fn fetch(&self, statement: &Statement) -> Result<Vec<Row>>;

    /// Runs an update or delete and returns the number of affected rows.
    fn execute(&self, statement: &Statement) -> Result<u64>;
}

pub type EntityManagerHandle = Arc<dyn EntityManager>;

/// Manager for building statements without a store: fetches return no rows
/// and mutations affect nothing.
pub struct NullEntityManager;

impl EntityManager for NullEntityManager {
    fn fetch(&self, _statement: &Statement) -> Result<Vec<Row>> {
        Ok(vec![])
    }

    fn execute(&self, _statement: &Statement) -> Result<u64> {
        Ok(0)
    }
}

/// A canned reply of a [`RecordingEntityManager`].
#[derive(Debug, Clone)]
pub enum Response {
    Rows(Vec<Row>),
    Affected(u64),
    Error(String),
}

/// Manager that records every statement and answers from a queue of
/// canned responses. Once the queue is empty it behaves like
/// [`NullEntityManager`].
#[derive(Default)]
pub struct RecordingEntityManager {
    statements: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<Response>>,
}

impl RecordingEntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.push(Response::Rows(rows));
    }

    pub fn push_affected(&self, count: u64) {
        self.push(Response::Affected(count));
    }

    pub fn push_error(&self, message: impl Into<String>) {
        self.push(Response::Error(message.into()));
    }

    fn push(&self, response: Response) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_statement(&self) -> Option<Statement> {
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Every recorded statement as a JSON array.
    pub fn transcript_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.statements())
            .map_err(|err| StreamError::Execution(err.to_string()))
    }

    fn record(&self, statement: &Statement) -> Option<Response> {
        trace!(sql = %statement.sql, "recording statement");
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement.clone());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

impl EntityManager for RecordingEntityManager {
    fn fetch(&self, statement: &Statement) -> Result<Vec<Row>> {
        match self.record(statement) {
            Some(Response::Rows(rows)) => Ok(rows),
            Some(Response::Affected(_)) => Err(StreamError::Execution(
                "expected rows, the next response is an affected count".into(),
            )),
            Some(Response::Error(message)) => Err(StreamError::Execution(message)),
            None => Ok(vec![]),
        }
    }

    fn execute(&self, statement: &Statement) -> Result<u64> {
        match self.record(statement) {
            Some(Response::Affected(count)) => Ok(count),
            Some(Response::Rows(_)) => Err(StreamError::Execution(
                "expected an affected count, the next response is a row set".into(),
            )),
            Some(Response::Error(message)) => Err(StreamError::Execution(message)),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use qstream_criteria::Value;

    use super::*;

    fn statement(sql: &str) -> Statement {
        Statement {
            sql: sql.to_string(),
            params: vec![Value::Int(1)],
        }
    }

    #[test]
    fn test_null_manager() {
        let manager = NullEntityManager;
        assert!(manager.fetch(&statement("SELECT 1")).unwrap().is_empty());
        assert_eq!(manager.execute(&statement("DELETE FROM t AS t0")).unwrap(), 0);
    }

    #[test]
    fn test_recording_manager_replays_in_order() {
        let manager = RecordingEntityManager::new();
        manager.push_rows(vec![Row::new([1i64])]);
        manager.push_affected(3);
        manager.push_error("disk full");

        assert_eq!(manager.fetch(&statement("a")).unwrap().len(), 1);
        assert_eq!(manager.execute(&statement("b")).unwrap(), 3);
        let err = manager.execute(&statement("c")).unwrap_err();
        assert!(matches!(err, StreamError::Execution(msg) if msg == "disk full"));
        assert_eq!(manager.execute(&statement("d")).unwrap(), 0);

        let sql: Vec<_> = manager.statements().into_iter().map(|s| s.sql).collect();
        assert_eq!(sql, vec!["a", "b", "c", "d"]);
        assert_eq!(manager.last_statement().unwrap().sql, "d");
    }

    #[test]
    fn test_mismatched_response() {
        let manager = RecordingEntityManager::new();
        manager.push_affected(1);
        assert!(matches!(
            manager.fetch(&statement("SELECT 1")),
            Err(StreamError::Execution(_))
        ));
    }

    #[test]
    fn test_transcript_json() {
        let manager = RecordingEntityManager::new();
        manager.fetch(&statement("SELECT 1")).unwrap();

        let json = manager.transcript_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["sql"], "SELECT 1");
        assert_eq!(parsed[0]["params"][0], 1);
    }

    #[test]
    fn test_managers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullEntityManager>();
        assert_send_sync::<RecordingEntityManager>();
    }
}
