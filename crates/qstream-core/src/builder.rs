//! Entry point for creating streams.

use std::{fmt, sync::Arc};

use qstream_config::{get_config, StreamConfig};
use qstream_criteria::{EntityType, Source};
use tracing::trace;

use crate::{
    error::Result,
    exec::{EntityManagerHandle, NullEntityManager},
    query_kind::Kind,
    stream::{DeleteStream, SearchStream, Stream, UpdateStream},
};

/// Creates root streams that share one entity manager and configuration.
#[derive(Clone)]
pub struct Builder {
    manager: EntityManagerHandle,
    config: Arc<StreamConfig>,
}

impl Builder {
    /// A builder using the process-wide configuration.
    pub fn new(manager: EntityManagerHandle) -> Self {
        Self {
            manager,
            config: Arc::new(get_config()),
        }
    }

    /// A builder whose streams can be built and rendered but never return
    /// rows.
    pub fn headless() -> Self {
        Self::new(Arc::new(NullEntityManager))
    }

    pub fn with_config(self, config: StreamConfig) -> Self {
        Self {
            config: Arc::new(config),
            ..self
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// A search over every row of `entity`.
    pub fn stream(&self, entity: EntityType) -> Result<SearchStream> {
        self.root(entity)
    }

    /// An update of rows of `entity`. Restrict it with `filter` and assign
    /// columns with `set`.
    pub fn update_stream(&self, entity: EntityType) -> Result<UpdateStream> {
        self.root(entity)
    }

    pub fn delete_stream(&self, entity: EntityType) -> Result<DeleteStream> {
        self.root(entity)
    }

    fn root<K: Kind>(&self, entity: EntityType) -> Result<Stream<Source, K>> {
        entity.validate()?;
        trace!(entity = %entity, kind = K::QUERY_KIND.name(), "creating stream");
        Ok(Stream::new(self.manager.clone(), self.config.clone(), entity))
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use qstream_criteria::{CriteriaError, Dialect};

    use super::*;
    use crate::{error::StreamError, query_kind::QueryKind};

    const EMPLOYEE: EntityType = EntityType::new("employee");

    #[test]
    fn test_streams_per_kind() {
        let builder = Builder::headless();

        assert_eq!(builder.stream(EMPLOYEE).unwrap().query_kind(), QueryKind::Search);
        assert_eq!(
            builder.update_stream(EMPLOYEE).unwrap().query_kind(),
            QueryKind::Update
        );
        assert_eq!(
            builder.delete_stream(EMPLOYEE).unwrap().query_kind(),
            QueryKind::Delete
        );
    }

    #[test]
    fn test_rejects_invalid_entity() {
        let err = Builder::headless()
            .stream(EntityType::new("employee; drop"))
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::Criteria(CriteriaError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_with_config_reaches_render() {
        let builder = Builder::headless().with_config(StreamConfig {
            dialect: Dialect::Postgres,
            quote_identifiers: true,
            ..StreamConfig::default()
        });

        let statement = builder
            .stream(EMPLOYEE)
            .unwrap()
            .filter(|e| e.column("salary").gt(10))
            .to_statement()
            .unwrap();
        assert_eq!(
            statement.sql,
            "SELECT e0.* FROM \"employee\" e0 WHERE e0.\"salary\" > $1"
        );
        assert_eq!(builder.config().dialect, Dialect::Postgres);
    }
}
