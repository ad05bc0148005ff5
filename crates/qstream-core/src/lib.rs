//! Deferred, composable relational query streams.
//!
//! A [`Builder`] hands out [`Stream`]s rooted at an entity. Chaining
//! operations (`filter`, `join`, `map`, `order_by`, ...) only records steps;
//! a terminal operation (`get_result_list`, `to_criteria_query`, `update`,
//! `delete`, ...) replays them into a fresh query object, renders it, and
//! hands the statement to an [`EntityManager`].

pub mod builder;
pub mod context;
pub mod error;
pub mod exec;
pub mod query_kind;
pub mod refs;
pub mod stream;

pub use builder::Builder;
pub use context::{BuildContext, Frame, FrameKind};
pub use error::{Result, StreamError};
pub use exec::{
    DeleteQuery, EntityManager, EntityManagerHandle, FromRow, FromValue, MutationQuery,
    NullEntityManager, RecordingEntityManager, Row, TypedQuery, UpdateQuery,
};
pub use qstream_config::StreamConfig;
pub use qstream_criteria as criteria;
pub use query_kind::{Delete, Kind, QueryKind, Search, Target, Update};
pub use refs::{Bindings, Ref, RefId};
pub use stream::{DeleteStream, SearchStream, Stream, UpdateStream};

#[cfg(test)]
pub mod test_utils;
