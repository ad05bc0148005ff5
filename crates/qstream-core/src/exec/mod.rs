//! Running built statements.

mod manager;
mod request;
mod row;

pub use manager::{
    EntityManager, EntityManagerHandle, NullEntityManager, RecordingEntityManager, Response,
};
pub use request::{DeleteQuery, MutationQuery, TypedQuery, UpdateQuery};
pub use row::{FromRow, FromValue, Row};
