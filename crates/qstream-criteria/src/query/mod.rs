//! Query objects.
//!
//! These are the mutable targets the stream engine emits calls into:
//!
//! - [`CriteriaQuery`]: `SELECT`, also used for subqueries.
//! - [`CriteriaUpdate`]: bulk `UPDATE` with `SET` assignments.
//! - [`CriteriaDelete`]: bulk `DELETE`.
//!
//! All three implement [`crate::traits::CommonCriteria`]. Rendering to SQL
//! lives in [`crate::render`].

pub mod clause;
pub mod delete;
pub mod select;
pub mod update;

pub use clause::{JoinClause, RootClause};
pub use delete::CriteriaDelete;
pub use select::CriteriaQuery;
pub use update::CriteriaUpdate;
