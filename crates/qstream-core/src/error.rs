//! Error types for qstream-core.

use miette::Diagnostic;
use qstream_criteria::CriteriaError;
use thiserror::Error;

/// Errors raised while composing, building or executing a stream.
#[derive(Error, Diagnostic, Debug)]
pub enum StreamError {
    #[error("Invalid argument to `{op}`: {reason}")]
    #[diagnostic(code(qstream::argument))]
    Argument { op: &'static str, reason: String },

    #[error("Reference {0} is already bound")]
    #[diagnostic(
        code(qstream::ref_already_bound),
        help("A reference can be bound once per build; use a separate Ref for each binding")
    )]
    RefAlreadyBound(String),

    #[error("Reference {0} was read before it was bound")]
    #[diagnostic(
        code(qstream::ref_unbound),
        help("The step binding a reference must run before any step reading it")
    )]
    RefUnbound(String),

    #[error("subquery/exists used outside the context of a containing query build")]
    #[diagnostic(
        code(qstream::no_enclosing_query),
        help("Call `as_subquery`/`exists` from a step closure that receives the build context")
    )]
    NoEnclosingQuery,

    #[error("this stream was not built inside a containing query")]
    #[diagnostic(
        code(qstream::not_in_containing_query),
        help("Only search streams can be nested; this one is a {kind} stream")
    )]
    NotInContainingQuery { kind: &'static str },

    #[error("Cannot join plural association `{0}` after limit or skip")]
    #[diagnostic(
        code(qstream::plural_join_after_limit),
        help("Move the join before `limit`/`skip`, a row limit cannot be applied to a fan-out join")
    )]
    PluralJoinAfterLimit(String),

    #[error("Subquery nesting exceeds the maximum depth of {max}")]
    #[diagnostic(
        code(qstream::subquery_depth),
        help("Raise `max_subquery_depth` in the stream configuration")
    )]
    SubqueryDepthExceeded { max: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Criteria(#[from] CriteriaError),

    #[error("Cannot decode {found} as {expected}")]
    #[diagnostic(code(qstream::decode))]
    Decode {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Query execution failed: {0}")]
    #[diagnostic(code(qstream::execution))]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;
