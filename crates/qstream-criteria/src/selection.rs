//! What a chain of query steps currently "points at".
//!
//! Steps exchange selections in the dynamic [`Selected`] form; the
//! [`Selection`] trait converts between it and the typed handles callers use
//! (`Source`, `Expr`, and tuples of those).

use crate::{
    error::{CriteriaError, Result},
    expr::{Expr, Source},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Selected {
    Source(Source),
    Expr(Expr),
    Tuple(Vec<Selected>),
}

impl Selected {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Selected::Source(_) => "source",
            Selected::Expr(_) => "expression",
            Selected::Tuple(_) => "tuple",
        }
    }

    /// Flattens the selection into SELECT list items.
    pub fn expressions(&self) -> Vec<Expr> {
        match self {
            Selected::Source(source) => vec![source.all()],
            Selected::Expr(expr) => vec![expr.clone()],
            Selected::Tuple(items) => items.iter().flat_map(Selected::expressions).collect(),
        }
    }

    /// The selection as a single expression, if it is one.
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Selected::Expr(expr) => Some(expr),
            _ => None,
        }
    }
}

/// Typed view over a [`Selected`].
pub trait Selection: Clone + Send + Sync + 'static {
    /// Name used in mismatch errors.
    const KIND: &'static str;

    fn into_selected(self) -> Selected;

    fn from_selected(selected: Selected) -> Result<Self>;
}

fn mismatch<T>(expected: &'static str, found: &Selected) -> Result<T> {
    Err(CriteriaError::SelectionMismatch {
        expected,
        found: found.kind_name(),
    })
}

impl Selection for Source {
    const KIND: &'static str = "source";

    fn into_selected(self) -> Selected {
        Selected::Source(self)
    }

    fn from_selected(selected: Selected) -> Result<Self> {
        match selected {
            Selected::Source(source) => Ok(source),
            other => mismatch(Self::KIND, &other),
        }
    }
}

impl Selection for Expr {
    const KIND: &'static str = "expression";

    fn into_selected(self) -> Selected {
        Selected::Expr(self)
    }

    /// Sources are accepted and read as their whole row.
    fn from_selected(selected: Selected) -> Result<Self> {
        match selected {
            Selected::Expr(expr) => Ok(expr),
            Selected::Source(source) => Ok(source.all()),
            other => mismatch(Self::KIND, &other),
        }
    }
}

impl Selection for Selected {
    const KIND: &'static str = "any";

    fn into_selected(self) -> Selected {
        self
    }

    fn from_selected(selected: Selected) -> Result<Self> {
        Ok(selected)
    }
}

impl<A: Selection, B: Selection> Selection for (A, B) {
    const KIND: &'static str = "pair";

    fn into_selected(self) -> Selected {
        Selected::Tuple(vec![self.0.into_selected(), self.1.into_selected()])
    }

    fn from_selected(selected: Selected) -> Result<Self> {
        match selected {
            Selected::Tuple(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                match (items.next(), items.next()) {
                    (Some(a), Some(b)) => Ok((A::from_selected(a)?, B::from_selected(b)?)),
                    _ => Err(CriteriaError::SelectionMismatch {
                        expected: Self::KIND,
                        found: "tuple",
                    }),
                }
            }
            other => mismatch(Self::KIND, &other),
        }
    }
}

impl<A: Selection, B: Selection, C: Selection> Selection for (A, B, C) {
    const KIND: &'static str = "triple";

    fn into_selected(self) -> Selected {
        Selected::Tuple(vec![
            self.0.into_selected(),
            self.1.into_selected(),
            self.2.into_selected(),
        ])
    }

    fn from_selected(selected: Selected) -> Result<Self> {
        match selected {
            Selected::Tuple(items) if items.len() == 3 => {
                let mut items = items.into_iter();
                match (items.next(), items.next(), items.next()) {
                    (Some(a), Some(b), Some(c)) => Ok((
                        A::from_selected(a)?,
                        B::from_selected(b)?,
                        C::from_selected(c)?,
                    )),
                    _ => Err(CriteriaError::SelectionMismatch {
                        expected: Self::KIND,
                        found: "tuple",
                    }),
                }
            }
            other => mismatch(Self::KIND, &other),
        }
    }
}
