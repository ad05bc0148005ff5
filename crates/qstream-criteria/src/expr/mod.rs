//! Expression trees.
//!
//! An [`Expr`] is a value-level description of a SQL expression. Expressions
//! are built by the fluent methods below, by [`Source::get`] for column paths
//! and by [`crate::CriteriaBuilder`] for aggregates, functions and subquery
//! predicates. They carry no rendering state; parameters are collected when
//! a statement is rendered.

pub mod ops;
pub mod source;

pub use ops::{AggregateFn, BinaryOp, Direction, Function, JoinKind, Order, UnaryOp};
pub use source::Source;

use crate::{query::CriteriaQuery, value::Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column {
        alias: String,
        column: &'static str,
    },
    Entity {
        alias: String,
    },
    Literal(Value),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    InList {
        operand: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    Aggregate {
        func: AggregateFn,
        arg: Option<Box<Expr>>,
        distinct: bool,
    },
    Function {
        func: Function,
        args: Vec<Expr>,
    },
    Subquery(Box<CriteriaQuery>),
    Exists(Box<CriteriaQuery>),
    InSubquery {
        operand: Box<Expr>,
        subquery: Box<CriteriaQuery>,
        negated: bool,
    },
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Column { .. } => "column",
            Expr::Entity { .. } => "entity",
            Expr::Literal(_) => "literal",
            Expr::Unary { .. } => "unary",
            Expr::Binary { .. } => "binary",
            Expr::And(_) => "and",
            Expr::Or(_) => "or",
            Expr::InList { .. } => "in",
            Expr::Aggregate { .. } => "aggregate",
            Expr::Function { .. } => "function",
            Expr::Subquery(_) => "subquery",
            Expr::Exists(_) => "exists",
            Expr::InSubquery { .. } => "in-subquery",
        }
    }

    /// True if this expression contains an aggregate outside of any subquery.
    pub fn is_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Unary { operand, .. } => operand.is_aggregate(),
            Expr::Binary { left, right, .. } => left.is_aggregate() || right.is_aggregate(),
            Expr::And(items) | Expr::Or(items) => items.iter().any(Expr::is_aggregate),
            Expr::Function { args, .. } => args.iter().any(Expr::is_aggregate),
            Expr::InList { operand, list, .. } => {
                operand.is_aggregate() || list.iter().any(Expr::is_aggregate)
            }
            _ => false,
        }
    }

    fn unary(self, op: UnaryOp) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(self),
        }
    }

    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Eq, other)
    }

    pub fn ne(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ne, other)
    }

    pub fn lt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Lt, other)
    }

    pub fn le(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Le, other)
    }

    pub fn gt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Gt, other)
    }

    pub fn ge(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Ge, other)
    }

    pub fn like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Like, pattern)
    }

    pub fn add(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Add, other)
    }

    pub fn sub(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Sub, other)
    }

    pub fn mul(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Mul, other)
    }

    pub fn div(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Div, other)
    }

    pub fn neg(self) -> Expr {
        self.unary(UnaryOp::Neg)
    }

    pub fn is_null(self) -> Expr {
        self.unary(UnaryOp::IsNull)
    }

    pub fn is_not_null(self) -> Expr {
        self.unary(UnaryOp::IsNotNull)
    }

    /// Logical negation. Double negation collapses.
    pub fn not(self) -> Expr {
        match self {
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => *operand,
            other => other.unary(UnaryOp::Not),
        }
    }

    /// Conjunction. Nested conjunctions are flattened so repeated `and`
    /// calls produce one `AND` list in call order.
    pub fn and(self, other: impl Into<Expr>) -> Expr {
        let mut items = match self {
            Expr::And(items) => items,
            other => vec![other],
        };
        match other.into() {
            Expr::And(more) => items.extend(more),
            other => items.push(other),
        }
        Expr::And(items)
    }

    /// Disjunction, flattened like [`Expr::and`].
    pub fn or(self, other: impl Into<Expr>) -> Expr {
        let mut items = match self {
            Expr::Or(items) => items,
            other => vec![other],
        };
        match other.into() {
            Expr::Or(more) => items.extend(more),
            other => items.push(other),
        }
        Expr::Or(items)
    }

    pub fn in_list<T, I>(self, values: I) -> Expr
    where
        T: Into<Expr>,
        I: IntoIterator<Item = T>,
    {
        Expr::InList {
            operand: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in_list<T, I>(self, values: I) -> Expr
    where
        T: Into<Expr>,
        I: IntoIterator<Item = T>,
    {
        Expr::InList {
            operand: Box::new(self),
            list: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// `self IN (subquery)`. A non-subquery argument degrades to a one
    /// element IN list.
    pub fn in_subquery(self, subquery: Expr) -> Expr {
        match subquery {
            Expr::Subquery(query) => Expr::InSubquery {
                operand: Box::new(self),
                subquery: query,
                negated: false,
            },
            other => self.in_list([other]),
        }
    }

    pub fn asc(self) -> Order {
        Order::asc(self)
    }

    pub fn desc(self) -> Order {
        Order::desc(self)
    }
}

macro_rules! impl_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Literal(Value::from(v))
                }
            }
        )*
    };
}

impl_from_literal!(bool, i32, i64, u32, f64, &str, String);

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl From<&Source> for Expr {
    fn from(source: &Source) -> Self {
        source.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    fn emp() -> Source {
        Source::new("e0", EntityType::new("employee"))
    }

    #[test]
    fn test_and_flattens_in_call_order() {
        let a = emp().column("a").eq(1);
        let b = emp().column("b").eq(2);
        let c = emp().column("c").eq(3);

        let combined = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(combined, Expr::And(vec![a.clone(), b.clone(), c.clone()]));

        let right_nested = a.clone().and(b.clone().and(c.clone()));
        assert_eq!(right_nested, Expr::And(vec![a, b, c]));
    }

    #[test]
    fn test_double_not_collapses() {
        let p = emp().column("active").eq(true);
        assert_eq!(p.clone().not().not(), p);
    }

    #[test]
    fn test_in_subquery_fallback() {
        let e = emp().id().in_subquery(Expr::literal(5));
        assert!(matches!(e, Expr::InList { negated: false, .. }));
    }

    #[test]
    fn test_is_aggregate() {
        let sum = Expr::Aggregate {
            func: AggregateFn::Sum,
            arg: Some(Box::new(emp().column("salary"))),
            distinct: false,
        };
        assert!(sum.clone().gt(10).is_aggregate());
        assert!(!emp().column("salary").gt(10).is_aggregate());
    }
}
