//! Result rows and decoding them into Rust values.

use qstream_criteria::Value;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

/// One result row. Column names are optional; stores that report them make
/// [`Row::get_named`] available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    names: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            names: vec![],
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn named<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        let (names, values) = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .unzip();
        Self {
            names,
            values,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_named(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|n| n == name)?;
        self.values.get(index)
    }

    pub fn decode<T: FromValue>(&self, index: usize) -> Result<T> {
        match self.get(index) {
            Some(value) => T::from_value(value),
            None => Err(StreamError::Decode {
                expected: T::TYPE_NAME,
                found: "missing column",
            }),
        }
    }

    pub fn decode_named<T: FromValue>(&self, name: &str) -> Result<T> {
        match self.get_named(name) {
            Some(value) => T::from_value(value),
            None => Err(StreamError::Decode {
                expected: T::TYPE_NAME,
                found: "missing column",
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Conversion from one column value.
pub trait FromValue: Sized {
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch<T: FromValue>(value: &Value) -> Result<T> {
    Err(StreamError::Decode {
        expected: T::TYPE_NAME,
        found: value.type_name(),
    })
}

impl FromValue for Value {
    const TYPE_NAME: &'static str = "value";

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(n) => Ok(*n),
            other => mismatch(other),
        }
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "real";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Real(n) => Ok(*n),
            // AVG and SUM over integer columns come back as integers on
            // some stores.
            Value::Int(n) => Ok(*n as f64),
            other => mismatch(other),
        }
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "text";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => mismatch(other),
        }
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            other => mismatch(other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Conversion from a whole row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;

    /// Decodes the single row of a `value()`-style lookup. Aggregates over no
    /// rows still return one row holding NULL; scalar targets read that as
    /// `None`.
    fn from_single_row(row: &Row) -> Result<Option<Self>> {
        Self::from_row(row).map(Some)
    }
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

macro_rules! impl_from_row_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row) -> Result<Self> {
                    row.decode(0)
                }

                fn from_single_row(row: &Row) -> Result<Option<Self>> {
                    row.decode(0)
                }
            }

            impl FromRow for Option<$ty> {
                fn from_row(row: &Row) -> Result<Self> {
                    row.decode(0)
                }
            }
        )+
    };
}

impl_from_row_scalar!(Value, i64, f64, String, bool);

impl<A: FromValue, B: FromValue> FromRow for (A, B) {
    fn from_row(row: &Row) -> Result<Self> {
        Ok((row.decode(0)?, row.decode(1)?))
    }
}

impl<A: FromValue, B: FromValue, C: FromValue> FromRow for (A, B, C) {
    fn from_row(row: &Row) -> Result<Self> {
        Ok((row.decode(0)?, row.decode(1)?, row.decode(2)?))
    }
}
