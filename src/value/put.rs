use super::Value;
use crate::Error;
use crate::Result;

/// Shapes accepted by `Table::put_value`.
///
/// Array forms come either as plain vectors or as nullable ("boxed") vectors.
/// Nullable forms are normalized to the plain form before they reach the
/// engine; a `None` element makes the whole value invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum PutValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Raw(Vec<u8>),
    BooleanArray(Vec<bool>),
    NumberArray(Vec<f64>),
    StringArray(Vec<String>),
    BoxedBooleanArray(Vec<Option<bool>>),
    BoxedNumberArray(Vec<Option<f64>>),
    BoxedStringArray(Vec<Option<String>>),
}

impl PutValue {
    /// Converts into the engine value, naming `key` in any error.
    pub fn into_value(
        self,
        key: &str,
    ) -> Result<Value> {
        let value = match self {
            PutValue::Boolean(v) => Value::Boolean(v),
            PutValue::Number(v) => Value::Double(v),
            PutValue::String(v) => Value::String(v),
            PutValue::Raw(v) => Value::Raw(v),
            PutValue::BooleanArray(v) => Value::BooleanArray(v),
            PutValue::NumberArray(v) => Value::DoubleArray(v),
            PutValue::StringArray(v) => Value::StringArray(v),
            PutValue::BoxedBooleanArray(v) => Value::BooleanArray(to_native(key, v)?),
            PutValue::BoxedNumberArray(v) => Value::DoubleArray(to_native(key, v)?),
            PutValue::BoxedStringArray(v) => Value::StringArray(to_native(key, v)?),
        };
        Ok(value)
    }
}

fn to_native<T>(
    key: &str,
    boxed: Vec<Option<T>>,
) -> Result<Vec<T>> {
    boxed
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| Error::invalid_argument(key, format!("array element {} is null", i))))
        .collect()
}

/// Lifts plain vectors into nullable ones, the reverse of normalization.
pub fn from_native<T>(values: Vec<T>) -> Vec<Option<T>> {
    values.into_iter().map(Some).collect()
}

impl From<Value> for PutValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Boolean(v) => PutValue::Boolean(v),
            Value::Double(v) => PutValue::Number(v),
            Value::String(v) => PutValue::String(v),
            Value::Raw(v) => PutValue::Raw(v),
            Value::BooleanArray(v) => PutValue::BooleanArray(v),
            Value::DoubleArray(v) => PutValue::NumberArray(v),
            Value::StringArray(v) => PutValue::StringArray(v),
        }
    }
}

macro_rules! impl_from_for_put_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PutValue {
                fn from(v: $ty) -> Self {
                    PutValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_put_value! {
    bool => Boolean,
    f64 => Number,
    f32 => Number,
    i32 => Number,
    String => String,
    &str => String,
    Vec<u8> => Raw,
    &[u8] => Raw,
    Vec<bool> => BooleanArray,
    &[bool] => BooleanArray,
    Vec<f64> => NumberArray,
    &[f64] => NumberArray,
    Vec<String> => StringArray,
    Vec<Option<bool>> => BoxedBooleanArray,
    Vec<Option<f64>> => BoxedNumberArray,
    Vec<Option<String>> => BoxedStringArray,
}

impl From<Vec<&str>> for PutValue {
    fn from(v: Vec<&str>) -> Self {
        PutValue::StringArray(v.into_iter().map(String::from).collect())
    }
}
