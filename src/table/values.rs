//! Typed value access.
//!
//! Puts return whether the engine accepted the value (it refuses a value whose
//! type differs from the existing entry). Getters taking a default return it
//! when the entry is absent or holds another type. The getters without a
//! default are kept for older callers and fail with `KeyNotDefined`.

use super::Table;
use crate::Error;
use crate::PutValue;
use crate::Result;
use crate::Value;

impl Table {
    fn put(
        &self,
        key: &str,
        value: Value,
    ) -> bool {
        self.engine.set_entry_value(&self.key(key), value)
    }

    fn get_as<T>(
        &self,
        key: &str,
        extract: impl FnOnce(Value) -> Option<T>,
    ) -> Option<T> {
        self.engine.entry_value(&self.key(key)).and_then(extract)
    }

    fn require<T>(
        &self,
        key: &str,
        extract: impl FnOnce(Value) -> Option<T>,
    ) -> Result<T> {
        self.get_as(key, extract).ok_or_else(|| Error::KeyNotDefined(key.to_string()))
    }

    /// Puts any supported value shape.
    ///
    /// # Errors
    /// `InvalidArgument` naming `key` when a nullable array holds a null.
    pub fn put_value(
        &self,
        key: &str,
        value: impl Into<PutValue>,
    ) -> Result<bool> {
        let value = value.into().into_value(key)?;
        Ok(self.put(key, value))
    }

    pub fn get_value(
        &self,
        key: &str,
        default: Value,
    ) -> Value {
        self.get_as(key, Some).unwrap_or(default)
    }

    #[deprecated(note = "use get_value with a default instead")]
    pub fn value(
        &self,
        key: &str,
    ) -> Result<Value> {
        self.require(key, Some)
    }

    pub fn put_boolean(
        &self,
        key: &str,
        value: bool,
    ) -> bool {
        self.put(key, Value::Boolean(value))
    }

    pub fn get_boolean(
        &self,
        key: &str,
        default: bool,
    ) -> bool {
        self.get_as(key, |v| v.as_boolean()).unwrap_or(default)
    }

    #[deprecated(note = "use get_boolean with a default instead")]
    pub fn boolean(
        &self,
        key: &str,
    ) -> Result<bool> {
        self.require(key, |v| v.as_boolean())
    }

    pub fn put_number(
        &self,
        key: &str,
        value: f64,
    ) -> bool {
        self.put(key, Value::Double(value))
    }

    pub fn get_number(
        &self,
        key: &str,
        default: f64,
    ) -> f64 {
        self.get_as(key, |v| v.as_double()).unwrap_or(default)
    }

    #[deprecated(note = "use get_number with a default instead")]
    pub fn number(
        &self,
        key: &str,
    ) -> Result<f64> {
        self.require(key, |v| v.as_double())
    }

    #[deprecated(note = "use put_number instead")]
    pub fn put_int(
        &self,
        key: &str,
        value: i32,
    ) -> bool {
        self.put_number(key, f64::from(value))
    }

    /// Number entry truncated toward zero.
    #[deprecated(note = "use get_number with a default instead")]
    pub fn get_int(
        &self,
        key: &str,
    ) -> Result<i32> {
        self.require(key, |v| v.as_double()).map(|n| n as i32)
    }

    #[deprecated(note = "use put_number instead")]
    pub fn put_double(
        &self,
        key: &str,
        value: f64,
    ) -> bool {
        self.put_number(key, value)
    }

    #[deprecated(note = "use get_number with a default instead")]
    pub fn get_double(
        &self,
        key: &str,
    ) -> Result<f64> {
        self.require(key, |v| v.as_double())
    }

    #[deprecated(note = "use get_value with a default instead")]
    pub fn retrieve_value(
        &self,
        key: &str,
    ) -> Result<Value> {
        self.require(key, Some)
    }

    pub fn put_string(
        &self,
        key: &str,
        value: impl Into<String>,
    ) -> bool {
        self.put(key, Value::String(value.into()))
    }

    pub fn get_string(
        &self,
        key: &str,
        default: &str,
    ) -> String {
        self.get_as(key, |v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| default.to_string())
    }

    #[deprecated(note = "use get_string with a default instead")]
    pub fn string(
        &self,
        key: &str,
    ) -> Result<String> {
        self.require(key, |v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn put_raw(
        &self,
        key: &str,
        value: &[u8],
    ) -> bool {
        self.put(key, Value::Raw(value.to_vec()))
    }

    /// Puts the first `len` bytes of `buf`.
    ///
    /// # Errors
    /// `InvalidArgument` if `buf` is shorter than `len`.
    pub fn put_raw_buffer(
        &self,
        key: &str,
        buf: &[u8],
        len: usize,
    ) -> Result<bool> {
        if buf.len() < len {
            return Err(Error::invalid_argument(
                key,
                format!("buffer is too small, must be at least {}", len),
            ));
        }
        Ok(self.put_raw(key, &buf[..len]))
    }

    pub fn get_raw(
        &self,
        key: &str,
        default: &[u8],
    ) -> Vec<u8> {
        self.get_as(key, |v| match v {
            Value::Raw(r) => Some(r),
            _ => None,
        })
        .unwrap_or_else(|| default.to_vec())
    }

    #[deprecated(note = "use get_raw with a default instead")]
    pub fn raw(
        &self,
        key: &str,
    ) -> Result<Vec<u8>> {
        self.require(key, |v| match v {
            Value::Raw(r) => Some(r),
            _ => None,
        })
    }

    pub fn put_boolean_array(
        &self,
        key: &str,
        value: &[bool],
    ) -> bool {
        self.put(key, Value::BooleanArray(value.to_vec()))
    }

    pub fn get_boolean_array(
        &self,
        key: &str,
        default: &[bool],
    ) -> Vec<bool> {
        self.get_as(key, |v| match v {
            Value::BooleanArray(a) => Some(a),
            _ => None,
        })
        .unwrap_or_else(|| default.to_vec())
    }

    #[deprecated(note = "use get_boolean_array with a default instead")]
    pub fn boolean_array(
        &self,
        key: &str,
    ) -> Result<Vec<bool>> {
        self.require(key, |v| match v {
            Value::BooleanArray(a) => Some(a),
            _ => None,
        })
    }

    pub fn put_number_array(
        &self,
        key: &str,
        value: &[f64],
    ) -> bool {
        self.put(key, Value::DoubleArray(value.to_vec()))
    }

    pub fn get_number_array(
        &self,
        key: &str,
        default: &[f64],
    ) -> Vec<f64> {
        self.get_as(key, |v| match v {
            Value::DoubleArray(a) => Some(a),
            _ => None,
        })
        .unwrap_or_else(|| default.to_vec())
    }

    #[deprecated(note = "use get_number_array with a default instead")]
    pub fn number_array(
        &self,
        key: &str,
    ) -> Result<Vec<f64>> {
        self.require(key, |v| match v {
            Value::DoubleArray(a) => Some(a),
            _ => None,
        })
    }

    pub fn put_string_array(
        &self,
        key: &str,
        value: &[String],
    ) -> bool {
        self.put(key, Value::StringArray(value.to_vec()))
    }

    pub fn get_string_array(
        &self,
        key: &str,
        default: &[String],
    ) -> Vec<String> {
        self.get_as(key, |v| match v {
            Value::StringArray(a) => Some(a),
            _ => None,
        })
        .unwrap_or_else(|| default.to_vec())
    }

    #[deprecated(note = "use get_string_array with a default instead")]
    pub fn string_array(
        &self,
        key: &str,
    ) -> Result<Vec<String>> {
        self.require(key, |v| match v {
            Value::StringArray(a) => Some(a),
            _ => None,
        })
    }
}
