//! Entry values and the masks describing them.

mod flags;
mod put;


pub use flags::*;
pub use put::*;

use serde::Deserialize;
use serde::Serialize;

/// Value stored under one absolute key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Double(f64),
    String(String),
    Raw(Vec<u8>),
    BooleanArray(Vec<bool>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
}

/// Kind of an entry value; each kind owns one bit of a type mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum EntryType {
    Boolean = 0x01,
    Double = 0x02,
    String = 0x04,
    Raw = 0x08,
    BooleanArray = 0x10,
    DoubleArray = 0x20,
    StringArray = 0x40,
}

impl EntryType {
    #[inline]
    pub fn bit(self) -> u32 {
        self as u32
    }

    /// A mask of 0 matches every type.
    #[inline]
    pub fn matches(
        self,
        type_mask: u32,
    ) -> bool {
        type_mask == 0 || type_mask & self.bit() != 0
    }
}

impl Value {
    pub fn entry_type(&self) -> EntryType {
        match self {
            Value::Boolean(_) => EntryType::Boolean,
            Value::Double(_) => EntryType::Double,
            Value::String(_) => EntryType::String,
            Value::Raw(_) => EntryType::Raw,
            Value::BooleanArray(_) => EntryType::BooleanArray,
            Value::DoubleArray(_) => EntryType::DoubleArray,
            Value::StringArray(_) => EntryType::StringArray,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Value::Raw(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_boolean_array(&self) -> Option<&[bool]> {
        match self {
            Value::BooleanArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_double_array(&self) -> Option<&[f64]> {
        match self {
            Value::DoubleArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            Value::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

/// Entry metadata returned by enumeration
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    /// Absolute key
    pub name: String,
    pub entry_type: EntryType,
    pub flags: u32,
}

/// A remote peer as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionInfo {
    pub remote_id: String,
    pub remote_ip: String,
    pub remote_port: u16,
    /// Milliseconds since the epoch of the last message from the peer
    pub last_update: u64,
    pub protocol_version: u32,
}
