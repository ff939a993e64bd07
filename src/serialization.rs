use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One event argument. Events carry a heterogeneous list of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<ArgValue>),
    Map(Vec<(String, ArgValue)>),
}

impl ArgValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            ArgValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Float(v) => Some(*v),
            ArgValue::Int(v) => Some(*v as f64),
            ArgValue::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::UInt(v as u64)
    }
}

impl From<u64> for ArgValue {
    fn from(v: u64) -> Self {
        ArgValue::UInt(v)
    }
}

impl From<f32> for ArgValue {
    fn from(v: f32) -> Self {
        ArgValue::Float(v as f64)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(v: Vec<u8>) -> Self {
        ArgValue::Bytes(v)
    }
}

impl From<Vec<ArgValue>> for ArgValue {
    fn from(v: Vec<ArgValue>) -> Self {
        ArgValue::List(v)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgFormat {
    Json,
    #[default]
    MessagePack,
    Bincode,
}

/// Packs event argument lists. Both peers must use the same format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgSerializer {
    format: ArgFormat,
}

impl ArgSerializer {
    pub fn new(format: ArgFormat) -> Self {
        Self { format }
    }

    pub fn json() -> Self {
        Self::new(ArgFormat::Json)
    }

    pub fn messagepack() -> Self {
        Self::new(ArgFormat::MessagePack)
    }

    pub fn bincode() -> Self {
        Self::new(ArgFormat::Bincode)
    }

    pub fn serialize(&self, args: &[ArgValue]) -> Result<Vec<u8>> {
        match self.format {
            ArgFormat::Json => Ok(serde_json::to_vec(args)?),
            ArgFormat::MessagePack => Ok(rmp_serde::to_vec(args)?),
            ArgFormat::Bincode => Ok(bincode::serialize(args)?),
        }
    }

    pub fn deserialize(&self, data: &[u8]) -> Result<Vec<ArgValue>> {
        match self.format {
            ArgFormat::Json => Ok(serde_json::from_slice(data)?),
            ArgFormat::MessagePack => Ok(rmp_serde::from_slice(data)?),
            ArgFormat::Bincode => Ok(bincode::deserialize(data)?),
        }
    }

    pub fn get_format(&self) -> ArgFormat {
        self.format
    }
}
