//! Coder capability contract and a handful of built-in encoders.
//!
//! The type map only selects coders; it never calls [`Coder::encode`] itself.
//! Encoding happens in the parameter casting layer (see [`crate::params`]).

use crate::error::{TypeMapError, TypeMapResult};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Well-known PostgreSQL type OIDs used by the built-in coders.
pub mod oid {
    /// Let the server infer the parameter type.
    pub const UNSPECIFIED: u32 = 0;
    pub const BOOL: u32 = 16;
    pub const INT8: u32 = 20; // bigint
    pub const TEXT: u32 = 25;
    pub const FLOAT8: u32 = 701;
    pub const INT8_ARRAY: u32 = 1016;
}

/// Text format code.
pub const FORMAT_TEXT: i16 = 0;
/// Binary format code.
pub const FORMAT_BINARY: i16 = 1;

/// An encoder for one outgoing value.
pub trait Coder: fmt::Debug + Send + Sync {
    /// Human-readable coder name.
    fn name(&self) -> &str;

    /// Type OID announced to the server.
    fn oid(&self) -> u32;

    /// Wire format code: 0 = text, 1 = binary.
    fn format(&self) -> i16;

    /// Encode `value` into wire bytes. `Ok(None)` encodes NULL.
    fn encode(&self, value: &Value) -> TypeMapResult<Option<Vec<u8>>>;
}

/// Shared handle to a coder. Identity is pointer identity.
pub type CoderRef = Arc<dyn Coder>;

/// Compare two coder handles by identity.
pub fn same_coder(a: &CoderRef, b: &CoderRef) -> bool {
    Arc::ptr_eq(a, b)
}

fn reject(coder: &dyn Coder, value: &Value) -> TypeMapError {
    TypeMapError::Encode {
        coder: coder.name().to_string(),
        type_name: value.type_name().to_string(),
    }
}

// ==================== Built-in Coders ====================

/// Encodes any value through its default textual conversion.
#[derive(Debug, Default)]
pub struct TextEncoder;

impl Coder for TextEncoder {
    fn name(&self) -> &str {
        "text"
    }

    fn oid(&self) -> u32 {
        oid::TEXT
    }

    fn format(&self) -> i16 {
        FORMAT_TEXT
    }

    fn encode(&self, value: &Value) -> TypeMapResult<Option<Vec<u8>>> {
        let Some(text) = value.to_text() else {
            return Ok(None);
        };
        if text.as_bytes().contains(&0) {
            return Err(TypeMapError::Encode {
                coder: self.name().to_string(),
                type_name: "string with NULL byte".to_string(),
            });
        }
        Ok(Some(text.into_bytes()))
    }
}

/// 8 bytes big-endian bigint.
#[derive(Debug, Default)]
pub struct Int8Encoder;

impl Coder for Int8Encoder {
    fn name(&self) -> &str {
        "int8"
    }

    fn oid(&self) -> u32 {
        oid::INT8
    }

    fn format(&self) -> i16 {
        FORMAT_BINARY
    }

    fn encode(&self, value: &Value) -> TypeMapResult<Option<Vec<u8>>> {
        match value {
            Value::Nil => Ok(None),
            Value::Integer(i) => Ok(Some(i.to_be_bytes().to_vec())),
            other => Err(reject(self, other)),
        }
    }
}

/// 8 bytes IEEE 754 double.
#[derive(Debug, Default)]
pub struct Float8Encoder;

impl Coder for Float8Encoder {
    fn name(&self) -> &str {
        "float8"
    }

    fn oid(&self) -> u32 {
        oid::FLOAT8
    }

    fn format(&self) -> i16 {
        FORMAT_BINARY
    }

    fn encode(&self, value: &Value) -> TypeMapResult<Option<Vec<u8>>> {
        match value {
            Value::Nil => Ok(None),
            Value::Float(f) => Ok(Some(f.to_be_bytes().to_vec())),
            Value::Integer(i) => Ok(Some((*i as f64).to_be_bytes().to_vec())),
            other => Err(reject(self, other)),
        }
    }
}

/// Single byte boolean.
#[derive(Debug, Default)]
pub struct BoolEncoder;

impl Coder for BoolEncoder {
    fn name(&self) -> &str {
        "bool"
    }

    fn oid(&self) -> u32 {
        oid::BOOL
    }

    fn format(&self) -> i16 {
        FORMAT_BINARY
    }

    fn encode(&self, value: &Value) -> TypeMapResult<Option<Vec<u8>>> {
        match value {
            Value::Nil => Ok(None),
            Value::Bool(b) => Ok(Some(vec![*b as u8])),
            other => Err(reject(self, other)),
        }
    }
}

/// Integer array as a text array literal: `{1,2,3}`.
#[derive(Debug, Default)]
pub struct Int8ArrayEncoder;

impl Coder for Int8ArrayEncoder {
    fn name(&self) -> &str {
        "int8[]"
    }

    fn oid(&self) -> u32 {
        oid::INT8_ARRAY
    }

    fn format(&self) -> i16 {
        FORMAT_TEXT
    }

    fn encode(&self, value: &Value) -> TypeMapResult<Option<Vec<u8>>> {
        match value {
            Value::Nil => Ok(None),
            Value::Array(items) if items.iter().all(|v| v.is_nil() || v.as_int().is_some()) => {
                Ok(value.to_text().map(String::into_bytes))
            }
            other => Err(reject(self, other)),
        }
    }
}

// ==================== Registry ====================

/// Named coders available to configuration.
#[derive(Debug, Clone, Default)]
pub struct CoderRegistry {
    coders: BTreeMap<String, CoderRef>,
}

impl CoderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `text`, `int8`, `int8[]`, `float8` and `bool`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("text", Arc::new(TextEncoder));
        registry.register("int8", Arc::new(Int8Encoder));
        registry.register("float8", Arc::new(Float8Encoder));
        registry.register("bool", Arc::new(BoolEncoder));
        registry.register("int8[]", Arc::new(Int8ArrayEncoder));
        registry
    }

    /// Register (or replace) a coder under `name`.
    pub fn register(&mut self, name: impl Into<String>, coder: CoderRef) {
        self.coders.insert(name.into(), coder);
    }

    /// Look up a coder by name.
    pub fn get(&self, name: &str) -> Option<&CoderRef> {
        self.coders.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.coders.keys().map(String::as_str)
    }
}
