//! Dynamic values sent as query parameters.
//!
//! [`Value`] is the host value model: client code hands the driver values of
//! heterogeneous origin, and the type map only ever looks at which kind of
//! value it got. [`Value::category`] is the classifier.

use crate::category::Category;
use std::fmt::Write as _;
use std::path::PathBuf;

/// A dynamically-typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (SQL NULL). Has no category.
    Nil,
    /// Machine-sized integer.
    Integer(i64),
    Bool(bool),
    Float(f64),
    /// Integer too large for `i64`, kept as decimal digits.
    BigInt(String),
    Complex { re: f64, im: f64 },
    Rational { numer: i64, denom: i64 },
    Array(Vec<Value>),
    String(String),
    /// Interned name.
    Symbol(String),
    /// Instance of a user class with named fields.
    Object {
        class: String,
        fields: Vec<(String, Value)>,
    },
    /// A class, by name.
    Class(String),
    /// A module, by name.
    Module(String),
    /// Regular expression source.
    Regexp(String),
    /// Associative map; keys keep insertion order.
    Hash(Vec<(Value, Value)>),
    /// Fixed record.
    Struct {
        name: String,
        fields: Vec<(String, Value)>,
    },
    /// Open file handle, by path.
    File(PathBuf),
    /// Opaque data wrapped by a native extension.
    Data { type_name: String, bytes: Vec<u8> },
}

impl Value {
    /// Build an integer, spilling into [`Value::BigInt`] beyond `i64`.
    pub fn integer(n: i128) -> Self {
        match i64::try_from(n) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::BigInt(n.to_string()),
        }
    }

    /// The representational category, or `None` for values outside the
    /// fixed enumeration.
    pub fn category(&self) -> Option<Category> {
        let category = match self {
            Value::Nil => return None,
            Value::Integer(_) => Category::Fixnum,
            Value::Bool(true) => Category::True,
            Value::Bool(false) => Category::False,
            Value::Float(_) => Category::Float,
            Value::BigInt(_) => Category::Bignum,
            Value::Complex { .. } => Category::Complex,
            Value::Rational { .. } => Category::Rational,
            Value::Array(_) => Category::Array,
            Value::String(_) => Category::String,
            Value::Symbol(_) => Category::Symbol,
            Value::Object { .. } => Category::Object,
            Value::Class(_) => Category::Class,
            Value::Module(_) => Category::Module,
            Value::Regexp(_) => Category::Regexp,
            Value::Hash(_) => Category::Hash,
            Value::Struct { .. } => Category::Struct,
            Value::File(_) => Category::File,
            Value::Data { .. } => Category::Data,
        };
        Some(category)
    }

    /// Runtime class name, for error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "nil",
            Value::Integer(_) => "integer",
            Value::Bool(true) => "true",
            Value::Bool(false) => "false",
            Value::Float(_) => "float",
            Value::BigInt(_) => "bignum",
            Value::Complex { .. } => "complex",
            Value::Rational { .. } => "rational",
            Value::Array(_) => "array",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Object { class, .. } => class.as_str(),
            Value::Class(_) => "class",
            Value::Module(_) => "module",
            Value::Regexp(_) => "regexp",
            Value::Hash(_) => "hash",
            Value::Struct { name, .. } => name.as_str(),
            Value::File(_) => "file",
            Value::Data { type_name, .. } => type_name.as_str(),
        }
    }

    /// Check if nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Try to get as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as array elements.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Default textual conversion, used when no coder is selected.
    ///
    /// Returns `None` for nil, which goes over the wire as NULL.
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            Value::Nil => return None,
            Value::Integer(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Float(f) => float_text(*f),
            Value::BigInt(digits) => digits.clone(),
            Value::Complex { re, im } => {
                let sign = if im.is_sign_negative() { '-' } else { '+' };
                format!("{}{}{}i", float_text(*re), sign, float_text(im.abs()))
            }
            Value::Rational { numer, denom } => format!("{}/{}", numer, denom),
            Value::Array(items) => array_literal(items),
            Value::String(s) | Value::Symbol(s) => s.clone(),
            Value::Object { class, .. } => format!("#<{}>", class),
            Value::Class(name) | Value::Module(name) => name.clone(),
            Value::Regexp(source) => source.clone(),
            Value::Hash(_) => self.to_json().to_string(),
            Value::Struct { name, fields } => {
                let mut out = format!("#<struct {}", name);
                for (i, (field, value)) in fields.iter().enumerate() {
                    out.push_str(if i == 0 { " " } else { ", " });
                    let _ = write!(out, "{}={}", field, value.to_text().unwrap_or_default());
                }
                out.push('>');
                out
            }
            Value::File(path) => path.display().to_string(),
            Value::Data { bytes, .. } => {
                let mut out = String::with_capacity(2 + bytes.len() * 2);
                out.push_str("\\x");
                for b in bytes {
                    let _ = write!(out, "{:02x}", b);
                }
                out
            }
        };
        Some(text)
    }

    /// Convert to a JSON value, for display.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Nil => Json::Null,
            Value::Integer(i) => Json::from(*i),
            Value::Bool(b) => Json::Bool(*b),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or_else(|| Json::String(float_text(*f))),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Hash(pairs) => {
                let map = pairs
                    .iter()
                    .map(|(k, v)| (k.to_text().unwrap_or_default(), v.to_json()))
                    .collect();
                Json::Object(map)
            }
            Value::Object { fields, .. } | Value::Struct { fields, .. } => {
                let map = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                Json::Object(map)
            }
            other => other.to_text().map(Json::String).unwrap_or(Json::Null),
        }
    }
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        format!("{:?}", f)
    }
}

/// PostgreSQL array literal: `{1,2,"a b",NULL}`.
fn array_literal(items: &[Value]) -> String {
    let mut out = String::from("{");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match item {
            Value::Nil => out.push_str("NULL"),
            Value::Array(inner) => out.push_str(&array_literal(inner)),
            Value::Integer(_) | Value::Float(_) | Value::BigInt(_) | Value::Bool(_) => {
                out.push_str(&item.to_text().unwrap_or_default())
            }
            other => {
                out.push('"');
                for ch in other.to_text().unwrap_or_default().chars() {
                    if ch == '"' || ch == '\\' {
                        out.push('\\');
                    }
                    out.push(ch);
                }
                out.push('"');
            }
        }
    }
    out.push('}');
    out
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match v {
            Json::Null => Value::Nil,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Value::BigInt(u.to_string())
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Hash(
                map.into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}
