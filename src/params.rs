//! Casting query parameters through a type map.
//!
//! This is the caller side of dispatch: ask the map for a coder per
//! parameter, encode with it, or fall back to the value's textual form.

use crate::coder::{FORMAT_TEXT, oid};
use crate::error::{TypeMapError, TypeMapResult};
use crate::typemap::TypeMap;
use crate::value::Value;

/// One encoded bind parameter, ready for a Bind message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Wire bytes; `None` is NULL.
    pub value: Option<Vec<u8>>,
    pub oid: u32,
    pub format: i16,
    /// Name of the coder used, `None` for the textual fallback.
    pub coder: Option<String>,
}

impl Param {
    /// Default textual conversion with a server-inferred type.
    pub fn text(value: &Value) -> Self {
        Self {
            value: value.to_text().map(String::into_bytes),
            oid: oid::UNSPECIFIED,
            format: FORMAT_TEXT,
            coder: None,
        }
    }
}

/// Encode every parameter of one query.
pub fn typecast_params(map: &dyn TypeMap, params: &[Value]) -> TypeMapResult<Vec<Param>> {
    if params.len() > i16::MAX as usize {
        return Err(TypeMapError::TooManyParameters(params.len()));
    }

    let map = map.fit_to_query(params)?;
    let mut out = Vec::with_capacity(params.len());

    for (field, value) in params.iter().enumerate() {
        let param = match map.typecast_query_param(value, field)? {
            Some(coder) => Param {
                value: coder.encode(value)?,
                oid: coder.oid(),
                format: coder.format(),
                coder: Some(coder.name().to_string()),
            },
            None => Param::text(value),
        };
        out.push(param);
    }

    Ok(out)
}
