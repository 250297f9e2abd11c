//! Error types for the type map.

use thiserror::Error;

/// The main error type for type map operations.
#[derive(Debug, Error)]
pub enum TypeMapError {
    /// Category name outside the fixed set of canonical names.
    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    /// A resolver returned something that is neither nil nor a coder.
    #[error("argument {position} has invalid type {type_name} (should be nil or some kind of Coder)")]
    TypeMismatch { position: usize, type_name: String },

    /// A named-method resolver refers to a method the map does not define.
    #[error("undefined method `{name}' for {map}")]
    UndefinedMethod { name: String, map: &'static str },

    /// The type map does not implement this half of the type map contract.
    #[error("type map {map} is not suitable to {operation}")]
    Unsupported {
        map: &'static str,
        operation: &'static str,
    },

    /// A coder was handed a value it cannot encode.
    #[error("coder {coder} cannot encode values of type {type_name}")]
    Encode { coder: String, type_name: String },

    /// Too many parameters for the protocol (limit is i16::MAX).
    #[error("Too many parameters: {0} (limit is 32767)")]
    TooManyParameters(usize),

    /// Coder name not present in the registry.
    #[error("unknown coder {0:?}")]
    UnknownCoder(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration.
    #[error("Configuration error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TypeMapError {
    /// Create a type mismatch error for the 0-based parameter `field`.
    pub fn mismatch(field: usize, type_name: impl Into<String>) -> Self {
        Self::TypeMismatch {
            position: field + 1,
            type_name: type_name.into(),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(map: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { map, operation }
    }
}

/// Result type alias for type map operations.
pub type TypeMapResult<T> = Result<T, TypeMapError>;
