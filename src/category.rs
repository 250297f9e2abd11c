//! Representational categories of outgoing values.
//!
//! The set is closed: it mirrors the kinds of value the host value model can
//! produce and is not extensible by users of the type map.

use crate::error::TypeMapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The runtime kind of a value, independent of any declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "T_FIXNUM")]
    Fixnum,
    #[serde(rename = "T_TRUE")]
    True,
    #[serde(rename = "T_FALSE")]
    False,
    #[serde(rename = "T_FLOAT")]
    Float,
    #[serde(rename = "T_BIGNUM")]
    Bignum,
    #[serde(rename = "T_COMPLEX")]
    Complex,
    #[serde(rename = "T_RATIONAL")]
    Rational,
    #[serde(rename = "T_ARRAY")]
    Array,
    #[serde(rename = "T_STRING")]
    String,
    #[serde(rename = "T_SYMBOL")]
    Symbol,
    #[serde(rename = "T_OBJECT")]
    Object,
    #[serde(rename = "T_CLASS")]
    Class,
    #[serde(rename = "T_MODULE")]
    Module,
    #[serde(rename = "T_REGEXP")]
    Regexp,
    #[serde(rename = "T_HASH")]
    Hash,
    #[serde(rename = "T_STRUCT")]
    Struct,
    #[serde(rename = "T_FILE")]
    File,
    #[serde(rename = "T_DATA")]
    Data,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 18;

    /// Every category, in canonical order.
    pub const ALL: [Category; Self::COUNT] = [
        Category::Fixnum,
        Category::True,
        Category::False,
        Category::Float,
        Category::Bignum,
        Category::Complex,
        Category::Rational,
        Category::Array,
        Category::String,
        Category::Symbol,
        Category::Object,
        Category::Class,
        Category::Module,
        Category::Regexp,
        Category::Hash,
        Category::Struct,
        Category::File,
        Category::Data,
    ];

    /// Canonical name, as accepted by [`Category::from_str`].
    pub const fn name(self) -> &'static str {
        match self {
            Category::Fixnum => "T_FIXNUM",
            Category::True => "T_TRUE",
            Category::False => "T_FALSE",
            Category::Float => "T_FLOAT",
            Category::Bignum => "T_BIGNUM",
            Category::Complex => "T_COMPLEX",
            Category::Rational => "T_RATIONAL",
            Category::Array => "T_ARRAY",
            Category::String => "T_STRING",
            Category::Symbol => "T_SYMBOL",
            Category::Object => "T_OBJECT",
            Category::Class => "T_CLASS",
            Category::Module => "T_MODULE",
            Category::Regexp => "T_REGEXP",
            Category::Hash => "T_HASH",
            Category::Struct => "T_STRUCT",
            Category::File => "T_FILE",
            Category::Data => "T_DATA",
        }
    }

    /// Slot index of this category.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = TypeMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| TypeMapError::UnknownCategory(s.to_string()))
    }
}
