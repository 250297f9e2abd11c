//! # qail-typemap — category-keyed encoder dispatch
//!
//! Decides, for each outgoing query parameter, which coder turns it into
//! wire bytes. The decision is keyed on what kind of value was passed
//! (an integer, an array, a string, ...), not on a declared column type.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qail_typemap::prelude::*;
//!
//! let int8: CoderRef = Arc::new(Int8Encoder);
//! let array_coder: CoderRef = Arc::new(TextEncoder);
//!
//! let mut map = TypeMapByCategory::new();
//! map.assign("T_FIXNUM", int8)?;
//! map.assign("T_ARRAY", Resolver::callable(move |value| {
//!     let all_ints = value
//!         .as_array()
//!         .is_some_and(|items| items.iter().all(|v| v.as_int().is_some()));
//!     if all_ints { Resolved::Coder(array_coder.clone()) } else { Resolved::Nil }
//! }))?;
//!
//! let params = vec![Value::Integer(7), Value::from(vec![Value::from("a"), Value::Integer(1)])];
//! let encoded = typecast_params(&map, &params)?;
//! assert_eq!(encoded[0].coder.as_deref(), Some("int8"));
//! assert_eq!(encoded[1].coder, None); // textual fallback
//! # Ok::<(), TypeMapError>(())
//! ```
//!
//! ## Slots
//!
//! | Slot      | Dispatch result                                 |
//! |-----------|-------------------------------------------------|
//! | empty     | `None`, the caller converts the value to text   |
//! | static    | the stored coder                                |
//! | dynamic   | whatever the resolver returns for this value    |

pub mod by_category;
pub mod category;
pub mod coder;
pub mod config;
pub mod error;
pub mod methods;
pub mod params;
pub mod typemap;
pub mod value;

pub mod prelude {
    pub use crate::by_category::{
        Assignments, MethodTable, NoMethods, Resolved, Resolver, Slot, TypeMapByCategory,
    };
    pub use crate::category::Category;
    pub use crate::coder::{
        BoolEncoder, Coder, CoderRef, CoderRegistry, Float8Encoder, Int8ArrayEncoder, Int8Encoder,
        TextEncoder, same_coder,
    };
    pub use crate::config::{SlotSpec, TypeMapConfig};
    pub use crate::error::*;
    pub use crate::methods::RegistryMethods;
    pub use crate::params::{Param, typecast_params};
    pub use crate::typemap::{FieldDescription, TypeMap};
    pub use crate::value::Value;
}

pub use by_category::TypeMapByCategory;
pub use error::{TypeMapError, TypeMapResult};
