//! Named methods backed by a coder registry.
//!
//! Lets configuration entries like `T_ARRAY = { method = "array_coder" }`
//! resolve without a caller-supplied [`MethodTable`].

use crate::by_category::{MethodTable, Resolved, TypeMapByCategory};
use crate::coder::CoderRegistry;
use crate::value::Value;

/// Registry coder picked by `array_coder` for integer arrays.
pub const INT8_ARRAY_CODER: &str = "int8[]";

/// Methods available to named resolvers of configured type maps.
///
/// | Method        | Returns                                                   |
/// |---------------|-----------------------------------------------------------|
/// | `array_coder` | the `int8[]` coder for non-empty integer arrays, else nil |
#[derive(Debug, Clone, Default)]
pub struct RegistryMethods {
    registry: CoderRegistry,
}

impl RegistryMethods {
    pub fn new(registry: CoderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CoderRegistry {
        &self.registry
    }

    fn array_coder(&self, value: &Value) -> Resolved {
        let homogeneous = value
            .as_array()
            .is_some_and(|items| !items.is_empty() && items.iter().all(|v| v.as_int().is_some()));
        if !homogeneous {
            return Resolved::Nil;
        }
        self.registry.get(INT8_ARRAY_CODER).cloned().into()
    }
}

impl MethodTable for RegistryMethods {
    fn call(map: &TypeMapByCategory<Self>, name: &str, value: &Value) -> Option<Resolved> {
        match name {
            "array_coder" => Some(map.methods().array_coder(value)),
            _ => None,
        }
    }
}
