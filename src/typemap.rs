//! The base type map contract.
//!
//! Every type map variant answers the same six questions. Variants only
//! override the halves they support; the rest fall through to the default
//! implementations here, which refuse with [`TypeMapError::Unsupported`].

use crate::coder::CoderRef;
use crate::error::{TypeMapError, TypeMapResult};
use crate::value::Value;

/// Column metadata of a result set, as announced by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    pub name: String,
    pub type_oid: u32,
    /// 0 = text, 1 = binary
    pub format: i16,
}

/// Polymorphic type map contract shared by all type map variants.
pub trait TypeMap {
    /// Name used in error messages.
    fn type_name(&self) -> &'static str;

    /// Fit this map to a result set before decoding its rows.
    fn fit_to_result(&self, _fields: &[FieldDescription]) -> TypeMapResult<&dyn TypeMap> {
        Err(TypeMapError::unsupported(self.type_name(), "map result values"))
    }

    /// Fit this map to the parameter list of one query.
    fn fit_to_query(&self, _params: &[Value]) -> TypeMapResult<&dyn TypeMap> {
        Err(TypeMapError::unsupported(self.type_name(), "map query params"))
    }

    /// Fit this map to COPY row ingestion. Returns the expected column count.
    fn fit_to_copy_get(&self) -> TypeMapResult<usize> {
        Err(TypeMapError::unsupported(self.type_name(), "receive COPY data"))
    }

    /// Decode one result value.
    fn typecast_result_value(
        &self,
        _raw: Option<&[u8]>,
        _tuple: usize,
        _field: usize,
    ) -> TypeMapResult<Value> {
        Err(TypeMapError::unsupported(self.type_name(), "map result values"))
    }

    /// Select the coder for one query parameter at 0-based position `field`.
    ///
    /// `Ok(None)` means: use the default textual conversion.
    fn typecast_query_param(&self, _value: &Value, _field: usize) -> TypeMapResult<Option<CoderRef>> {
        Err(TypeMapError::unsupported(self.type_name(), "map query params"))
    }

    /// Decode one field of a COPY row.
    fn typecast_copy_get(&self, _raw: &[u8], _field: usize, _format: i16) -> TypeMapResult<Value> {
        Err(TypeMapError::unsupported(self.type_name(), "receive COPY data"))
    }
}
