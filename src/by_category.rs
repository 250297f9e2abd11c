//! Type map selecting encoders by the runtime category of each value.
//!
//! One slot per [`Category`]. A slot is empty, holds a coder (static), or
//! holds a [`Resolver`] that picks the coder per value (dynamic).
//!
//! ```
//! use std::sync::Arc;
//! use qail_typemap::prelude::*;
//!
//! let int8: CoderRef = Arc::new(Int8Encoder);
//! let mut map = TypeMapByCategory::new();
//! map.assign("T_FIXNUM", int8.clone()).unwrap();
//!
//! let coder = map.typecast_query_param(&Value::Integer(7), 0).unwrap();
//! assert!(same_coder(&coder.unwrap(), &int8));
//! assert!(map.typecast_query_param(&Value::from("x"), 1).unwrap().is_none());
//! ```

use crate::category::Category;
use crate::coder::{CoderRef, same_coder};
use crate::error::{TypeMapError, TypeMapResult};
use crate::typemap::TypeMap;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// What a resolver hands back for one value.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// No coder: fall back to the default textual conversion.
    Nil,
    Coder(CoderRef),
    /// Any other value. Only [`Value::Nil`] is acceptable here.
    Value(Value),
}

impl From<CoderRef> for Resolved {
    fn from(coder: CoderRef) -> Self {
        Resolved::Coder(coder)
    }
}

impl From<Option<CoderRef>> for Resolved {
    fn from(coder: Option<CoderRef>) -> Self {
        coder.map_or(Resolved::Nil, Resolved::Coder)
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Resolved::Value(value)
    }
}

/// Signature of a callable resolver.
pub type ResolveFn = dyn Fn(&Value) -> Resolved + Send + Sync;

/// Per-category policy computing a coder at dispatch time.
#[derive(Clone)]
pub enum Resolver {
    /// Name of a method on the map, looked up through its [`MethodTable`]
    /// when a value is dispatched.
    Method(String),
    /// Standalone callable.
    Callable(Arc<ResolveFn>),
}

impl Resolver {
    pub fn method(name: impl Into<String>) -> Self {
        Resolver::Method(name.into())
    }

    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Resolved + Send + Sync + 'static,
    {
        Resolver::Callable(Arc::new(f))
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Method(name) => write!(f, "Method(:{})", name),
            Resolver::Callable(func) => write!(f, "Callable({:p})", Arc::as_ptr(func)),
        }
    }
}

impl PartialEq for Resolver {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Resolver::Method(a), Resolver::Method(b)) => a == b,
            (Resolver::Callable(a), Resolver::Callable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Storage cell for one category.
#[derive(Debug, Clone, Default)]
pub enum Slot {
    #[default]
    Empty,
    Static(CoderRef),
    Dynamic(Resolver),
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    /// The static coder, if any.
    pub fn coder(&self) -> Option<&CoderRef> {
        match self {
            Slot::Static(coder) => Some(coder),
            _ => None,
        }
    }

    /// The resolver, if any.
    pub fn resolver(&self) -> Option<&Resolver> {
        match self {
            Slot::Dynamic(resolver) => Some(resolver),
            _ => None,
        }
    }

    /// Short description for display.
    pub fn describe(&self) -> String {
        match self {
            Slot::Empty => "nil".to_string(),
            Slot::Static(coder) => coder.name().to_string(),
            Slot::Dynamic(Resolver::Method(name)) => format!(":{}", name),
            Slot::Dynamic(Resolver::Callable(_)) => "<callable>".to_string(),
        }
    }
}

// Identity, not structure: two slots are equal when they share the coder or resolver.
impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Slot::Empty, Slot::Empty) => true,
            (Slot::Static(a), Slot::Static(b)) => same_coder(a, b),
            (Slot::Dynamic(a), Slot::Dynamic(b)) => a == b,
            _ => false,
        }
    }
}

impl From<CoderRef> for Slot {
    fn from(coder: CoderRef) -> Self {
        Slot::Static(coder)
    }
}

impl From<Resolver> for Slot {
    fn from(resolver: Resolver) -> Self {
        Slot::Dynamic(resolver)
    }
}

impl From<Option<CoderRef>> for Slot {
    fn from(coder: Option<CoderRef>) -> Self {
        coder.map_or(Slot::Empty, Slot::Static)
    }
}

/// Methods that named resolvers can call.
///
/// Implement this on an extension type to give a [`TypeMapByCategory`]
/// additional methods. Lookup happens by name on every dispatch.
pub trait MethodTable: Sized {
    /// Name reported in error messages.
    const TYPE_NAME: &'static str = "TypeMapByCategory";

    /// Invoke method `name` with `value`. `None` if no such method exists.
    fn call(map: &TypeMapByCategory<Self>, name: &str, value: &Value) -> Option<Resolved>;
}

/// A method table with no methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMethods;

impl MethodTable for NoMethods {
    fn call(_map: &TypeMapByCategory<Self>, _name: &str, _value: &Value) -> Option<Resolved> {
        None
    }
}

/// Immutable snapshot of every category's slot, in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignments {
    entries: Vec<(Category, Slot)>,
}

impl Assignments {
    /// Slot recorded for a canonical category name.
    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.entries
            .iter()
            .find(|(category, _)| category.name() == name)
            .map(|(_, slot)| slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Slot)> {
        self.entries.iter().map(|(category, slot)| (category.name(), slot))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Dispatch table from value category to coder.
///
/// Holds strong references to every coder and resolver it stores; they are
/// released when a slot is reassigned or the map is dropped. The map has no
/// internal locking: share it across threads behind a lock of your choice.
#[derive(Debug, Clone)]
pub struct TypeMapByCategory<M = NoMethods> {
    slots: [Slot; Category::COUNT],
    methods: M,
}

impl TypeMapByCategory<NoMethods> {
    /// An empty map without extension methods.
    pub fn new() -> Self {
        Self::with_methods(NoMethods)
    }
}

impl Default for TypeMapByCategory<NoMethods> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> TypeMapByCategory<M> {
    /// An empty map whose named resolvers dispatch to `methods`.
    pub fn with_methods(methods: M) -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::Empty),
            methods,
        }
    }

    pub fn methods(&self) -> &M {
        &self.methods
    }

    pub fn methods_mut(&mut self) -> &mut M {
        &mut self.methods
    }

    /// Replace the slot of `category`.
    pub fn set(&mut self, category: Category, slot: impl Into<Slot>) {
        let slot = slot.into();
        tracing::debug!("Assign {} = {}", category, slot.describe());
        self.slots[category.index()] = slot;
    }

    /// Current slot of `category`.
    pub fn get(&self, category: Category) -> &Slot {
        &self.slots[category.index()]
    }

    /// Assign by canonical category name.
    ///
    /// Fails with [`TypeMapError::UnknownCategory`] and leaves the map
    /// untouched if `name` is not one of the canonical names.
    pub fn assign(&mut self, name: &str, slot: impl Into<Slot>) -> TypeMapResult<&mut Self> {
        let category: Category = name.parse()?;
        self.set(category, slot);
        Ok(self)
    }

    /// Read by canonical category name.
    pub fn lookup(&self, name: &str) -> TypeMapResult<Slot> {
        let category: Category = name.parse()?;
        Ok(self.get(category).clone())
    }

    /// Snapshot of all categories and their slots, empty ones included.
    pub fn all_assignments(&self) -> Assignments {
        let entries = Category::ALL
            .iter()
            .map(|&category| (category, self.get(category).clone()))
            .collect();
        Assignments { entries }
    }
}

impl<M: MethodTable> TypeMapByCategory<M> {
    fn resolve(&self, value: &Value, field: usize) -> TypeMapResult<Option<CoderRef>> {
        let Some(category) = value.category() else {
            tracing::trace!("Param {}: {} has no category, using text", field + 1, value.type_name());
            return Ok(None);
        };

        let resolver = match self.get(category) {
            Slot::Empty => {
                tracing::trace!("Param {}: {} slot empty, using text", field + 1, category);
                return Ok(None);
            }
            Slot::Static(coder) => {
                tracing::trace!("Param {}: {} uses {}", field + 1, category, coder.name());
                return Ok(Some(Arc::clone(coder)));
            }
            Slot::Dynamic(resolver) => resolver,
        };

        let resolved = match resolver {
            Resolver::Method(name) => {
                M::call(self, name, value).ok_or_else(|| TypeMapError::UndefinedMethod {
                    name: name.clone(),
                    map: M::TYPE_NAME,
                })?
            }
            Resolver::Callable(func) => func(value),
        };

        match resolved {
            Resolved::Nil | Resolved::Value(Value::Nil) => {
                tracing::trace!("Param {}: {} resolved to nil, using text", field + 1, category);
                Ok(None)
            }
            Resolved::Coder(coder) => {
                tracing::trace!("Param {}: {} resolved to {}", field + 1, category, coder.name());
                Ok(Some(coder))
            }
            Resolved::Value(other) => {
                tracing::trace!("Param {}: {} resolver returned {}", field + 1, category, other.type_name());
                Err(TypeMapError::mismatch(field, other.type_name()))
            }
        }
    }
}

impl<M: MethodTable> TypeMap for TypeMapByCategory<M> {
    fn type_name(&self) -> &'static str {
        M::TYPE_NAME
    }

    // Categories are computed per value, so any parameter list fits as is.
    fn fit_to_query(&self, _params: &[Value]) -> TypeMapResult<&dyn TypeMap> {
        Ok(self)
    }

    fn typecast_query_param(&self, value: &Value, field: usize) -> TypeMapResult<Option<CoderRef>> {
        self.resolve(value, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::{Int8Encoder, TextEncoder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn int8() -> CoderRef {
        Arc::new(Int8Encoder)
    }

    #[test]
    fn test_new_map_is_empty() {
        let map = TypeMapByCategory::new();
        for category in Category::ALL {
            assert!(map.get(category).is_empty());
        }
    }

    #[test]
    fn test_static_replaces_dynamic() {
        let mut map = TypeMapByCategory::new();
        map.set(Category::Array, Resolver::method("pick"));
        assert!(map.get(Category::Array).resolver().is_some());

        let coder = int8();
        map.set(Category::Array, coder.clone());
        assert!(map.get(Category::Array).resolver().is_none());
        assert!(same_coder(map.get(Category::Array).coder().unwrap(), &coder));

        map.set(Category::Array, Resolver::method("pick"));
        assert!(map.get(Category::Array).coder().is_none());
    }

    #[test]
    fn test_assign_none_clears() {
        let mut map = TypeMapByCategory::new();
        map.assign("T_FLOAT", int8()).unwrap();
        map.assign("T_FLOAT", None::<CoderRef>).unwrap();
        assert_eq!(map.lookup("T_FLOAT").unwrap(), Slot::Empty);
    }

    #[test]
    fn test_lookup_returns_assigned_resolver() {
        let mut map = TypeMapByCategory::new();
        let pick = Resolver::method("pick");
        map.assign("T_ARRAY", pick.clone()).unwrap();
        let slot = map.lookup("T_ARRAY").unwrap();
        assert_eq!(slot, Slot::Dynamic(pick.clone()));
        assert_eq!(slot.resolver(), Some(&pick));
        assert_ne!(slot.resolver(), Some(&Resolver::method("other")));

        let callable = Resolver::callable(|_| Resolved::Nil);
        map.assign("T_HASH", callable.clone()).unwrap();
        assert_eq!(map.lookup("T_HASH").unwrap().resolver(), Some(&callable));

        // A distinct closure is a different resolver, even with the same body.
        let other = Resolver::callable(|_| Resolved::Nil);
        assert_ne!(map.lookup("T_HASH").unwrap().resolver(), Some(&other));
    }

    #[test]
    fn test_assign_unknown_leaves_map_unchanged() {
        let mut map = TypeMapByCategory::new();
        map.assign("T_STRING", int8()).unwrap();
        let before = map.all_assignments();

        let err = map.assign("T_NIL", int8()).unwrap_err();
        assert!(matches!(err, TypeMapError::UnknownCategory(ref n) if n == "T_NIL"));
        assert_eq!(map.all_assignments(), before);
    }

    #[test]
    fn test_static_dispatch_skips_resolvers() {
        let mut map = TypeMapByCategory::new();
        let coder = int8();
        map.assign("T_FIXNUM", coder.clone()).unwrap();
        let got = map.typecast_query_param(&Value::Integer(1), 0).unwrap().unwrap();
        assert!(same_coder(&got, &coder));
    }

    #[test]
    fn test_callable_invoked_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let text: CoderRef = Arc::new(TextEncoder);
        let chosen = text.clone();

        let mut map = TypeMapByCategory::new();
        map.assign(
            "T_SYMBOL",
            Resolver::callable(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Resolved::Coder(chosen.clone())
            }),
        )
        .unwrap();

        let got = map
            .typecast_query_param(&Value::Symbol("s".into()), 0)
            .unwrap()
            .unwrap();
        assert!(same_coder(&got, &text));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_slot_yields_none() {
        let map = TypeMapByCategory::new();
        assert!(map.typecast_query_param(&Value::Float(1.0), 0).unwrap().is_none());
    }

    #[test]
    fn test_nil_falls_back_silently() {
        let mut map = TypeMapByCategory::new();
        for category in Category::ALL {
            map.set(category, Resolver::callable(|_| Resolved::Value(Value::Integer(1))));
        }
        assert!(map.typecast_query_param(&Value::Nil, 4).unwrap().is_none());
    }

    #[test]
    fn test_resolver_returning_nil_value() {
        let mut map = TypeMapByCategory::new();
        map.set(Category::Hash, Resolver::callable(|_| Value::Nil.into()));
        assert!(map.typecast_query_param(&Value::Hash(vec![]), 0).unwrap().is_none());
    }

    #[test]
    fn test_undefined_method() {
        let mut map = TypeMapByCategory::new();
        map.assign("T_ARRAY", Resolver::method("missing")).unwrap();
        let err = map
            .typecast_query_param(&Value::Array(vec![]), 0)
            .unwrap_err();
        assert_eq!(err.to_string(), "undefined method `missing' for TypeMapByCategory");
    }

    #[test]
    fn test_reassign_releases_coder() {
        let coder = int8();
        let mut map = TypeMapByCategory::new();
        map.set(Category::Fixnum, coder.clone());
        map.set(Category::Bignum, coder.clone());
        assert_eq!(Arc::strong_count(&coder), 3);

        map.set(Category::Fixnum, Slot::Empty);
        assert_eq!(Arc::strong_count(&coder), 2);

        drop(map);
        assert_eq!(Arc::strong_count(&coder), 1);
    }

    #[test]
    fn test_fit_to_query_is_identity() {
        let map = TypeMapByCategory::new();
        let fitted = map.fit_to_query(&[Value::Integer(1)]).unwrap();
        assert_eq!(fitted.type_name(), "TypeMapByCategory");
        assert!(map.fit_to_result(&[]).is_err());
        assert!(map.fit_to_copy_get().is_err());
    }

    #[test]
    fn test_slot_describe() {
        assert_eq!(Slot::Empty.describe(), "nil");
        assert_eq!(Slot::from(int8()).describe(), "int8");
        assert_eq!(Slot::from(Resolver::method("pick")).describe(), ":pick");
    }
}
