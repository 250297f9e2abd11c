//! Type map configuration.
//!
//! ```toml
//! [coders]
//! T_FIXNUM = "int8"
//! T_STRING = "text"
//! T_ARRAY = { method = "array_coder" }
//! ```
//!
//! Method entries resolve through the map's [`MethodTable`]. Build with
//! [`TypeMapConfig::build_with_registry`] to get `array_coder`, or hand a map
//! with your own methods to [`TypeMapConfig::apply`].

use crate::by_category::{MethodTable, NoMethods, Resolver, Slot, TypeMapByCategory};
use crate::category::Category;
use crate::coder::CoderRegistry;
use crate::error::{TypeMapError, TypeMapResult};
use crate::methods::RegistryMethods;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What to install in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SlotSpec {
    /// Name of a registered coder.
    Coder(String),
    /// Named-method resolver.
    Method { method: String },
}

/// Slot assignments keyed by canonical category name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeMapConfig {
    #[serde(default)]
    pub coders: BTreeMap<String, SlotSpec>,
}

impl TypeMapConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> TypeMapResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> TypeMapResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded {} type map entries from {}", config.coders.len(), path.display());
        Ok(config)
    }

    /// `<config dir>/qail/typemap.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qail").join("typemap.toml"))
    }

    /// Install every entry into `map`.
    ///
    /// All entries are validated before the first assignment, so an error
    /// leaves `map` as it was.
    pub fn apply<M: MethodTable>(
        &self,
        map: &mut TypeMapByCategory<M>,
        registry: &CoderRegistry,
    ) -> TypeMapResult<()> {
        let mut planned = Vec::with_capacity(self.coders.len());

        for (name, spec) in &self.coders {
            let category: Category = name.parse()?;
            let slot = match spec {
                SlotSpec::Coder(coder) => registry
                    .get(coder)
                    .cloned()
                    .map(Slot::Static)
                    .ok_or_else(|| TypeMapError::UnknownCoder(coder.clone()))?,
                SlotSpec::Method { method } if method.is_empty() => {
                    return Err(TypeMapError::Config(format!(
                        "empty method name for {}",
                        category
                    )));
                }
                SlotSpec::Method { method } => Slot::Dynamic(Resolver::method(method.clone())),
            };
            planned.push((category, slot));
        }

        for (category, slot) in planned {
            map.set(category, slot);
        }
        tracing::debug!("Applied {} type map entries", self.coders.len());
        Ok(())
    }

    /// Build a fresh map without extension methods.
    pub fn build(&self, registry: &CoderRegistry) -> TypeMapResult<TypeMapByCategory> {
        self.build_with(registry, NoMethods)
    }

    /// Build a fresh map whose named resolvers dispatch to `methods`.
    pub fn build_with<M: MethodTable>(
        &self,
        registry: &CoderRegistry,
        methods: M,
    ) -> TypeMapResult<TypeMapByCategory<M>> {
        let mut map = TypeMapByCategory::with_methods(methods);
        self.apply(&mut map, registry)?;
        Ok(map)
    }

    /// Build a fresh map with [`RegistryMethods`] over `registry`.
    pub fn build_with_registry(
        &self,
        registry: &CoderRegistry,
    ) -> TypeMapResult<TypeMapByCategory<RegistryMethods>> {
        self.build_with(registry, RegistryMethods::new(registry.clone()))
    }
}
