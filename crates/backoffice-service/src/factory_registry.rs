//! Registry of the storage implementations the service can be built with.
//!
//! Every implementation exported by the storage crate is registered once;
//! the configuration then picks which of them to instantiate by name.

use backoffice_config::Config;
use backoffice_core::{BackOffice, BackOfficeBuilder};
use backoffice_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Known implementation factories by name.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
		}
	}

	/// Register a storage implementation
	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Get the global factory registry, registering every implementation on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();
		for (name, factory) in backoffice_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}
		registry
	})
}

/// Builds the back office from configuration.
///
/// Fails when the configuration names a storage implementation that is not
/// registered.
pub fn build_back_office(config: Config) -> Result<BackOffice, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let mut storage_factories = HashMap::new();
	for name in config.storage.implementations.keys() {
		let Some(factory) = registry.storage.get(name) else {
			let mut available: Vec<_> = registry.storage.keys().cloned().collect();
			available.sort();
			return Err(format!(
				"Unknown storage implementation '{}'. Available: [{}]",
				name,
				available.join(", ")
			)
			.into());
		};
		storage_factories.insert(name.clone(), *factory);
	}

	Ok(BackOfficeBuilder::new(config).build(storage_factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registry_has_all_storage_backends() {
		let registry = get_registry();
		assert!(registry.storage.contains_key("memory"));
		assert!(registry.storage.contains_key("file"));
	}

	#[test]
	fn test_unknown_implementation_is_reported() {
		let config: Config = r#"
[service]
id = "tienda-test"

[storage]
primary = "redis"
[storage.implementations.redis]
url = "redis://localhost"
"#
		.parse()
		.unwrap();

		let err = build_back_office(config).err().unwrap();
		assert!(err
			.to_string()
			.contains("Unknown storage implementation 'redis'. Available: [file, memory]"));
	}
}
