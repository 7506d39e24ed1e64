//! Builder for the back office.
//!
//! Creates the configured storage implementations through their factories,
//! picks the primary one and wires the stores, tracker and event bus on top
//! of it.

use crate::engine::{event_bus::EventBus, BackOffice};
use crate::tracker::{Clock, SystemClock};
use backoffice_config::Config;
use backoffice_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Buffered events per subscriber before slow subscribers start lagging.
const EVENT_BUS_CAPACITY: usize = 1000;

/// Errors that can occur while building the back office.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Builder for constructing a [`BackOffice`] with pluggable storage.
pub struct BackOfficeBuilder {
	config: Config,
	clock: Arc<dyn Clock>,
}

impl BackOfficeBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			clock: Arc::new(SystemClock),
		}
	}

	/// Replaces the wall clock used by the due-date tracker.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	/// Builds the back office using the given storage factories.
	pub fn build<SF>(self, storage_factories: HashMap<String, SF>) -> Result<BackOffice, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = storage_factories.get(name) else {
				tracing::warn!(
					component = "storage",
					implementation = %name,
					"No factory registered, skipping"
				);
				continue;
			};

			match factory(config) {
				Ok(implementation) => {
					storage_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		if storage_impls.is_empty() {
			return Err(BuilderError::MissingComponent(
				"No valid storage implementations available".into(),
			));
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
		Ok(BackOffice::new(self.config, storage, self.clock, event_bus))
	}
}
