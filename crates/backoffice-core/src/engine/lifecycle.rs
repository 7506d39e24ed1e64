//! Startup and shutdown of the back office.

use super::{BackOffice, EngineError};

impl BackOffice {
	/// Performs any initialization required before serving requests
	pub async fn initialize(&self) -> Result<(), EngineError> {
		tracing::info!(
			service_id = %self.config.service.id,
			tick_interval_seconds = self.config.tracker.tick_interval_seconds,
			"Initializing back office"
		);
		Ok(())
	}

	/// Stops every tracking session
	pub async fn shutdown(&self) -> Result<(), EngineError> {
		tracing::info!("Shutting down back office");
		self.tracker.stop_all();
		Ok(())
	}
}
