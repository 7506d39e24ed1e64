//! Company-scoped records on top of the storage service.
//!
//! Each store owns one kind of record: orders, order notes, customers with
//! their ledger movements, and user profiles. Lists are always filtered by
//! the owning company or parent record.

pub mod ledger;
pub mod notes;
pub mod order;
pub mod profiles;

pub use ledger::{CustomerLedger, CustomerStatement};
pub use notes::NoteLog;
pub use order::OrderStore;
pub use profiles::ProfileDirectory;

use backoffice_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while reading or changing records.
#[derive(Debug, Error)]
pub enum RecordError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("{entity} not found: {id}")]
	NotFound { entity: &'static str, id: String },
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<StorageError> for RecordError {
	fn from(err: StorageError) -> Self {
		RecordError::Storage(err.to_string())
	}
}

impl RecordError {
	pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
		RecordError::NotFound {
			entity,
			id: id.to_string(),
		}
	}
}

/// Maps a storage miss on `entity`/`id` to [`RecordError::NotFound`].
pub(crate) fn missing_as_not_found<'a>(
	entity: &'static str,
	id: &'a str,
) -> impl FnOnce(StorageError) -> RecordError + 'a {
	move |err| match err {
		StorageError::NotFound => RecordError::not_found(entity, id),
		other => other.into(),
	}
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, RecordError> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(RecordError::Validation(format!("{} cannot be empty", field)));
	}
	Ok(trimmed.to_string())
}

pub(crate) fn new_id() -> String {
	uuid::Uuid::new_v4().to_string()
}
