//! Order history notes.

use super::{new_id, required_text, RecordError};
use backoffice_storage::StorageService;
use backoffice_types::{OrderNote, StorageKey};
use chrono::Utc;
use std::sync::Arc;

/// Free-text notes attached to orders.
pub struct NoteLog {
	storage: Arc<StorageService>,
}

impl NoteLog {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Adds a note to an existing order.
	pub async fn add_note(
		&self,
		order_id: &str,
		text: &str,
		author: &str,
	) -> Result<OrderNote, RecordError> {
		let text = required_text("text", text)?;
		if !self
			.storage
			.exists(StorageKey::Orders.as_str(), order_id)
			.await?
		{
			return Err(RecordError::not_found("Order", order_id));
		}

		let note = OrderNote {
			id: new_id(),
			order_id: order_id.to_string(),
			text,
			author: author.to_string(),
			created_at: Utc::now(),
		};
		self.storage
			.store(StorageKey::OrderNotes.as_str(), &note.id, &note)
			.await?;
		Ok(note)
	}

	/// Notes of an order, newest first.
	pub async fn list_notes(&self, order_id: &str) -> Result<Vec<OrderNote>, RecordError> {
		let mut notes: Vec<OrderNote> = self
			.storage
			.retrieve_all::<OrderNote>(StorageKey::OrderNotes.as_str())
			.await?
			.into_iter()
			.filter(|note| note.order_id == order_id)
			.collect();
		notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(notes)
	}

	/// Removes every note of an order. Returns how many were removed.
	pub async fn remove_all(&self, order_id: &str) -> Result<usize, RecordError> {
		let notes = self.list_notes(order_id).await?;
		for note in &notes {
			self.storage
				.remove(StorageKey::OrderNotes.as_str(), &note.id)
				.await?;
		}
		Ok(notes.len())
	}
}
