//! Order records.
//!
//! Orders start as "Pendiente" and carry a free-text status afterwards. The
//! store is also the tracker's status writer, so automatic and manual status
//! changes go through the same update path.

use super::{missing_as_not_found, new_id, required_text, RecordError};
use crate::tracker::{StatusWriter, WriteError};
use async_trait::async_trait;
use backoffice_storage::StorageService;
use backoffice_types::{current_timestamp, Order, StorageKey, NEW_ORDER_LABEL};
use chrono::{DateTime, Utc};
use std::sync::Arc;

const ENTITY: &str = "Order";

/// Persists orders and applies status changes.
pub struct OrderStore {
	storage: Arc<StorageService>,
}

impl OrderStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Creates a new pending order for a company.
	pub async fn create_order(
		&self,
		company_id: &str,
		customer: &str,
		description: &str,
		due_date: Option<DateTime<Utc>>,
	) -> Result<Order, RecordError> {
		let now = current_timestamp();
		let order = Order {
			id: new_id(),
			company_id: company_id.to_string(),
			customer: required_text("customer", customer)?,
			description: description.trim().to_string(),
			status: NEW_ORDER_LABEL.to_string(),
			due_date,
			created_at: now,
			updated_at: now,
		};

		self.storage
			.store(StorageKey::Orders.as_str(), &order.id, &order)
			.await?;
		Ok(order)
	}

	/// Gets an order by ID
	pub async fn get_order(&self, order_id: &str) -> Result<Order, RecordError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(missing_as_not_found(ENTITY, order_id))
	}

	/// Lists a company's orders, nearest due date first and undated last.
	pub async fn list_orders(&self, company_id: &str) -> Result<Vec<Order>, RecordError> {
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all::<Order>(StorageKey::Orders.as_str())
			.await?
			.into_iter()
			.filter(|order| order.company_id == company_id)
			.collect();

		orders.sort_by(|a, b| match (a.due_date, b.due_date) {
			(Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
			(Some(_), None) => std::cmp::Ordering::Less,
			(None, Some(_)) => std::cmp::Ordering::Greater,
			(None, None) => b.created_at.cmp(&a.created_at),
		});
		Ok(orders)
	}

	/// Updates an order with a closure and persists it
	pub async fn update_order_with<F>(&self, order_id: &str, updater: F) -> Result<Order, RecordError>
	where
		F: FnOnce(&mut Order),
	{
		let mut order = self.get_order(order_id).await?;

		updater(&mut order);
		order.updated_at = current_timestamp();

		self.storage
			.update(StorageKey::Orders.as_str(), order_id, &order)
			.await
			.map_err(missing_as_not_found(ENTITY, order_id))?;

		Ok(order)
	}

	/// Replaces the status label of an order.
	pub async fn update_status(&self, order_id: &str, status: &str) -> Result<Order, RecordError> {
		let status = required_text("status", status)?;
		self.update_order_with(order_id, |order| order.status = status)
			.await
	}

	/// Deletes an order. Fails with `NotFound` if it does not exist.
	pub async fn delete_order(&self, order_id: &str) -> Result<(), RecordError> {
		if !self
			.storage
			.exists(StorageKey::Orders.as_str(), order_id)
			.await?
		{
			return Err(RecordError::not_found(ENTITY, order_id));
		}
		self.storage
			.remove(StorageKey::Orders.as_str(), order_id)
			.await?;
		Ok(())
	}
}

#[async_trait]
impl StatusWriter for OrderStore {
	async fn write_status(&self, order_id: &str, status: &str) -> Result<(), WriteError> {
		match self.update_status(order_id, status).await {
			Ok(_) => Ok(()),
			Err(RecordError::NotFound { id, .. }) => Err(WriteError::NotFound(id)),
			Err(e) => Err(WriteError::Failed(e.to_string())),
		}
	}
}
