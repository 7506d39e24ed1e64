//! Back-office facade.
//!
//! [`BackOffice`] ties the record stores, the due-date tracker and the event
//! bus together. Requests are scoped by resolving the caller's profile to a
//! company; every change is published on the bus after it is persisted.

use crate::state::{CustomerLedger, NoteLog, OrderStore, ProfileDirectory, RecordError};
use crate::tracker::{Clock, OrderTracker, StatusWriter};
use backoffice_config::Config;
use backoffice_storage::StorageService;
use backoffice_types::{
	truncate_id, BackOfficeEvent, CreateCustomerRequest, CreateOrderRequest,
	CustomerStatementResponse, CustomerRow, DashboardResponse, LedgerEvent, LedgerMovement, Order,
	OrderDetailResponse, OrderEvent, OrderNote, OrderRow, OrderView, RecordMovementRequest,
	TrackedOrder,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

pub mod event_bus;
mod lifecycle;

use event_bus::EventBus;

/// Errors that can occur during back-office operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// Error from one of the record stores.
	#[error(transparent)]
	Record(#[from] RecordError),
}

/// Pairs an order with its view. The first evaluation may already have
/// forced the status, so the view's label wins.
fn row(order: Order, view: OrderView) -> OrderRow {
	let order = Order {
		status: view.status.clone(),
		..order
	};
	OrderRow { order, view }
}

/// Orders, customers and due-date tracking for every company.
pub struct BackOffice {
	config: Config,
	orders: Arc<OrderStore>,
	notes: NoteLog,
	ledger: CustomerLedger,
	profiles: ProfileDirectory,
	tracker: OrderTracker,
	event_bus: EventBus,
}

impl BackOffice {
	/// Creates the facade over an already configured storage service.
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		clock: Arc<dyn Clock>,
		event_bus: EventBus,
	) -> Self {
		let orders = Arc::new(OrderStore::new(storage.clone()));
		let writer: Arc<dyn StatusWriter> = orders.clone();
		let tracker = OrderTracker::new(
			writer,
			clock,
			event_bus.clone(),
			Duration::from_secs(config.tracker.tick_interval_seconds),
		);

		Self {
			notes: NoteLog::new(storage.clone()),
			ledger: CustomerLedger::new(storage.clone()),
			profiles: ProfileDirectory::new(storage),
			config,
			orders,
			tracker,
			event_bus,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn orders(&self) -> &OrderStore {
		&self.orders
	}

	pub fn notes(&self) -> &NoteLog {
		&self.notes
	}

	pub fn ledger(&self) -> &CustomerLedger {
		&self.ledger
	}

	pub fn profiles(&self) -> &ProfileDirectory {
		&self.profiles
	}

	pub fn tracker(&self) -> &OrderTracker {
		&self.tracker
	}

	/// Lists a company's orders and starts tracking each of them.
	pub async fn load_dashboard(&self, company_id: &str) -> Result<Vec<OrderRow>, EngineError> {
		let orders = self.orders.list_orders(company_id).await?;
		let mut rows = Vec::with_capacity(orders.len());
		for order in orders {
			let view = self.tracker.start_tracking(TrackedOrder::from(&order)).await;
			rows.push(row(order, view));
		}
		tracing::debug!(company_id = %company_id, orders = rows.len(), "Loaded dashboard");
		Ok(rows)
	}

	/// Everything the dashboard shows for a user.
	#[instrument(skip(self), fields(user_id = %truncate_id(user_id)))]
	pub async fn dashboard(&self, user_id: &str) -> Result<DashboardResponse, EngineError> {
		let profile = self.profiles.get_profile(user_id).await?;
		let orders = self.load_dashboard(&profile.company_id).await?;
		let customers = self
			.ledger
			.list_customers(&profile.company_id)
			.await?
			.into_iter()
			.map(CustomerRow::from)
			.collect();

		Ok(DashboardResponse {
			profile,
			orders,
			customers,
		})
	}

	/// Creates an order for the user's company and starts tracking it.
	pub async fn create_order(
		&self,
		user_id: &str,
		request: CreateOrderRequest,
	) -> Result<OrderRow, EngineError> {
		let profile = self.profiles.get_profile(user_id).await?;
		let order = self
			.orders
			.create_order(
				&profile.company_id,
				&request.customer,
				&request.description,
				request.due_date,
			)
			.await?;

		tracing::info!(order_id = %truncate_id(&order.id), "Created order");
		self.event_bus
			.publish(BackOfficeEvent::Order(OrderEvent::Created {
				order: order.clone(),
			}))
			.ok();

		let view = self.tracker.start_tracking(TrackedOrder::from(&order)).await;
		Ok(row(order, view))
	}

	/// An order with its current view and notes.
	pub async fn order_detail(&self, order_id: &str) -> Result<OrderDetailResponse, EngineError> {
		let order = self.orders.get_order(order_id).await?;
		let view = self.tracker.view_for(&TrackedOrder::from(&order));
		let notes = self.notes.list_notes(order_id).await?;
		Ok(OrderDetailResponse { order, view, notes })
	}

	/// Sets a new status label and restarts tracking with it.
	///
	/// An order already forced to pending since the dashboard was loaded is
	/// not forced again, so staff can keep an overdue order in process.
	#[instrument(skip(self), fields(order_id = %truncate_id(order_id)))]
	pub async fn change_status(
		&self,
		order_id: &str,
		new_status: &str,
	) -> Result<OrderRow, EngineError> {
		let order = self.orders.update_status(order_id, new_status).await?;
		tracing::info!(status = %order.status, "Status changed");
		self.event_bus
			.publish(BackOfficeEvent::Order(OrderEvent::StatusChanged {
				order_id: order.id.clone(),
				status: order.status.clone(),
			}))
			.ok();

		let view = self.tracker.restart_tracking(TrackedOrder::from(&order)).await;
		Ok(row(order, view))
	}

	/// Stops tracking and deletes an order together with its notes.
	#[instrument(skip(self), fields(order_id = %truncate_id(order_id)))]
	pub async fn delete_order(&self, order_id: &str) -> Result<(), EngineError> {
		self.tracker.stop_tracking(order_id);
		self.orders.delete_order(order_id).await?;

		let removed_notes = self.notes.remove_all(order_id).await?;
		tracing::info!(notes = removed_notes, "Deleted order");
		self.event_bus
			.publish(BackOfficeEvent::Order(OrderEvent::Deleted {
				order_id: order_id.to_string(),
			}))
			.ok();
		Ok(())
	}

	/// Adds a note signed with the user's profile name.
	pub async fn add_note(
		&self,
		order_id: &str,
		user_id: &str,
		text: &str,
	) -> Result<OrderNote, EngineError> {
		let profile = self.profiles.get_profile(user_id).await?;
		Ok(self.notes.add_note(order_id, text, &profile.name).await?)
	}

	pub async fn list_notes(&self, order_id: &str) -> Result<Vec<OrderNote>, EngineError> {
		// Make unknown orders a 404 rather than an empty list
		self.orders.get_order(order_id).await?;
		Ok(self.notes.list_notes(order_id).await?)
	}

	/// Creates a customer for the user's company.
	pub async fn create_customer(
		&self,
		user_id: &str,
		request: CreateCustomerRequest,
	) -> Result<CustomerRow, EngineError> {
		let profile = self.profiles.get_profile(user_id).await?;
		let customer = self
			.ledger
			.create_customer(&profile.company_id, &request.name, request.phone.as_deref())
			.await?;
		tracing::info!(customer_id = %truncate_id(&customer.id), "Created customer");
		Ok(CustomerRow::from(customer))
	}

	/// A customer's balance and movements.
	pub async fn customer_statement(
		&self,
		customer_id: &str,
	) -> Result<CustomerStatementResponse, EngineError> {
		let statement = self.ledger.statement(customer_id).await?;
		Ok(CustomerStatementResponse {
			charges: statement.charges(),
			payments: statement.payments(),
			customer: CustomerRow::from(statement.customer),
			movements: statement.movements,
		})
	}

	/// Records a charge or payment against a customer's balance.
	pub async fn record_movement(
		&self,
		customer_id: &str,
		request: RecordMovementRequest,
	) -> Result<(LedgerMovement, CustomerRow), EngineError> {
		let (movement, customer) = self
			.ledger
			.record_movement(customer_id, request.kind, &request.description, request.amount)
			.await?;
		self.event_bus
			.publish(BackOfficeEvent::Ledger(LedgerEvent::MovementRecorded {
				movement: movement.clone(),
			}))
			.ok();
		Ok((movement, CustomerRow::from(customer)))
	}

	/// Deletes a charge and returns the customer with its corrected balance.
	pub async fn delete_charge(
		&self,
		customer_id: &str,
		movement_id: &str,
	) -> Result<CustomerRow, EngineError> {
		let customer = self.ledger.delete_charge(customer_id, movement_id).await?;
		self.event_bus
			.publish(BackOfficeEvent::Ledger(LedgerEvent::ChargeDeleted {
				customer_id: customer_id.to_string(),
				movement_id: movement_id.to_string(),
			}))
			.ok();
		Ok(CustomerRow::from(customer))
	}

	/// Deletes a customer and all of its movements.
	pub async fn delete_customer(&self, customer_id: &str) -> Result<(), EngineError> {
		self.ledger.delete_customer(customer_id).await?;
		self.event_bus
			.publish(BackOfficeEvent::Ledger(LedgerEvent::CustomerDeleted {
				customer_id: customer_id.to_string(),
			}))
			.ok();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::BackOfficeBuilder;
	use backoffice_storage::StorageFactory;
	use backoffice_types::{MovementKind, UserProfile, Urgency};
	use chrono::{Duration, Utc};
	use std::collections::HashMap;

	async fn back_office() -> BackOffice {
		let config: Config = r#"
[service]
id = "tienda-test"

[storage]
primary = "memory"
[storage.implementations.memory]
"#
		.parse()
		.unwrap();
		let factories: HashMap<String, StorageFactory> = backoffice_storage::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect();
		let back_office = BackOfficeBuilder::new(config).build(factories).unwrap();

		for (id, company_id) in [("u1", "empresa-1"), ("u2", "empresa-2")] {
			back_office
				.profiles()
				.upsert_profile(UserProfile {
					id: id.to_string(),
					name: format!("Usuario {}", id),
					company_id: company_id.to_string(),
				})
				.await
				.unwrap();
		}
		back_office
	}

	fn new_order(customer: &str, due_in_days: Option<i64>) -> CreateOrderRequest {
		CreateOrderRequest {
			customer: customer.to_string(),
			description: "Pastel de tres leches".to_string(),
			due_date: due_in_days.map(|days| Utc::now() + Duration::days(days)),
		}
	}

	#[tokio::test]
	async fn test_dashboard_is_company_scoped_and_tracks_orders() {
		let back_office = back_office().await;
		let dated = back_office
			.create_order("u1", new_order("Ana", Some(1)))
			.await
			.unwrap();
		back_office
			.create_order("u1", new_order("Luis", None))
			.await
			.unwrap();
		back_office
			.create_order("u2", new_order("Eva", Some(1)))
			.await
			.unwrap();
		back_office.tracker().stop_all();

		let dashboard = back_office.dashboard("u1").await.unwrap();
		assert_eq!(dashboard.profile.company_id, "empresa-1");
		assert_eq!(dashboard.orders.len(), 2);
		assert_eq!(dashboard.orders[0].order.id, dated.order.id);
		assert_eq!(dashboard.orders[0].view.urgency, Urgency::Warning);
		assert_eq!(dashboard.orders[1].view.countdown, None);

		// Only the dated order of this company is tracked
		assert_eq!(back_office.tracker().tracked_count(), 1);
		assert!(back_office.tracker().is_tracking(&dated.order.id));

		back_office.shutdown().await.unwrap();
		assert_eq!(back_office.tracker().tracked_count(), 0);
	}

	#[tokio::test]
	async fn test_unknown_user_has_no_dashboard() {
		let back_office = back_office().await;
		let result = back_office.dashboard("nadie").await;
		assert!(matches!(
			result,
			Err(EngineError::Record(RecordError::NotFound { entity: "Profile", .. }))
		));
	}

	#[tokio::test]
	async fn test_overdue_order_forced_on_load() {
		let back_office = back_office().await;
		let row = back_office
			.create_order("u1", new_order("Ana", Some(-3)))
			.await
			.unwrap();
		// New orders are pending, so nothing is forced yet
		assert!(!row.view.auto_pending_applied);
		assert_eq!(row.view.urgency, Urgency::Danger);

		let row = back_office
			.change_status(&row.order.id, "en proceso")
			.await
			.unwrap();
		assert!(row.view.auto_pending_applied);
		assert_eq!(row.order.status, "pendiente");

		let stored = back_office.orders().get_order(&row.order.id).await.unwrap();
		assert_eq!(stored.status, "pendiente");
		back_office.shutdown().await.unwrap();
	}

	#[tokio::test]
	async fn test_manual_status_after_force_is_kept() {
		let back_office = back_office().await;
		let row = back_office
			.create_order("u1", new_order("Ana", Some(-3)))
			.await
			.unwrap();
		let order_id = row.order.id.clone();

		let forced = back_office.change_status(&order_id, "en proceso").await.unwrap();
		assert_eq!(forced.order.status, "pendiente");

		let kept = back_office.change_status(&order_id, "en proceso").await.unwrap();
		assert_eq!(kept.order.status, "en proceso");
		assert!(kept.view.auto_pending_applied);
		let stored = back_office.orders().get_order(&order_id).await.unwrap();
		assert_eq!(stored.status, "en proceso");

		// Reloading the dashboard evaluates the order from scratch
		let rows = back_office.load_dashboard("empresa-1").await.unwrap();
		assert_eq!(rows[0].order.status, "pendiente");
		back_office.shutdown().await.unwrap();
	}

	#[tokio::test]
	async fn test_delivered_status_stops_tracking() {
		let back_office = back_office().await;
		let row = back_office
			.create_order("u1", new_order("Ana", Some(2)))
			.await
			.unwrap();
		assert!(back_office.tracker().is_tracking(&row.order.id));

		let row = back_office
			.change_status(&row.order.id, "entregado")
			.await
			.unwrap();
		assert_eq!(row.view.urgency, Urgency::Success);
		assert!(!back_office.tracker().is_tracking(&row.order.id));
	}

	#[tokio::test]
	async fn test_delete_order_stops_tracking_and_removes_notes() {
		let back_office = back_office().await;
		let mut events = back_office.event_bus().subscribe();
		let row = back_office
			.create_order("u1", new_order("Ana", Some(2)))
			.await
			.unwrap();
		let note = back_office
			.add_note(&row.order.id, "u1", "Recoge el viernes")
			.await
			.unwrap();
		assert_eq!(note.author, "Usuario u1");

		back_office.delete_order(&row.order.id).await.unwrap();
		assert!(!back_office.tracker().is_tracking(&row.order.id));
		assert!(back_office.notes().list_notes(&row.order.id).await.unwrap().is_empty());
		assert!(matches!(
			back_office.order_detail(&row.order.id).await,
			Err(EngineError::Record(RecordError::NotFound { .. }))
		));

		let mut deleted = false;
		while let Ok(event) = events.try_recv() {
			if let BackOfficeEvent::Order(OrderEvent::Deleted { order_id }) = event {
				deleted = order_id == row.order.id;
			}
		}
		assert!(deleted);
	}

	#[tokio::test]
	async fn test_order_detail_includes_notes() {
		let back_office = back_office().await;
		let row = back_office
			.create_order("u1", new_order("Ana", None))
			.await
			.unwrap();
		back_office
			.add_note(&row.order.id, "u2", "Llamar antes")
			.await
			.unwrap();

		let detail = back_office.order_detail(&row.order.id).await.unwrap();
		assert_eq!(detail.order.customer, "Ana");
		assert_eq!(detail.notes.len(), 1);
		assert_eq!(detail.view.countdown, None);
		assert_eq!(back_office.list_notes(&row.order.id).await.unwrap().len(), 1);
		assert!(back_office.list_notes("nope").await.is_err());
	}

	#[tokio::test]
	async fn test_customer_statement_flow() {
		let back_office = back_office().await;
		let customer = back_office
			.create_customer(
				"u1",
				CreateCustomerRequest {
					name: "Doña Rosa".to_string(),
					phone: Some("8888-0000".to_string()),
				},
			)
			.await
			.unwrap();
		let customer_id = customer.customer.id.clone();

		let (charge, row) = back_office
			.record_movement(
				&customer_id,
				RecordMovementRequest {
					kind: MovementKind::Charge,
					description: "Arroz".to_string(),
					amount: "120".parse().unwrap(),
				},
			)
			.await
			.unwrap();
		assert_eq!(row.balance_display, "C$ 120.00");

		back_office
			.record_movement(
				&customer_id,
				RecordMovementRequest {
					kind: MovementKind::Payment,
					description: "Efectivo".to_string(),
					amount: "20.5".parse().unwrap(),
				},
			)
			.await
			.unwrap();

		let statement = back_office.customer_statement(&customer_id).await.unwrap();
		assert_eq!(statement.customer.balance_display, "C$ 99.50");
		assert_eq!(statement.movements.len(), 2);
		assert_eq!(statement.charges.len(), 1);
		assert_eq!(statement.payments.len(), 1);

		let row = back_office
			.delete_charge(&customer_id, &charge.id)
			.await
			.unwrap();
		assert_eq!(row.balance_display, "C$ -20.50");

		back_office.delete_customer(&customer_id).await.unwrap();
		assert!(back_office.customer_statement(&customer_id).await.is_err());
	}
}
