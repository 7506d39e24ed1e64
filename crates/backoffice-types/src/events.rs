//! Event types for inter-service communication.
//!
//! Events flow through the back-office event bus so that presentation layers
//! can react to record changes and tracker ticks without polling storage.

use serde::{Deserialize, Serialize};

use crate::{LedgerMovement, Order, OrderView};

/// Main event type encompassing all back-office events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackOfficeEvent {
	/// Events about persisted orders.
	Order(OrderEvent),
	/// Events from the due-date tracker.
	Tracker(TrackerEvent),
	/// Events about customer balances.
	Ledger(LedgerEvent),
}

/// Events related to order records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A new order has been stored.
	Created { order: Order },
	/// Staff changed an order's status.
	StatusChanged { order_id: String, status: String },
	/// An order has been removed.
	Deleted { order_id: String },
}

/// Events emitted on tracker ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrackerEvent {
	/// The view of a tracked order has been recomputed.
	Refreshed { view: OrderView },
	/// An overdue order has been written back as pending.
	StatusForced { order_id: String },
	/// Forcing an overdue order to pending failed; it is retried next tick.
	ForceFailed { order_id: String, error: String },
}

/// Events related to the customer ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
	/// A charge or payment has been applied to a balance.
	MovementRecorded { movement: LedgerMovement },
	/// A charge has been removed and the balance reduced.
	ChargeDeleted {
		customer_id: String,
		movement_id: String,
	},
	/// A customer and its movements have been removed.
	CustomerDeleted { customer_id: String },
}
