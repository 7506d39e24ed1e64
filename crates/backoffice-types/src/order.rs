//! Order records and their derived views.
//!
//! An order is owned by a company and carries a free-text status plus an
//! optional due date. The tracker derives an [`OrderView`] from it on every
//! tick; the view is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Badge, StatusBucket, Urgency};

/// A customer order ("pedido") tracked for a company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Company that owns the order.
	pub company_id: String,
	/// Customer display name.
	pub customer: String,
	/// What was ordered.
	pub description: String,
	/// Free-text status label.
	pub status: String,
	/// Promised delivery time, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub due_date: Option<DateTime<Utc>>,
	/// Timestamp when this order was created.
	pub created_at: u64,
	/// Timestamp when this order was last updated.
	pub updated_at: u64,
}

impl Order {
	pub fn bucket(&self) -> StatusBucket {
		StatusBucket::classify(&self.status)
	}
}

/// Minimal data the tracker needs about an order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedOrder {
	pub id: String,
	pub status: String,
	pub due_date: Option<DateTime<Utc>>,
}

impl From<&Order> for TrackedOrder {
	fn from(order: &Order) -> Self {
		Self {
			id: order.id.clone(),
			status: order.status.clone(),
			due_date: order.due_date,
		}
	}
}

/// Presentation of an order as computed by the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderView {
	pub order_id: String,
	/// Status label currently displayed (after any forced transition).
	pub status: String,
	pub badge: Badge,
	pub urgency: Urgency,
	/// Countdown or overdue text; absent when the order has no due date.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub countdown: Option<String>,
	/// Whether the tracker already forced this order to pending.
	pub auto_pending_applied: bool,
}

/// A free-text note in an order's log ("bitácora").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderNote {
	pub id: String,
	pub order_id: String,
	pub text: String,
	/// Display name of the user who wrote the note.
	pub author: String,
	pub created_at: DateTime<Utc>,
}
