//! Order status classification and presentation tiers.
//!
//! Order statuses are free-text labels typed by staff ("Pendiente",
//! "en proceso", "Entregado", ...). They are classified once into a
//! [`StatusBucket`] and every decision downstream works on the bucket.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label written when an overdue order is forced back to pending.
pub const PENDING_LABEL: &str = "pendiente";

/// Label assigned to freshly created orders.
pub const NEW_ORDER_LABEL: &str = "Pendiente";

/// Semantic bucket of a free-text order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
	/// Label mentions "entreg" (entregado, entregada, ...).
	Delivered,
	/// Label mentions "pend".
	Pending,
	/// Label mentions "proceso".
	InProcess,
	/// Anything else, including an empty label.
	Unknown,
}

impl StatusBucket {
	/// Classifies a status label by case-insensitive substring match.
	///
	/// Precedence is Delivered, then Pending, then InProcess.
	pub fn classify(label: &str) -> Self {
		let label = label.to_lowercase();
		if label.contains("entreg") {
			StatusBucket::Delivered
		} else if label.contains("pend") {
			StatusBucket::Pending
		} else if label.contains("proceso") {
			StatusBucket::InProcess
		} else {
			StatusBucket::Unknown
		}
	}

	pub fn is_delivered(&self) -> bool {
		matches!(self, StatusBucket::Delivered)
	}

	pub fn is_pending(&self) -> bool {
		matches!(self, StatusBucket::Pending)
	}
}

/// Badge color shown next to an order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
	Success,
	Warning,
	Secondary,
}

impl Badge {
	/// Maps a status label to its badge.
	///
	/// Unlike [`StatusBucket::classify`], "proceso" is checked before
	/// "pend", so a label mentioning both shows as in process.
	pub fn for_status(label: &str) -> Self {
		if StatusBucket::classify(label).is_delivered() {
			Badge::Success
		} else if label.to_lowercase().contains("proceso") {
			Badge::Warning
		} else {
			Badge::Secondary
		}
	}

	/// CSS class pair used by the web dashboard.
	pub fn css_class(&self) -> &'static str {
		match self {
			Badge::Success => "bg-success",
			Badge::Warning => "bg-warning text-dark",
			Badge::Secondary => "bg-secondary",
		}
	}
}

/// Urgency tier of an order due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
	/// No color: no due date, or more than two calendar days away.
	None,
	/// Due today or within the next two calendar days.
	Warning,
	/// Due date is on a previous calendar day.
	Danger,
	/// Order already delivered.
	Success,
}

impl Urgency {
	pub fn css_class(&self) -> &'static str {
		match self {
			Urgency::None => "",
			Urgency::Warning => "text-warning fw-bold",
			Urgency::Danger => "text-danger fw-bold",
			Urgency::Success => "text-success fw-bold",
		}
	}
}

impl fmt::Display for Urgency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Urgency::None => write!(f, "none"),
			Urgency::Warning => write!(f, "warning"),
			Urgency::Danger => write!(f, "danger"),
			Urgency::Success => write!(f, "success"),
		}
	}
}

/// Quick status actions offered on each dashboard row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusAction {
	EnProceso,
	Pendiente,
	Entregado,
}

impl StatusAction {
	/// Status label persisted for this action.
	pub fn label(&self) -> &'static str {
		match self {
			StatusAction::EnProceso => "en proceso",
			StatusAction::Pendiente => PENDING_LABEL,
			StatusAction::Entregado => "entregado",
		}
	}
}
