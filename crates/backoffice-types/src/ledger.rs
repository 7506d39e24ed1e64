//! Customer credit ("fiado") types.
//!
//! A customer's balance is the running sum of charges minus payments. The
//! balance is stored on the customer record and adjusted on every movement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer with an outstanding credit balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
	pub id: String,
	pub company_id: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	/// Amount the customer owes. Positive means debt.
	pub balance: Decimal,
}

/// Direction of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
	/// "Cargo": goods taken on credit, increases the balance.
	Charge,
	/// "Abono": money paid back, decreases the balance.
	Payment,
}

impl MovementKind {
	/// Signed effect of `amount` on the balance.
	pub fn signed(&self, amount: Decimal) -> Decimal {
		match self {
			MovementKind::Charge => amount,
			MovementKind::Payment => -amount,
		}
	}
}

/// A single charge or payment against a customer's balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerMovement {
	pub id: String,
	pub customer_id: String,
	pub kind: MovementKind,
	pub description: String,
	/// Always positive; the kind gives the sign.
	pub amount: Decimal,
	pub created_at: DateTime<Utc>,
}

impl LedgerMovement {
	/// Line shown in the statement, payments prefixed with "Abono: ".
	pub fn display_description(&self) -> String {
		match self.kind {
			MovementKind::Charge => self.description.clone(),
			MovementKind::Payment => format!("Abono: {}", self.description),
		}
	}
}

/// Tone used to render a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceTone {
	/// Customer owes money.
	Danger,
	/// Nothing owed.
	Success,
}

impl BalanceTone {
	pub fn for_balance(balance: Decimal) -> Self {
		if balance > Decimal::ZERO {
			BalanceTone::Danger
		} else {
			BalanceTone::Success
		}
	}
}
