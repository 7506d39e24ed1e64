//! Storage-related types for the back-office system.

use std::str::FromStr;

/// Storage namespaces for the different record collections.
///
/// This enum replaces collection-name string literals with strongly typed
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Customer orders
	Orders,
	/// Notes attached to orders
	OrderNotes,
	/// Customers with a credit balance
	Customers,
	/// Charges and payments against customer balances
	LedgerMovements,
	/// User profiles
	Users,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::OrderNotes => "order_notes",
			StorageKey::Customers => "customers",
			StorageKey::LedgerMovements => "ledger_movements",
			StorageKey::Users => "users",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Orders,
			Self::OrderNotes,
			Self::Customers,
			Self::LedgerMovements,
			Self::Users,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().find(|key| key.as_str() == s).ok_or(())
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_round_trip() {
		for key in StorageKey::all() {
			assert_eq!(key.as_str().parse::<StorageKey>(), Ok(key));
		}
		assert!("pedidos".parse::<StorageKey>().is_err());
	}
}
