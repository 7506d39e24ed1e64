//! Customer credit ledger.
//!
//! A customer's balance is stored on the customer record and adjusted after
//! each movement is written. Charges raise the balance and payments lower it.
//! Only charges can be deleted, which reverses their effect.

use super::{missing_as_not_found, new_id, required_text, RecordError};
use backoffice_storage::StorageService;
use backoffice_types::{Customer, LedgerMovement, MovementKind, StorageKey};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

const CUSTOMER: &str = "Customer";
const MOVEMENT: &str = "Movement";

/// A customer together with its movements, newest first.
#[derive(Debug, Clone)]
pub struct CustomerStatement {
	pub customer: Customer,
	pub movements: Vec<LedgerMovement>,
}

impl CustomerStatement {
	pub fn charges(&self) -> Vec<LedgerMovement> {
		self.of_kind(MovementKind::Charge)
	}

	pub fn payments(&self) -> Vec<LedgerMovement> {
		self.of_kind(MovementKind::Payment)
	}

	fn of_kind(&self, kind: MovementKind) -> Vec<LedgerMovement> {
		self.movements
			.iter()
			.filter(|movement| movement.kind == kind)
			.cloned()
			.collect()
	}
}

/// Customers and their charge/payment movements.
pub struct CustomerLedger {
	storage: Arc<StorageService>,
	/// Serialises balance read-modify-write cycles.
	balance_lock: Mutex<()>,
}

impl CustomerLedger {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			balance_lock: Mutex::new(()),
		}
	}

	/// Creates a customer with a zero balance.
	pub async fn create_customer(
		&self,
		company_id: &str,
		name: &str,
		phone: Option<&str>,
	) -> Result<Customer, RecordError> {
		let customer = Customer {
			id: new_id(),
			company_id: company_id.to_string(),
			name: required_text("name", name)?,
			phone: phone
				.map(str::trim)
				.filter(|phone| !phone.is_empty())
				.map(str::to_string),
			balance: Decimal::ZERO,
		};
		self.storage
			.store(StorageKey::Customers.as_str(), &customer.id, &customer)
			.await?;
		Ok(customer)
	}

	pub async fn get_customer(&self, customer_id: &str) -> Result<Customer, RecordError> {
		self.storage
			.retrieve(StorageKey::Customers.as_str(), customer_id)
			.await
			.map_err(missing_as_not_found(CUSTOMER, customer_id))
	}

	/// Customers of a company sorted by name.
	pub async fn list_customers(&self, company_id: &str) -> Result<Vec<Customer>, RecordError> {
		let mut customers: Vec<Customer> = self
			.storage
			.retrieve_all::<Customer>(StorageKey::Customers.as_str())
			.await?
			.into_iter()
			.filter(|customer| customer.company_id == company_id)
			.collect();
		customers.sort_by_key(|customer| customer.name.to_lowercase());
		Ok(customers)
	}

	/// Records a charge or payment and adjusts the balance.
	///
	/// Returns the stored movement and the customer with its new balance.
	pub async fn record_movement(
		&self,
		customer_id: &str,
		kind: MovementKind,
		description: &str,
		amount: Decimal,
	) -> Result<(LedgerMovement, Customer), RecordError> {
		if amount <= Decimal::ZERO {
			return Err(RecordError::Validation(
				"amount must be greater than 0".into(),
			));
		}

		let _guard = self.balance_lock.lock().await;
		let mut customer = self.get_customer(customer_id).await?;

		let movement = LedgerMovement {
			id: new_id(),
			customer_id: customer_id.to_string(),
			kind,
			description: description.trim().to_string(),
			amount,
			created_at: Utc::now(),
		};
		self.storage
			.store(StorageKey::LedgerMovements.as_str(), &movement.id, &movement)
			.await?;

		customer.balance += kind.signed(amount);
		self.save_customer(&customer).await?;

		tracing::debug!(
			customer_id = %backoffice_types::truncate_id(customer_id),
			kind = ?kind,
			amount = %amount,
			"Recorded movement"
		);
		Ok((movement, customer))
	}

	/// Deletes a charge and subtracts its amount from the balance.
	pub async fn delete_charge(
		&self,
		customer_id: &str,
		movement_id: &str,
	) -> Result<Customer, RecordError> {
		let _guard = self.balance_lock.lock().await;

		let movement: LedgerMovement = self
			.storage
			.retrieve(StorageKey::LedgerMovements.as_str(), movement_id)
			.await
			.map_err(missing_as_not_found(MOVEMENT, movement_id))?;
		if movement.customer_id != customer_id {
			return Err(RecordError::not_found(MOVEMENT, movement_id));
		}
		if movement.kind != MovementKind::Charge {
			return Err(RecordError::Validation(
				"only charges can be deleted".into(),
			));
		}

		let mut customer = self.get_customer(customer_id).await?;
		self.storage
			.remove(StorageKey::LedgerMovements.as_str(), movement_id)
			.await?;

		customer.balance -= movement.amount;
		self.save_customer(&customer).await?;
		Ok(customer)
	}

	/// Movements of a customer, newest first.
	pub async fn list_movements(
		&self,
		customer_id: &str,
	) -> Result<Vec<LedgerMovement>, RecordError> {
		let mut movements: Vec<LedgerMovement> = self
			.storage
			.retrieve_all::<LedgerMovement>(StorageKey::LedgerMovements.as_str())
			.await?
			.into_iter()
			.filter(|movement| movement.customer_id == customer_id)
			.collect();
		movements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(movements)
	}

	/// A customer and all of its movements.
	pub async fn statement(&self, customer_id: &str) -> Result<CustomerStatement, RecordError> {
		let customer = self.get_customer(customer_id).await?;
		let movements = self.list_movements(customer_id).await?;
		Ok(CustomerStatement {
			customer,
			movements,
		})
	}

	/// Deletes a customer after deleting all of its movements.
	pub async fn delete_customer(&self, customer_id: &str) -> Result<(), RecordError> {
		let _guard = self.balance_lock.lock().await;

		if !self
			.storage
			.exists(StorageKey::Customers.as_str(), customer_id)
			.await?
		{
			return Err(RecordError::not_found(CUSTOMER, customer_id));
		}

		let movements = self.list_movements(customer_id).await?;
		for movement in &movements {
			self.storage
				.remove(StorageKey::LedgerMovements.as_str(), &movement.id)
				.await?;
		}
		self.storage
			.remove(StorageKey::Customers.as_str(), customer_id)
			.await?;

		tracing::info!(
			customer_id = %backoffice_types::truncate_id(customer_id),
			movements = movements.len(),
			"Deleted customer"
		);
		Ok(())
	}

	async fn save_customer(&self, customer: &Customer) -> Result<(), RecordError> {
		self.storage
			.update(StorageKey::Customers.as_str(), &customer.id, customer)
			.await
			.map_err(missing_as_not_found(CUSTOMER, &customer.id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use backoffice_storage::implementations::memory::MemoryStorage;

	fn ledger() -> CustomerLedger {
		CustomerLedger::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	fn amount(value: &str) -> Decimal {
		value.parse().unwrap()
	}

	#[tokio::test]
	async fn test_create_customer() {
		let ledger = ledger();
		let customer = ledger
			.create_customer("empresa-1", " Ana ", Some("  "))
			.await
			.unwrap();
		assert_eq!(customer.name, "Ana");
		assert_eq!(customer.phone, None);
		assert_eq!(customer.balance, Decimal::ZERO);

		let invalid = ledger.create_customer("empresa-1", "", None).await;
		assert!(matches!(invalid, Err(RecordError::Validation(_))));
	}

	#[tokio::test]
	async fn test_charges_and_payments_adjust_balance() {
		let ledger = ledger();
		let customer = ledger.create_customer("empresa-1", "Ana", None).await.unwrap();

		let (_, after_charge) = ledger
			.record_movement(&customer.id, MovementKind::Charge, "Pan", amount("150.50"))
			.await
			.unwrap();
		assert_eq!(after_charge.balance, amount("150.50"));

		let (payment, after_payment) = ledger
			.record_movement(&customer.id, MovementKind::Payment, "Efectivo", amount("50"))
			.await
			.unwrap();
		assert_eq!(after_payment.balance, amount("100.50"));
		assert_eq!(payment.display_description(), "Abono: Efectivo");

		let stored = ledger.get_customer(&customer.id).await.unwrap();
		assert_eq!(stored.balance, amount("100.50"));
	}

	#[tokio::test]
	async fn test_invalid_amounts_rejected() {
		let ledger = ledger();
		let customer = ledger.create_customer("empresa-1", "Ana", None).await.unwrap();

		for value in ["0", "-3"] {
			let result = ledger
				.record_movement(&customer.id, MovementKind::Charge, "x", amount(value))
				.await;
			assert!(matches!(result, Err(RecordError::Validation(_))));
		}
		assert!(ledger.list_movements(&customer.id).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_movement_for_missing_customer() {
		let ledger = ledger();
		let result = ledger
			.record_movement("nope", MovementKind::Charge, "x", amount("1"))
			.await;
		assert!(matches!(result, Err(RecordError::NotFound { entity: "Customer", .. })));
	}

	#[tokio::test]
	async fn test_delete_charge_reverses_balance() {
		let ledger = ledger();
		let customer = ledger.create_customer("empresa-1", "Ana", None).await.unwrap();

		let (charge, _) = ledger
			.record_movement(&customer.id, MovementKind::Charge, "Pan", amount("80"))
			.await
			.unwrap();
		let (payment, _) = ledger
			.record_movement(&customer.id, MovementKind::Payment, "Abono", amount("30"))
			.await
			.unwrap();

		let refused = ledger.delete_charge(&customer.id, &payment.id).await;
		assert!(matches!(refused, Err(RecordError::Validation(_))));

		let updated = ledger.delete_charge(&customer.id, &charge.id).await.unwrap();
		assert_eq!(updated.balance, amount("-30"));

		let statement = ledger.statement(&customer.id).await.unwrap();
		assert_eq!(statement.movements, vec![payment.clone()]);
		assert!(statement.charges().is_empty());
		assert_eq!(statement.payments(), vec![payment]);
	}

	#[tokio::test]
	async fn test_delete_charge_of_other_customer() {
		let ledger = ledger();
		let ana = ledger.create_customer("empresa-1", "Ana", None).await.unwrap();
		let luis = ledger.create_customer("empresa-1", "Luis", None).await.unwrap();
		let (charge, _) = ledger
			.record_movement(&ana.id, MovementKind::Charge, "Pan", amount("10"))
			.await
			.unwrap();

		let result = ledger.delete_charge(&luis.id, &charge.id).await;
		assert!(matches!(result, Err(RecordError::NotFound { entity: "Movement", .. })));
		assert_eq!(ledger.get_customer(&ana.id).await.unwrap().balance, amount("10"));
	}

	#[tokio::test]
	async fn test_delete_customer_removes_movements() {
		let ledger = ledger();
		let ana = ledger.create_customer("empresa-1", "Ana", None).await.unwrap();
		let luis = ledger.create_customer("empresa-1", "Luis", None).await.unwrap();
		for customer in [&ana, &luis] {
			ledger
				.record_movement(&customer.id, MovementKind::Charge, "Pan", amount("10"))
				.await
				.unwrap();
		}

		ledger.delete_customer(&ana.id).await.unwrap();

		assert!(matches!(
			ledger.get_customer(&ana.id).await,
			Err(RecordError::NotFound { .. })
		));
		assert!(ledger.list_movements(&ana.id).await.unwrap().is_empty());
		assert_eq!(ledger.list_movements(&luis.id).await.unwrap().len(), 1);
		assert!(matches!(
			ledger.delete_customer(&ana.id).await,
			Err(RecordError::NotFound { .. })
		));
	}

	#[tokio::test]
	async fn test_list_customers_is_company_scoped() {
		let ledger = ledger();
		ledger.create_customer("empresa-1", "luis", None).await.unwrap();
		ledger.create_customer("empresa-1", "Ana", None).await.unwrap();
		ledger.create_customer("empresa-2", "Eva", None).await.unwrap();

		let names: Vec<String> = ledger
			.list_customers("empresa-1")
			.await
			.unwrap()
			.into_iter()
			.map(|customer| customer.name)
			.collect();
		assert_eq!(names, vec!["Ana".to_string(), "luis".to_string()]);
	}
}
