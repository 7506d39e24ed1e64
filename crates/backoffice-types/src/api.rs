//! API types for the back-office HTTP API.
//!
//! Request bodies mirror the dashboard forms; responses carry the records
//! together with the presentation data the dashboard used to compute in the
//! browser (badges, urgency tiers, countdowns, balance tones).

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
	BalanceTone, Customer, LedgerMovement, MovementKind, Order, OrderNote, OrderView,
	StatusAction, UserProfile,
};

/// Body of `POST /users/{user_id}/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
	pub customer: String,
	pub description: String,
	#[serde(default)]
	pub due_date: Option<DateTime<Utc>>,
}

/// Body of `PUT /orders/{id}/status`.
///
/// Either a dashboard quick action or an explicit free-text label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateStatusRequest {
	Action { action: StatusAction },
	Label { status: String },
}

impl UpdateStatusRequest {
	pub fn label(&self) -> String {
		match self {
			UpdateStatusRequest::Action { action } => action.label().to_string(),
			UpdateStatusRequest::Label { status } => status.clone(),
		}
	}
}

/// Body of `POST /orders/{id}/notes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNoteRequest {
	pub user_id: String,
	pub text: String,
}

/// Body of `POST /users/{user_id}/customers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
	pub name: String,
	#[serde(default)]
	pub phone: Option<String>,
}

/// Body of `POST /customers/{id}/movements`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMovementRequest {
	pub kind: MovementKind,
	pub description: String,
	pub amount: Decimal,
}

/// An order row on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
	pub order: Order,
	pub view: OrderView,
}

/// A customer row on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRow {
	pub customer: Customer,
	pub tone: BalanceTone,
	/// Balance formatted for display.
	pub balance_display: String,
}

impl From<Customer> for CustomerRow {
	fn from(customer: Customer) -> Self {
		Self {
			tone: BalanceTone::for_balance(customer.balance),
			balance_display: crate::format_amount(customer.balance),
			customer,
		}
	}
}

/// Response for `GET /users/{user_id}/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
	pub profile: UserProfile,
	pub orders: Vec<OrderRow>,
	pub customers: Vec<CustomerRow>,
}

/// Response for `GET /orders/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetailResponse {
	pub order: Order,
	pub view: OrderView,
	pub notes: Vec<OrderNote>,
}

/// Response for `GET /customers/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerStatementResponse {
	pub customer: CustomerRow,
	/// All movements, newest first.
	pub movements: Vec<LedgerMovement>,
	/// Charges only, newest first.
	pub charges: Vec<LedgerMovement>,
	/// Payments only, newest first.
	pub payments: Vec<LedgerMovement>,
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	pub details: Option<serde_json::Value>,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter")]
	pub retry_after: Option<u64>,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed or invalid input (400)
	BadRequest { error_type: String, message: String },
	/// Referenced record does not exist (404)
	NotFound { error_type: String, message: String },
	/// Business rule rejected the request (422)
	UnprocessableEntity { error_type: String, message: String },
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> StatusCode {
		match self {
			APIError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			APIError::NotFound { .. } => StatusCode::NOT_FOUND,
			APIError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
			APIError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
			details: None,
			retry_after: None,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::UnprocessableEntity { message, .. } => {
				write!(f, "Unprocessable Entity: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		(self.status_code(), Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_update_status_request_forms() {
		let action: UpdateStatusRequest =
			serde_json::from_str(r#"{"action": "entregado"}"#).unwrap();
		assert_eq!(action.label(), "entregado");

		let label: UpdateStatusRequest =
			serde_json::from_str(r#"{"status": "Listo para retirar"}"#).unwrap();
		assert_eq!(label.label(), "Listo para retirar");
	}

	#[test]
	fn test_error_response_shape() {
		let err = APIError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: "Order not found: abc".to_string(),
		};
		assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
		let body = serde_json::to_value(err.to_error_response()).unwrap();
		assert_eq!(body["error"], "ORDER_NOT_FOUND");
		assert!(body["retryAfter"].is_null());
	}
}
