//! Customer credit endpoints.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use backoffice_types::{
	APIError, CreateCustomerRequest, CustomerRow, CustomerStatementResponse, LedgerMovement,
	RecordMovementRequest,
};
use serde::Serialize;
use tracing::warn;

use super::api_error;
use crate::server::AppState;

/// Response for POST /api/customers/{id}/movements.
#[derive(Debug, Serialize)]
pub struct MovementRecordedResponse {
	pub movement: LedgerMovement,
	pub customer: CustomerRow,
}

/// Handles POST /api/users/{user_id}/customers requests.
pub async fn create_customer(
	Path(user_id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerRow>), APIError> {
	match state.back_office.create_customer(&user_id, request).await {
		Ok(row) => Ok((StatusCode::CREATED, Json(row))),
		Err(e) => {
			warn!("Customer creation failed: {}", e);
			Err(api_error(e))
		},
	}
}

/// Handles GET /api/customers/{id} requests.
pub async fn get_statement(
	Path(customer_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<CustomerStatementResponse>, APIError> {
	state
		.back_office
		.customer_statement(&customer_id)
		.await
		.map(Json)
		.map_err(|e| {
			warn!("Statement retrieval failed: {}", e);
			api_error(e)
		})
}

/// Handles DELETE /api/customers/{id} requests.
pub async fn delete_customer(
	Path(customer_id): Path<String>,
	State(state): State<AppState>,
) -> Result<StatusCode, APIError> {
	match state.back_office.delete_customer(&customer_id).await {
		Ok(()) => Ok(StatusCode::NO_CONTENT),
		Err(e) => {
			warn!("Customer deletion failed: {}", e);
			Err(api_error(e))
		},
	}
}

/// Handles POST /api/customers/{id}/movements requests.
pub async fn record_movement(
	Path(customer_id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<RecordMovementRequest>,
) -> Result<(StatusCode, Json<MovementRecordedResponse>), APIError> {
	match state.back_office.record_movement(&customer_id, request).await {
		Ok((movement, customer)) => Ok((
			StatusCode::CREATED,
			Json(MovementRecordedResponse { movement, customer }),
		)),
		Err(e) => {
			warn!("Recording movement failed: {}", e);
			Err(api_error(e))
		},
	}
}

/// Handles DELETE /api/customers/{id}/movements/{movement_id} requests.
///
/// Only charges can be deleted; the response carries the corrected balance.
pub async fn delete_charge(
	Path((customer_id, movement_id)): Path<(String, String)>,
	State(state): State<AppState>,
) -> Result<Json<CustomerRow>, APIError> {
	state
		.back_office
		.delete_charge(&customer_id, &movement_id)
		.await
		.map(Json)
		.map_err(|e| {
			warn!("Charge deletion failed: {}", e);
			api_error(e)
		})
}
