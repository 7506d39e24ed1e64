//! Order endpoints.
//!
//! Listing, creating and changing orders goes through the tracker, so every
//! row returned here carries the view computed at request time and any
//! status the due-date rules forced on the way.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use backoffice_types::{
	APIError, CreateOrderRequest, DashboardResponse, OrderDetailResponse, OrderRow,
	UpdateStatusRequest,
};
use tracing::warn;

use super::api_error;
use crate::server::AppState;

/// Handles GET /api/users/{user_id}/dashboard requests.
pub async fn get_dashboard(
	Path(user_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, APIError> {
	state
		.back_office
		.dashboard(&user_id)
		.await
		.map(Json)
		.map_err(|e| {
			warn!("Dashboard request failed: {}", e);
			api_error(e)
		})
}

/// Handles POST /api/users/{user_id}/orders requests.
pub async fn create_order(
	Path(user_id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderRow>), APIError> {
	match state.back_office.create_order(&user_id, request).await {
		Ok(row) => Ok((StatusCode::CREATED, Json(row))),
		Err(e) => {
			warn!("Order creation failed: {}", e);
			Err(api_error(e))
		},
	}
}

/// Handles GET /api/orders/{id} requests.
pub async fn get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderDetailResponse>, APIError> {
	state
		.back_office
		.order_detail(&id)
		.await
		.map(Json)
		.map_err(|e| {
			warn!("Order retrieval failed: {}", e);
			api_error(e)
		})
}

/// Handles PUT /api/orders/{id}/status requests.
///
/// Accepts either a quick action (`{"action": "entregado"}`) or a free-text
/// label (`{"status": "Listo para retirar"}`).
pub async fn update_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderRow>, APIError> {
	let label = request.label();
	if label.trim().is_empty() {
		return Err(APIError::BadRequest {
			error_type: "INVALID_STATUS".to_string(),
			message: "Status cannot be empty".to_string(),
		});
	}

	state
		.back_office
		.change_status(&id, &label)
		.await
		.map(Json)
		.map_err(|e| {
			warn!("Status change failed: {}", e);
			api_error(e)
		})
}

/// Handles DELETE /api/orders/{id} requests.
pub async fn delete_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<StatusCode, APIError> {
	match state.back_office.delete_order(&id).await {
		Ok(()) => Ok(StatusCode::NO_CONTENT),
		Err(e) => {
			warn!("Order deletion failed: {}", e);
			Err(api_error(e))
		},
	}
}
