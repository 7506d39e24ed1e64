//! Order note endpoints.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use backoffice_types::{APIError, AddNoteRequest, OrderNote};
use tracing::warn;

use super::api_error;
use crate::server::AppState;

/// Handles GET /api/orders/{id}/notes requests. Newest note first.
pub async fn list_notes(
	Path(order_id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Vec<OrderNote>>, APIError> {
	state
		.back_office
		.list_notes(&order_id)
		.await
		.map(Json)
		.map_err(|e| {
			warn!("Note listing failed: {}", e);
			api_error(e)
		})
}

/// Handles POST /api/orders/{id}/notes requests.
pub async fn add_note(
	Path(order_id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<AddNoteRequest>,
) -> Result<(StatusCode, Json<OrderNote>), APIError> {
	match state
		.back_office
		.add_note(&order_id, &request.user_id, &request.text)
		.await
	{
		Ok(note) => Ok((StatusCode::CREATED, Json(note))),
		Err(e) => {
			warn!("Adding note failed: {}", e);
			Err(api_error(e))
		},
	}
}
