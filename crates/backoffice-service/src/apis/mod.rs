//! Back-office API handlers.
//!
//! Each submodule groups the endpoints of one dashboard area. Handlers call
//! into the [`BackOffice`](backoffice_core::BackOffice) facade and translate
//! its errors with [`api_error`].

pub mod customers;
pub mod notes;
pub mod orders;

use backoffice_core::{EngineError, RecordError};
use backoffice_types::APIError;

/// Maps a back-office error onto its HTTP representation.
pub fn api_error(err: EngineError) -> APIError {
	let EngineError::Record(record) = err;
	let message = record.to_string();
	match record {
		RecordError::NotFound {
			entity: "Profile", ..
		} => APIError::NotFound {
			error_type: "PROFILE_NOT_FOUND".to_string(),
			message: "Perfil no encontrado".to_string(),
		},
		RecordError::NotFound { entity, .. } => APIError::NotFound {
			error_type: format!("{}_NOT_FOUND", entity.to_uppercase()),
			message,
		},
		RecordError::Validation(_) => APIError::UnprocessableEntity {
			error_type: "VALIDATION_ERROR".to_string(),
			message,
		},
		RecordError::Storage(_) => APIError::InternalServerError {
			error_type: "STORAGE_ERROR".to_string(),
			message,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::StatusCode;

	#[test]
	fn test_not_found_uses_entity_code() {
		let err = api_error(EngineError::Record(RecordError::NotFound {
			entity: "Order",
			id: "abc".to_string(),
		}));
		assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
		let body = err.to_error_response();
		assert_eq!(body.error, "ORDER_NOT_FOUND");
		assert_eq!(body.message, "Order not found: abc");
	}

	#[test]
	fn test_missing_profile_message() {
		let err = api_error(EngineError::Record(RecordError::NotFound {
			entity: "Profile",
			id: "u9".to_string(),
		}));
		assert_eq!(err.to_error_response().message, "Perfil no encontrado");
	}

	#[test]
	fn test_validation_and_storage_status() {
		let validation = api_error(EngineError::Record(RecordError::Validation(
			"Amount must be greater than zero".to_string(),
		)));
		assert_eq!(validation.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

		let storage = api_error(EngineError::Record(RecordError::Storage("disk full".to_string())));
		assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
