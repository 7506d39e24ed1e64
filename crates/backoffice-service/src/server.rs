//! HTTP server for the back-office API.
//!
//! Serves the dashboard endpoints under `/api`. CORS is permissive unless
//! the configuration lists allowed origins.

use axum::{
	http::HeaderValue,
	routing::{delete, get, post, put},
	Router,
};
use backoffice_config::ApiConfig;
use backoffice_core::BackOffice;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

use crate::apis::{customers, notes, orders};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the back office handling every request.
	pub back_office: Arc<BackOffice>,
}

/// Builds the CORS layer from configuration.
fn cors_layer(api_config: &ApiConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
	let Some(cors) = &api_config.cors else {
		return Ok(CorsLayer::permissive());
	};

	let origins = cors
		.allowed_origins
		.iter()
		.map(|origin| origin.parse::<HeaderValue>())
		.collect::<Result<Vec<_>, _>>()?;

	Ok(CorsLayer::new()
		.allow_origin(origins)
		.allow_methods(Any)
		.allow_headers(Any))
}

/// Builds the API router with its middleware stack.
pub fn router(
	api_config: &ApiConfig,
	back_office: Arc<BackOffice>,
) -> Result<Router, Box<dyn std::error::Error>> {
	let app_state = AppState { back_office };

	let api = Router::new()
		.route("/users/{user_id}/dashboard", get(orders::get_dashboard))
		.route("/users/{user_id}/orders", post(orders::create_order))
		.route("/users/{user_id}/customers", post(customers::create_customer))
		.route(
			"/orders/{id}",
			get(orders::get_order).delete(orders::delete_order),
		)
		.route("/orders/{id}/status", put(orders::update_status))
		.route(
			"/orders/{id}/notes",
			get(notes::list_notes).post(notes::add_note),
		)
		.route(
			"/customers/{id}",
			get(customers::get_statement).delete(customers::delete_customer),
		)
		.route("/customers/{id}/movements", post(customers::record_movement))
		.route(
			"/customers/{id}/movements/{movement_id}",
			delete(customers::delete_charge),
		);

	Ok(Router::new()
		.nest("/api", api)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(cors_layer(api_config)?),
		)
		.with_state(app_state))
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	back_office: Arc<BackOffice>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(&api_config, back_office)?;

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Back-office API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
