//! Common types module for the back-office system.
//!
//! This module defines the records, presentation enums and API shapes shared
//! by every back-office crate, so that storage, core and service agree on a
//! single vocabulary.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Event types for inter-service communication.
pub mod events;
/// Customer credit ledger types.
pub mod ledger;
/// Order records and order notes.
pub mod order;
/// User profiles used to scope requests to a company.
pub mod profile;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Status classification, badges and urgency tiers.
pub mod status;
/// Storage types for managing persistent data.
pub mod storage;
/// Utility functions for display formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use api::*;
pub use events::*;
pub use ledger::*;
pub use order::*;
pub use profile::*;
pub use registry::ImplementationRegistry;
pub use status::*;
pub use storage::*;
pub use utils::{current_timestamp, format_amount, truncate_id};
pub use validation::*;
