//! Core engine for the back office.
//!
//! This crate holds the due-date rules for orders, the tracker that applies
//! them periodically, the company-scoped record stores and the
//! [`BackOffice`] facade that ties them to storage and the event bus.

pub mod builder;
pub mod engine;
pub mod lifecycle;
pub mod state;
pub mod tracker;

pub use builder::{BackOfficeBuilder, BuilderError};
pub use engine::{event_bus::EventBus, BackOffice, EngineError};
pub use state::RecordError;
pub use tracker::{Clock, OrderTracker, StatusWriter, SystemClock, WriteError};
