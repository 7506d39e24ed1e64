//! Periodic due-date tracking.
//!
//! Every tracked order owns one background task that re-evaluates it on a
//! fixed interval and publishes the refreshed view. When an order becomes
//! overdue while still in process, the tracker writes the pending status
//! through the [`StatusWriter`], at most once per tracking session. A failed
//! write leaves the session unforced so the next tick tries again.

use crate::engine::event_bus::EventBus;
use crate::lifecycle;
use async_trait::async_trait;
use backoffice_types::{
	truncate_id, BackOfficeEvent, OrderView, StatusBucket, TrackedOrder, TrackerEvent,
	PENDING_LABEL,
};
use chrono::{DateTime, FixedOffset, Local};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::instrument;

/// Errors returned by a [`StatusWriter`].
#[derive(Debug, Error)]
pub enum WriteError {
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Status write failed: {0}")]
	Failed(String),
}

/// Persists status changes decided by the tracker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusWriter: Send + Sync {
	async fn write_status(&self, order_id: &str, status: &str) -> Result<(), WriteError>;
}

/// Source of the current local time.
pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the machine's local time zone.
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<FixedOffset> {
		let now = Local::now();
		now.with_timezone(now.offset())
	}
}

/// Presentation state of one tracking session.
struct SessionState {
	session: u64,
	view: OrderView,
}

#[derive(Default)]
struct Sessions {
	current: HashMap<String, SessionState>,
	/// Orders forced to pending since they were last loaded. Survives
	/// restarts caused by manual status changes.
	forced: HashSet<String>,
}

struct Shared {
	writer: Arc<dyn StatusWriter>,
	clock: Arc<dyn Clock>,
	event_bus: EventBus,
	sessions: Mutex<Sessions>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps one re-evaluation task per tracked order.
///
/// Lock order is `sessions` before `tasks`.
pub struct OrderTracker {
	shared: Arc<Shared>,
	tick_interval: Duration,
	tasks: Mutex<HashMap<String, JoinHandle<()>>>,
	next_session: AtomicU64,
}

impl OrderTracker {
	pub fn new(
		writer: Arc<dyn StatusWriter>,
		clock: Arc<dyn Clock>,
		event_bus: EventBus,
		tick_interval: Duration,
	) -> Self {
		Self {
			shared: Arc::new(Shared {
				writer,
				clock,
				event_bus,
				sessions: Mutex::new(Sessions::default()),
			}),
			tick_interval,
			tasks: Mutex::new(HashMap::new()),
			next_session: AtomicU64::new(1),
		}
	}

	/// Starts tracking a freshly loaded order and returns its first view.
	///
	/// Any previous session of the same order is stopped and the order may
	/// be forced to pending again. Orders without a due date or already
	/// delivered are evaluated once and not tracked.
	pub async fn start_tracking(&self, order: TrackedOrder) -> OrderView {
		lock(&self.shared.sessions).forced.remove(&order.id);
		self.begin_session(order).await
	}

	/// Restarts tracking after a manual status change.
	///
	/// An order already forced since it was loaded stays forced, so the label
	/// chosen by staff is not overwritten a second time.
	pub async fn restart_tracking(&self, order: TrackedOrder) -> OrderView {
		self.begin_session(order).await
	}

	async fn begin_session(&self, mut order: TrackedOrder) -> OrderView {
		self.end_session(&order.id);
		let now = self.shared.clock.now();
		let forced = lock(&self.shared.sessions).forced.contains(&order.id);

		if order.due_date.is_none() || StatusBucket::classify(&order.status).is_delivered() {
			tracing::debug!(order_id = %truncate_id(&order.id), "Not tracking order");
			return view_of(&order, &now, forced);
		}

		let session = self.next_session.fetch_add(1, Ordering::Relaxed);
		let initial = view_of(&order, &now, forced);
		lock(&self.shared.sessions).current.insert(
			order.id.clone(),
			SessionState {
				session,
				view: initial.clone(),
			},
		);

		let Some(view) = run_tick(&self.shared, &mut order, session).await else {
			// Stopped while the first evaluation was running
			return initial;
		};

		let shared = self.shared.clone();
		let period = self.tick_interval;
		let first_tick = Instant::now() + period;
		let order_id = order.id.clone();
		let handle = tokio::spawn(async move {
			let mut interval = tokio::time::interval_at(first_tick, period);
			interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				interval.tick().await;
				if run_tick(&shared, &mut order, session).await.is_none() {
					break;
				}
			}
		});

		if self.register_task(&order_id, session, handle) {
			tracing::debug!(order_id = %truncate_id(&order_id), session, "Tracking order");
		} else {
			tracing::debug!(order_id = %truncate_id(&order_id), session, "Session superseded before its task started");
		}
		view
	}

	/// Registers the task of `session` if it is still the order's current
	/// session, otherwise aborts it.
	fn register_task(&self, order_id: &str, session: u64, handle: JoinHandle<()>) -> bool {
		let sessions = lock(&self.shared.sessions);
		let is_current = sessions
			.current
			.get(order_id)
			.is_some_and(|state| state.session == session);
		if !is_current {
			handle.abort();
			return false;
		}

		if let Some(previous) = lock(&self.tasks).insert(order_id.to_string(), handle) {
			previous.abort();
		}
		true
	}

	fn end_session(&self, order_id: &str) {
		let mut sessions = lock(&self.shared.sessions);
		sessions.current.remove(order_id);
		if let Some(handle) = lock(&self.tasks).remove(order_id) {
			handle.abort();
		}
	}

	/// Stops tracking an order and discards its presentation state.
	///
	/// Does nothing if the order is not tracked.
	pub fn stop_tracking(&self, order_id: &str) {
		self.end_session(order_id);
		lock(&self.shared.sessions).forced.remove(order_id);
	}

	/// Stops every tracking session.
	pub fn stop_all(&self) {
		let handles: Vec<JoinHandle<()>> = {
			let mut sessions = lock(&self.shared.sessions);
			sessions.current.clear();
			sessions.forced.clear();
			lock(&self.tasks).drain().map(|(_, h)| h).collect()
		};
		for handle in &handles {
			handle.abort();
		}
		if !handles.is_empty() {
			tracing::info!(count = handles.len(), "Stopped order tracking");
		}
	}

	pub fn is_tracking(&self, order_id: &str) -> bool {
		lock(&self.tasks).contains_key(order_id)
	}

	pub fn tracked_count(&self) -> usize {
		lock(&self.tasks).len()
	}

	/// Latest view of a tracked order.
	pub fn current_view(&self, order_id: &str) -> Option<OrderView> {
		lock(&self.shared.sessions)
			.current
			.get(order_id)
			.map(|state| state.view.clone())
	}

	/// Latest view when tracked, otherwise a fresh evaluation without forcing.
	pub fn view_for(&self, order: &TrackedOrder) -> OrderView {
		self.current_view(&order.id).unwrap_or_else(|| {
			let forced = lock(&self.shared.sessions).forced.contains(&order.id);
			view_of(order, &self.shared.clock.now(), forced)
		})
	}
}

impl Drop for OrderTracker {
	fn drop(&mut self) {
		for (_, handle) in lock(&self.tasks).drain() {
			handle.abort();
		}
	}
}

fn view_of(order: &TrackedOrder, now: &DateTime<FixedOffset>, forced: bool) -> OrderView {
	let due = order.due_date.map(|due| due.with_timezone(now.offset()));
	let evaluation = lifecycle::evaluate(&order.status, due.as_ref(), now, forced);
	OrderView {
		order_id: order.id.clone(),
		status: order.status.clone(),
		badge: evaluation.badge,
		urgency: evaluation.urgency,
		countdown: evaluation.countdown,
		auto_pending_applied: forced,
	}
}

/// Forced flag of the order, or `None` once the session has been stopped or
/// replaced.
fn session_flag(shared: &Shared, order_id: &str, session: u64) -> Option<bool> {
	let sessions = lock(&shared.sessions);
	let flag = sessions
		.current
		.get(order_id)
		.filter(|state| state.session == session)
		.map(|_| sessions.forced.contains(order_id));
	flag
}

/// Evaluates an order once, forcing the pending status when due.
///
/// Returns `None` when the session is no longer current.
#[instrument(skip_all, fields(order_id = %truncate_id(&order.id), session = session))]
async fn run_tick(shared: &Shared, order: &mut TrackedOrder, session: u64) -> Option<OrderView> {
	let now = shared.clock.now();
	let mut forced = session_flag(shared, &order.id, session)?;

	let due = order.due_date.map(|due| due.with_timezone(now.offset()));
	if lifecycle::evaluate_auto_force(&order.status, due.as_ref(), &now, forced) {
		match shared.writer.write_status(&order.id, PENDING_LABEL).await {
			Ok(()) => {
				// Flag only after the write went through
				forced = true;
				order.status = PENDING_LABEL.to_string();
				tracing::info!(status = PENDING_LABEL, "Forced overdue order to pending");
				shared
					.event_bus
					.publish(BackOfficeEvent::Tracker(TrackerEvent::StatusForced {
						order_id: order.id.clone(),
					}))
					.ok();
			},
			Err(e) => {
				tracing::warn!(error = %e, "Failed to force pending status, retrying next tick");
				shared
					.event_bus
					.publish(BackOfficeEvent::Tracker(TrackerEvent::ForceFailed {
						order_id: order.id.clone(),
						error: e.to_string(),
					}))
					.ok();
			},
		}
	}

	let view = view_of(order, &now, forced);
	{
		let mut sessions = lock(&shared.sessions);
		match sessions.current.get_mut(&order.id) {
			Some(state) if state.session == session => state.view = view.clone(),
			_ => return None,
		}
		if forced {
			sessions.forced.insert(order.id.clone());
		}
	}

	shared
		.event_bus
		.publish(BackOfficeEvent::Tracker(TrackerEvent::Refreshed {
			view: view.clone(),
		}))
		.ok();
	Some(view)
}
