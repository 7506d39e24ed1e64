//! Broadcast channel for back-office events.
//!
//! Every component that changes a record or refreshes an order view publishes
//! here. Subscribers that fall behind lose the oldest events rather than
//! slowing publishers down.

use backoffice_types::BackOfficeEvent;
use tokio::sync::broadcast;

/// Cloneable handle to the shared event channel.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<BackOfficeEvent>,
}

impl EventBus {
	/// Creates a bus that buffers up to `capacity` events per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Subscribes to all events published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<BackOfficeEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event. Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: BackOfficeEvent,
	) -> Result<(), broadcast::error::SendError<BackOfficeEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}
