//! Push channel that tells the dashboard when dish data changed server-side.
//!
//! The channel carries signals only. What to do about a signal (re-fetch) is
//! decided by the dashboard, so the transport can be swapped without touching
//! the fetch side.

pub mod packet;
mod socketio;

pub use socketio::SocketIoChannel;

use tokio::sync::mpsc::UnboundedSender;

/// Name of the server event announcing that some dish changed.
pub const DISH_UPDATED_EVENT: &str = "dishUpdated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The channel finished its handshake. Informational.
    Connected,
    /// Something changed server-side; the payload, if any, is not interpreted.
    DishUpdated,
}

pub trait LiveUpdates {
    /// Open the channel. Signals are delivered on `signals` until the returned
    /// subscription is disconnected or the server goes away, after which the
    /// sender is dropped.
    fn subscribe(&self, signals: UnboundedSender<Signal>) -> Subscription;
}

/// Guard for an open live-update connection. The connection is released
/// exactly once: by `disconnect` or, failing that, on drop.
pub struct Subscription {
    closer: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(closer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            closer: Some(Box::new(closer)),
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(close) = self.closer.take() {
            close();
        }
    }

    pub fn is_open(&self) -> bool {
        self.closer.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("open", &self.is_open())
            .finish()
    }
}
