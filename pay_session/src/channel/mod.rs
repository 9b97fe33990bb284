//! The push side of the service.
//!
//! The [`OrderChannelManager`] keeps at most one [`Subscription`] alive, bound to the most recent order. Every
//! subscription is tagged with a generation number and its order id, and every event its transport produces carries
//! that tag. When an order is superseded the old subscription is told to shut down before the new one is opened, and
//! any event that still arrives with the old tag is dropped by the manager, so a late message from a previous order
//! can never reach the status projector.
mod manager;
mod subscription;
mod transport;

pub use manager::OrderChannelManager;
pub use subscription::{ChannelEvent, ChannelEventKind, Subscription, SubscriptionState, SubscriptionTag};
pub use transport::{EventSink, PushTransport, WebSocketTransport};
