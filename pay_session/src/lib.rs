//! Payment demo session client
//!
//! This library drives one client session against the payment demo service. It is responsible for:
//! 1. Issuing account, balance and order requests through the [`gateway::RequestGateway`] and normalising every
//!    failure into a [`SessionError`].
//! 2. Keeping exactly one push subscription open for the most recently created order ([`channel`]). Binding a new
//!    order always closes the previous subscription first, and events from superseded subscriptions are discarded.
//! 3. Projecting `order.status` push messages onto the session's current order view ([`projector`]).
//!
//! The [`session::OrderSession`] ties the three together and reports every outcome to a [`notify::Notifier`] and
//! an append-only [`notify::ActivityLog`].
//!
//! ## Configuration
//! The client is configured via environment variables. See [config](config/index.html) for more information.

pub mod channel;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod notify;
pub mod projector;
pub mod session;

pub use errors::{DecodeError, SessionError, ValidationError};
pub use pay_common::{MinorUnits, OrderId, OrderStatus, UserId};
