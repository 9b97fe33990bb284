//! Decoding push messages and applying them to the current order view.
//!
//! Both halves are pure functions, so the whole status synchronisation logic can be tested without a socket.
use pay_common::{OrderId, OrderStatus};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::DecodeError;

/// The `type` discriminator of messages that carry an order status.
pub const ORDER_STATUS_TYPE: &str = "order.status";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    OrderStatus(StatusUpdate),
    /// Any message with another or a missing `type`. These never touch session state.
    Other { kind: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// The status changed. The session should display it and notify the user.
    Changed(OrderStatus),
    /// The message repeats the status already shown.
    Unchanged(OrderStatus),
    /// The message names a different order than the one bound to the subscription.
    Stale(OrderId),
    /// Not a status message.
    Ignored(Option<String>),
}

impl Projection {
    /// The status to display after applying this projection to `current`.
    pub fn next_status(&self, current: Option<&OrderStatus>) -> Option<OrderStatus> {
        match self {
            Projection::Changed(status) | Projection::Unchanged(status) => Some(status.clone()),
            Projection::Stale(_) | Projection::Ignored(_) => current.cloned(),
        }
    }
}

/// Parses a raw push payload.
///
/// Payloads that are not JSON, and `order.status` messages without a string `status`, are decode errors. Anything
/// else that is valid JSON decodes to [`StatusEvent::Other`].
pub fn decode(payload: &str) -> Result<StatusEvent, DecodeError> {
    let value = serde_json::from_str::<Value>(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    match value.get("type").and_then(Value::as_str) {
        Some(ORDER_STATUS_TYPE) => serde_json::from_value::<StatusUpdate>(value)
            .map(StatusEvent::OrderStatus)
            .map_err(|e| DecodeError::Shape(format!("{ORDER_STATUS_TYPE} message. {e}"))),
        kind => Ok(StatusEvent::Other { kind: kind.map(String::from) }),
    }
}

/// Applies an event to the current status of the order bound to the subscription. Last write wins.
pub fn project(current: Option<&OrderStatus>, bound: &OrderId, event: &StatusEvent) -> Projection {
    match event {
        StatusEvent::OrderStatus(update) => match &update.order_id {
            Some(order_id) if order_id != bound => Projection::Stale(order_id.clone()),
            _ if current == Some(&update.status) => Projection::Unchanged(update.status.clone()),
            _ => Projection::Changed(update.status.clone()),
        },
        StatusEvent::Other { kind } => Projection::Ignored(kind.clone()),
    }
}
