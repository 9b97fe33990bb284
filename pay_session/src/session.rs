//! The client session.
//!
//! An [`OrderSession`] owns everything a single client instance knows: who the user is, the balance last reported by
//! the service, the most recently created order with its status, and the push subscription for that order. Each
//! operation goes through the [`RequestGateway`], reports its outcome to the [`Notifier`] and the [`ActivityLog`], and
//! leaves the session in its last-known-good state when it fails.
use std::{fmt::Display, sync::Arc};

use log::*;
use pay_common::{MinorUnits, OrderId, OrderStatus, UserId};
use serde::Serialize;

use crate::{
    channel::{ChannelEventKind, OrderChannelManager, PushTransport, Subscription, WebSocketTransport},
    config::ClientConfig,
    errors::{DecodeError, SessionError, ValidationError},
    gateway::{AccountResult, BalanceResult, Order, OrderCreated, RequestGateway},
    notify::{ActivityLog, Notifier},
    projector::{decode, project, Projection},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BalanceView {
    Known(MinorUnits),
    #[default]
    Unknown,
}

impl Display for BalanceView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceView::Known(balance) => write!(f, "{balance}"),
            BalanceView::Unknown => f.write_str("unknown"),
        }
    }
}

impl From<Option<MinorUnits>> for BalanceView {
    fn from(balance: Option<MinorUnits>) -> Self {
        balance.map(BalanceView::Known).unwrap_or_default()
    }
}

/// What a single push channel event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Opened,
    Projected(Projection),
    /// The payload could not be decoded. The status was left alone.
    Malformed(DecodeError),
    Closed { reason: Option<String> },
    Failed(String),
}

pub struct OrderSession<T: PushTransport = WebSocketTransport> {
    user_id: UserId,
    gateway: RequestGateway,
    channel: OrderChannelManager<T>,
    current_order: Option<OrderId>,
    current_status: Option<OrderStatus>,
    balance: BalanceView,
    terminal_statuses: Vec<String>,
    notifier: Arc<dyn Notifier>,
    activity: ActivityLog,
}

impl OrderSession<WebSocketTransport> {
    pub fn from_config(
        user_id: UserId,
        config: &ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SessionError> {
        Self::with_transport(user_id, config, WebSocketTransport, notifier)
    }
}

impl<T: PushTransport> OrderSession<T> {
    pub fn with_transport(
        user_id: UserId,
        config: &ClientConfig,
        transport: T,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SessionError> {
        let gateway = RequestGateway::new(config)?;
        let channel = OrderChannelManager::new(transport, config.stream_url.clone());
        Ok(Self {
            user_id,
            gateway,
            channel,
            current_order: None,
            current_status: None,
            balance: BalanceView::Unknown,
            terminal_statuses: config.terminal_statuses.clone(),
            notifier,
            activity: ActivityLog::new(),
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn current_order(&self) -> Option<&OrderId> {
        self.current_order.as_ref()
    }

    pub fn current_status(&self) -> Option<&OrderStatus> {
        self.current_status.as_ref()
    }

    pub fn balance(&self) -> BalanceView {
        self.balance
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.channel.active()
    }

    /// A handle for issuing requests outside the session, e.g. from another task.
    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    /// True if the current order has reached a status after which the service sends no more updates.
    pub fn is_terminal(&self) -> bool {
        self.current_status.as_ref().map(|s| s.is_one_of(&self.terminal_statuses)).unwrap_or(false)
    }

    /// Switches the session to the user named by `input`. The previous user's order stops being watched, and the
    /// balance is unknown until it is queried again.
    pub fn set_user_id(&mut self, input: &str) -> Result<UserId, SessionError> {
        let user_id = input.parse::<UserId>().map_err(|e| self.fail(ValidationError::from(e).into()))?;
        if user_id != self.user_id {
            info!("💳️ Session switched from user {} to user {user_id}", self.user_id);
            self.close_channel();
            self.user_id = user_id;
            self.balance = BalanceView::Unknown;
            self.current_order = None;
            self.current_status = None;
        }
        Ok(user_id)
    }

    pub async fn create_account(&mut self) -> Result<AccountResult, SessionError> {
        let account = self.gateway.create_account(self.user_id).await.map_err(|e| self.fail(e))?;
        self.notifier.success("Account created");
        self.activity.append(format!("create account -> {}", as_json(&account)));
        // A failed refresh is reported on its own and does not undo the account.
        if let Err(e) = self.refresh_balance().await {
            debug!("💳️ Balance refresh after creating account {} failed. {e}", self.user_id);
        }
        Ok(account)
    }

    pub async fn top_up(&mut self, amount: MinorUnits) -> Result<BalanceResult, SessionError> {
        let result = self.gateway.top_up(self.user_id, amount).await.map_err(|e| self.fail(e))?;
        self.notifier.success("Balance topped up");
        self.activity.append(format!("topup -> {}", as_json(&result)));
        self.balance = result.balance.into();
        Ok(result)
    }

    /// Queries the balance. Any failure leaves the balance showing as unknown.
    pub async fn refresh_balance(&mut self) -> Result<BalanceResult, SessionError> {
        match self.gateway.get_balance(self.user_id).await {
            Ok(result) => {
                self.balance = result.balance.into();
                self.activity.append(format!("balance -> {}", as_json(&result)));
                Ok(result)
            },
            Err(e) => {
                self.balance = BalanceView::Unknown;
                self.notifier.error(&e.to_string());
                self.activity.append(format!("balance ERROR: {e}"));
                Err(e)
            },
        }
    }

    /// Submits an order and binds the push channel to it, closing the subscription of any previous order first.
    pub async fn create_order(&mut self, amount: MinorUnits, description: &str) -> Result<OrderCreated, SessionError> {
        let order = self.gateway.create_order(self.user_id, amount, description).await.map_err(|e| self.fail(e))?;
        self.channel.bind(order.id.clone()).map(|_| ()).map_err(|e| self.fail(e))?;
        self.current_order = Some(order.id.clone());
        self.current_status = Some(order.status.clone());
        self.notifier.success("Order created, awaiting payment");
        self.activity.append(format!("create order -> {}", as_json(&order)));
        Ok(order)
    }

    pub async fn list_orders(&mut self) -> Result<Vec<Order>, SessionError> {
        let orders = self.gateway.list_orders(self.user_id).await.map_err(|e| self.fail(e))?;
        self.activity.append(format!("orders -> {} order(s)", orders.len()));
        Ok(orders)
    }

    /// Rebinds the push channel to the current order. Returns false if there is no order to watch.
    pub fn resubscribe(&mut self) -> Result<bool, SessionError> {
        let Some(order_id) = self.current_order.clone() else {
            return Ok(false);
        };
        self.channel.bind(order_id).map(|_| ()).map_err(|e| self.fail(e))?;
        Ok(true)
    }

    /// Closes the push channel. Returns false if there was no live subscription.
    pub fn close_channel(&mut self) -> bool {
        let closed = self.channel.close();
        if closed {
            self.activity.append("WS closed");
        }
        closed
    }

    /// Closes the push channel and waits for its connection to wind down.
    pub async fn shutdown(&mut self) {
        self.channel.shutdown().await;
    }

    /// Waits for the next event on the push channel and applies it.
    ///
    /// Returns `None` when no subscription is bound or the bound subscription has ended.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let event = self.channel.recv().await?;
        let update = match event.kind {
            ChannelEventKind::Opened => {
                let endpoint = self.channel.active().map(|s| s.endpoint().to_string()).unwrap_or_default();
                self.activity.append(format!("WS open -> {endpoint}"));
                SessionUpdate::Opened
            },
            ChannelEventKind::Frame(data) => self.apply_message(&event.tag.order_id, &data),
            ChannelEventKind::Closed { reason } => {
                match &reason {
                    Some(r) => self.activity.append(format!("WS closed -> {r}")),
                    None => self.activity.append("WS closed"),
                }
                SessionUpdate::Closed { reason }
            },
            ChannelEventKind::TransportError(e) => {
                self.activity.append(format!("WS error -> {e}"));
                SessionUpdate::Failed(e)
            },
        };
        Some(update)
    }

    /// Applies push updates until the order reaches a terminal status, then closes the channel. Also returns when the
    /// channel ends first. Returns the last known status.
    pub async fn watch_until_terminal(&mut self) -> Option<OrderStatus> {
        while !self.is_terminal() {
            if self.next_update().await.is_none() {
                return self.current_status.clone();
            }
        }
        if let Some(status) = &self.current_status {
            debug!("📬️ Order reached terminal status {status}");
        }
        self.close_channel();
        self.current_status.clone()
    }

    fn apply_message(&mut self, bound: &OrderId, data: &str) -> SessionUpdate {
        let event = match decode(data) {
            Ok(event) => event,
            Err(e) => {
                debug!("📬️ Could not decode push message for {bound}. {e}");
                self.activity.append(format!("WS parse error -> {data}"));
                return SessionUpdate::Malformed(e);
            },
        };
        let projection = project(self.current_status.as_ref(), bound, &event);
        match &projection {
            Projection::Changed(status) => {
                info!("📬️ Order {bound} is now {status}");
                self.notifier.success(&format!("Order status: {status}"));
            },
            Projection::Unchanged(status) => trace!("📬️ Order {bound} is still {status}"),
            Projection::Stale(other) => debug!("📬️ Discarding a status update for {other} on the channel for {bound}"),
            Projection::Ignored(kind) => trace!("📬️ Ignoring push message of type {kind:?}"),
        }
        self.current_status = projection.next_status(self.current_status.as_ref());
        self.activity.append(format!("WS message -> {data}"));
        SessionUpdate::Projected(projection)
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        warn!("💳️ {err}");
        self.notifier.error(&err.to_string());
        self.activity.append(format!("ERROR: {err}"));
        err
    }
}

fn as_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}
