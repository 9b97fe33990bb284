use std::fmt::Display;

use log::*;
use pay_common::OrderId;
use tokio::{sync::oneshot, task::JoinHandle};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionTag {
    pub generation: u64,
    pub order_id: OrderId,
}

impl Display for SubscriptionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.order_id, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub tag: SubscriptionTag,
    pub kind: ChannelEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEventKind {
    Opened,
    /// A raw payload as received. Decoding is the projector's job.
    Frame(String),
    Closed { reason: Option<String> },
    TransportError(String),
}

impl ChannelEventKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::TransportError(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Connecting,
    Open,
    Closed,
}

impl SubscriptionState {
    /// `Closed` absorbs everything. A close or a transport error always ends the subscription; there is no reconnect.
    pub fn next(self, event: &ChannelEventKind) -> Self {
        match (self, event) {
            (Self::Closed, _) => Self::Closed,
            (_, e) if e.is_terminal() => Self::Closed,
            (_, ChannelEventKind::Opened) | (_, ChannelEventKind::Frame(_)) => Self::Open,
            (state, _) => state,
        }
    }
}

impl Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// The handle for one push channel bound to one order. Dropping it closes the channel.
#[derive(Debug)]
pub struct Subscription {
    tag: SubscriptionTag,
    endpoint: Url,
    state: SubscriptionState,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(
        tag: SubscriptionTag,
        endpoint: Url,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self { tag, endpoint, state: SubscriptionState::Connecting, shutdown: Some(shutdown), task: Some(task) }
    }

    pub fn tag(&self) -> &SubscriptionTag {
        &self.tag
    }

    pub fn order_id(&self) -> &OrderId {
        &self.tag.order_id
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SubscriptionState::Closed
    }

    pub(crate) fn on_event(&mut self, event: &ChannelEventKind) {
        let next = self.state.next(event);
        if next != self.state {
            trace!("🔌️ Subscription {} is now {next}", self.tag);
        }
        self.state = next;
        if self.is_closed() {
            // The transport has already finished.
            self.shutdown.take();
        }
    }

    /// Signals the transport to stop. Returns false if the subscription was already closed.
    pub(crate) fn close(&mut self) -> bool {
        let was_live = !self.is_closed();
        self.state = SubscriptionState::Closed;
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        was_live
    }

    /// Closes the subscription and waits for its transport task to wind down.
    pub(crate) async fn finish(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("🔌️ Transport task for {} did not finish cleanly. {e}", self.tag);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}
