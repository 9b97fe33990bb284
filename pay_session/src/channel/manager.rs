use log::*;
use pay_common::OrderId;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use super::{
    subscription::{ChannelEvent, Subscription, SubscriptionTag},
    transport::{EventSink, PushTransport},
};
use crate::errors::SessionError;

pub struct OrderChannelManager<T: PushTransport> {
    transport: T,
    stream_url: Url,
    generation: u64,
    active: Option<Subscription>,
    sender: mpsc::UnboundedSender<ChannelEvent>,
    receiver: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl<T: PushTransport> OrderChannelManager<T> {
    pub fn new(transport: T, stream_url: Url) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { transport, stream_url, generation: 0, active: None, sender, receiver }
    }

    /// The stream address for an order: the stream base with the order id appended as one (escaped) path segment.
    pub fn endpoint_for(&self, order_id: &OrderId) -> Result<Url, SessionError> {
        let mut url = self.stream_url.clone();
        url.path_segments_mut()
            .map_err(|_| SessionError::Configuration(format!("{} cannot be used as a stream base", self.stream_url)))?
            .pop_if_empty()
            .push(order_id.as_str());
        Ok(url)
    }

    pub fn active(&self) -> Option<&Subscription> {
        self.active.as_ref()
    }

    /// Closes the current subscription, if any, and opens a new one for `order_id`.
    ///
    /// If no endpoint can be built for `order_id`, the current subscription is left untouched.
    pub fn bind(&mut self, order_id: OrderId) -> Result<&Subscription, SessionError> {
        let endpoint = self.endpoint_for(&order_id)?;
        self.close();
        self.discard_queued();
        self.generation += 1;
        let tag = SubscriptionTag { generation: self.generation, order_id };
        info!("🔌️ Subscribing to {endpoint} ({tag})");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let sink = EventSink::new(tag.clone(), self.sender.clone());
        let task = self.transport.open(endpoint.clone(), sink, shutdown_rx);
        Ok(self.active.insert(Subscription::new(tag, endpoint, shutdown_tx, task)))
    }

    /// Releases the current subscription. Returns false if there was nothing live to close.
    pub fn close(&mut self) -> bool {
        match self.active.take() {
            Some(mut subscription) => {
                let was_live = subscription.close();
                if was_live {
                    info!("🔌️ Closed subscription {}", subscription.tag());
                }
                was_live
            },
            None => false,
        }
    }

    /// Everything still queued belongs to a subscription that is about to be superseded.
    fn discard_queued(&mut self) {
        let mut dropped = 0;
        while self.receiver.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("🔌️ Dropped {dropped} queued event(s) from superseded subscriptions");
        }
    }

    /// Closes the current subscription and waits for its transport to finish.
    pub async fn shutdown(&mut self) {
        if let Some(subscription) = self.active.take() {
            subscription.finish().await;
        }
    }

    /// The next event of the current subscription.
    ///
    /// Events from superseded subscriptions are discarded. Returns `None` when nothing is bound or the bound
    /// subscription has closed.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        loop {
            let tag = match &self.active {
                Some(subscription) if !subscription.is_closed() => subscription.tag().clone(),
                _ => return None,
            };
            let event = self.receiver.recv().await?;
            if event.tag != tag {
                debug!("🔌️ Dropping {:?} from superseded subscription {}", event.kind, event.tag);
                continue;
            }
            if let Some(subscription) = self.active.as_mut() {
                subscription.on_event(&event.kind);
            }
            return Some(event);
        }
    }
}
