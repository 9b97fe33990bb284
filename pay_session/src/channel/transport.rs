use futures_util::StreamExt;
use log::*;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};
use url::Url;

use super::subscription::{ChannelEvent, ChannelEventKind, SubscriptionTag};

/// Where a transport reports what happens on its connection. Every event is stamped with the subscription's tag.
#[derive(Clone)]
pub struct EventSink {
    tag: SubscriptionTag,
    sender: mpsc::UnboundedSender<ChannelEvent>,
}

impl EventSink {
    pub fn new(tag: SubscriptionTag, sender: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        Self { tag, sender }
    }

    pub fn tag(&self) -> &SubscriptionTag {
        &self.tag
    }

    /// Returns false once nobody is listening any more.
    pub fn publish(&self, kind: ChannelEventKind) -> bool {
        self.sender.send(ChannelEvent { tag: self.tag.clone(), kind }).is_ok()
    }
}

/// Opens push connections.
///
/// An implementation must publish `Opened` once connected, a `Frame` for every payload, and finish with exactly one
/// of `Closed` or `TransportError`. It must stop publishing once `shutdown` resolves (or its sender is dropped).
pub trait PushTransport: Send + Sync {
    fn open(&self, endpoint: Url, sink: EventSink, shutdown: oneshot::Receiver<()>) -> JoinHandle<()>;
}

/// The production transport: one WebSocket connection per subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl PushTransport for WebSocketTransport {
    fn open(&self, endpoint: Url, sink: EventSink, shutdown: oneshot::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(run_socket(endpoint, sink, shutdown))
    }
}

async fn run_socket(endpoint: Url, sink: EventSink, mut shutdown: oneshot::Receiver<()>) {
    let tag = sink.tag().clone();
    let mut socket = tokio::select! {
        _ = &mut shutdown => {
            debug!("🔌️ {tag} was closed before the connection to {endpoint} was established");
            return;
        },
        res = connect_async(endpoint.as_str()) => match res {
            Ok((socket, _)) => socket,
            Err(e) => {
                warn!("🔌️ Could not connect to {endpoint}. {e}");
                sink.publish(ChannelEventKind::TransportError(e.to_string()));
                return;
            },
        },
    };
    debug!("🔌️ {tag} connected to {endpoint}");
    sink.publish(ChannelEventKind::Opened);
    let mut close_reason = None;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if let Err(e) = socket.close(None).await {
                    debug!("🔌️ {tag} could not send a close frame. {e}");
                }
                sink.publish(ChannelEventKind::Closed { reason: Some("closed by client".to_string()) });
                return;
            },
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    sink.publish(ChannelEventKind::Frame(text));
                },
                Some(Ok(Message::Binary(bytes))) => {
                    sink.publish(ChannelEventKind::Frame(String::from_utf8_lossy(&bytes).into_owned()));
                },
                Some(Ok(Message::Close(frame))) => {
                    // Keep reading so that the close handshake completes; the stream ends right after.
                    close_reason = frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty());
                },
                Some(Ok(_)) => {},
                Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed)) | None => {
                    debug!("🔌️ {tag} was closed by the server");
                    sink.publish(ChannelEventKind::Closed { reason: close_reason });
                    return;
                },
                Some(Err(e)) => {
                    warn!("🔌️ {tag} failed. {e}");
                    sink.publish(ChannelEventKind::TransportError(e.to_string()));
                    return;
                },
            },
        }
    }
}
