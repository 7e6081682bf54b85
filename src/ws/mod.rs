#![warn(missing_docs)]

use crate::logger::SharedLogger;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier assigned to a peer by the hub.
pub type PeerId = Uuid;

/// An outbound frame queued towards a peer's transport.
#[derive(Debug, Clone)]
pub enum Frame {
    /// A text frame.
    Text(String),
    /// A binary frame.
    Binary(Bytes),
    /// A pong answering a transport-level ping.
    Pong(Vec<u8>),
    /// Ask the transport to close the connection.
    Close,
}

/// The payload of an inbound WebSocket message.
#[derive(Debug, Clone, PartialEq)]
pub enum WsBody {
    /// A text frame's contents.
    Text(String),
    /// A binary frame's contents.
    Binary(Bytes),
}

/// An event delivered to a WebSocket route handler.
///
/// For every connection the handler sees exactly one [`Open`](WsEvent::Open),
/// zero or more [`Message`](WsEvent::Message), and exactly one
/// [`Close`](WsEvent::Close).
pub enum WsEvent {
    /// The upgrade was accepted and the peer is registered with the hub.
    Open(Peer),
    /// An inbound frame arrived.
    Message(Peer, WsBody),
    /// The connection ended. After this event the peer is removed from every
    /// channel and from the hub.
    Close(Peer),
}

/// The boxed future a WebSocket handler produces.
pub type WsFut = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A registered WebSocket route handler.
pub type WsHandler = Arc<dyn Fn(WsEvent) -> WsFut + Send + Sync + 'static>;

pub(crate) fn box_ws_future<F>(future: F) -> WsFut
where
    F: Future<Output = ()> + Send + 'static,
{
    Box::pin(future)
}

/// A connected WebSocket client.
///
/// A `Peer` is a cheap handle: the hub and the transport driver each hold
/// clones, and user code may keep more. Sends enqueue frames onto the
/// connection's writer; per-peer frame order is preserved. All pub/sub
/// operations go through the owning [`Hub`] via a weak back-reference, so a
/// peer outliving its hub degrades to a no-op.
#[derive(Clone)]
pub struct Peer {
    id: PeerId,
    sender: mpsc::UnboundedSender<Frame>,
    hub: Weak<Hub>,
}

impl Peer {
    /// The hub-assigned id of this peer.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Enqueues a text frame to this peer. Best-effort: a closed connection
    /// drops the frame.
    pub fn send<T: Into<String>>(&self, message: T) {
        let _ = self.try_send(Frame::Text(message.into()));
    }

    /// Enqueues a binary frame to this peer.
    pub fn send_bytes<B: Into<Bytes>>(&self, bytes: B) {
        let _ = self.try_send(Frame::Binary(bytes.into()));
    }

    /// Asks the transport to close this connection.
    pub fn close(&self) {
        let _ = self.try_send(Frame::Close);
    }

    pub(crate) fn pong(&self, payload: Vec<u8>) {
        let _ = self.try_send(Frame::Pong(payload));
    }

    pub(crate) fn try_send(&self, frame: Frame) -> Result<(), ()> {
        self.sender.send(frame).map_err(|_| ())
    }

    /// Subscribes this peer to a channel.
    pub fn subscribe(&self, channel: &str) {
        if let Some(hub) = self.hub.upgrade() {
            hub.subscribe(self.id, channel);
        }
    }

    /// Unsubscribes this peer from a channel.
    pub fn unsubscribe(&self, channel: &str) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id, channel);
        }
    }

    /// Publishes a text message to every subscriber of the channel,
    /// including this peer if subscribed.
    pub fn publish<T: Into<String>>(&self, channel: &str, message: T) {
        if let Some(hub) = self.hub.upgrade() {
            hub.publish(channel, message);
        }
    }

    /// Publishes a text message to every subscriber except this peer.
    pub fn publish_others<T: Into<String>>(&self, channel: &str, message: T) {
        if let Some(hub) = self.hub.upgrade() {
            hub.publish_except(channel, message, self.id);
        }
    }

    /// The channels this peer is currently subscribed to.
    pub fn subscriptions(&self) -> Vec<String> {
        self.hub
            .upgrade()
            .map(|hub| hub.subscriptions_of(self.id))
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct HubState {
    peers: HashMap<PeerId, Peer>,
    channels: HashMap<String, HashSet<PeerId>>,
    subscriptions: HashMap<PeerId, HashSet<String>>,
}

/// The WebSocket publish/subscribe hub.
///
/// Tracks connected peers and per-peer channel subscriptions. A single lock
/// guards membership; it is held only while mutating, and publishing sends
/// from a snapshot of the member list taken under the lock. Between
/// operations the invariant holds: a peer is in `channels[c]` iff `c` is in
/// that peer's subscription set.
pub struct Hub {
    state: Mutex<HubState>,
    logger: SharedLogger,
}

impl Hub {
    pub(crate) fn new(logger: SharedLogger) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            logger,
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a new peer around the transport's frame sender and returns
    /// its handle.
    pub fn connect(self: &Arc<Self>, sender: mpsc::UnboundedSender<Frame>) -> Peer {
        let peer = Peer {
            id: Uuid::new_v4(),
            sender,
            hub: Arc::downgrade(self),
        };
        let mut state = self.state();
        state.peers.insert(peer.id, peer.clone());
        state.subscriptions.insert(peer.id, HashSet::new());
        drop(state);

        self.logger
            .debug(&|| format!("ws peer {} connected", peer.id));
        peer
    }

    /// Adds a peer to a channel, creating the channel if needed. Unknown
    /// peers are ignored.
    pub fn subscribe(&self, peer: PeerId, channel: &str) {
        let mut state = self.state();
        if !state.peers.contains_key(&peer) {
            return;
        }
        state
            .channels
            .entry(channel.to_string())
            .or_default()
            .insert(peer);
        if let Some(subscriptions) = state.subscriptions.get_mut(&peer) {
            subscriptions.insert(channel.to_string());
        }
    }

    /// Removes a peer from a channel. The channel itself is dropped once its
    /// last member leaves.
    pub fn unsubscribe(&self, peer: PeerId, channel: &str) {
        let mut state = self.state();
        let emptied = match state.channels.get_mut(channel) {
            Some(members) => {
                members.remove(&peer);
                members.is_empty()
            }
            None => false,
        };
        if emptied {
            state.channels.remove(channel);
        }
        if let Some(subscriptions) = state.subscriptions.get_mut(&peer) {
            subscriptions.remove(channel);
        }
    }

    /// Removes a peer from every channel and from the peer table. The
    /// transport driver calls this after delivering `Close`.
    pub fn disconnect(&self, peer: PeerId) {
        let mut state = self.state();
        if let Some(channels) = state.subscriptions.remove(&peer) {
            for channel in channels {
                let emptied = match state.channels.get_mut(&channel) {
                    Some(members) => {
                        members.remove(&peer);
                        members.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    state.channels.remove(&channel);
                }
            }
        }
        state.peers.remove(&peer);
        drop(state);

        self.logger
            .debug(&|| format!("ws peer {} disconnected", peer));
    }

    /// Sends a text message to every subscriber of the channel.
    ///
    /// Delivery is best-effort: a peer whose connection is gone is skipped
    /// (logged at debug level) without affecting the others.
    pub fn publish<T: Into<String>>(&self, channel: &str, message: T) {
        let message = message.into();
        for peer in self.members(channel) {
            if peer.try_send(Frame::Text(message.clone())).is_err() {
                self.logger
                    .debug(&|| format!("ws peer {} unreachable, frame dropped", peer.id));
            }
        }
    }

    /// Sends a text message to every subscriber of the channel except one.
    pub fn publish_except<T: Into<String>>(&self, channel: &str, message: T, except: PeerId) {
        let message = message.into();
        for peer in self.members(channel) {
            if peer.id == except {
                continue;
            }
            if peer.try_send(Frame::Text(message.clone())).is_err() {
                self.logger
                    .debug(&|| format!("ws peer {} unreachable, frame dropped", peer.id));
            }
        }
    }

    fn members(&self, channel: &str) -> Vec<Peer> {
        let state = self.state();
        state
            .channels
            .get(channel)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|id| state.peers.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when the peer is subscribed to the channel.
    pub fn is_subscribed(&self, peer: PeerId, channel: &str) -> bool {
        self.state()
            .channels
            .get(channel)
            .map(|members| members.contains(&peer))
            .unwrap_or(false)
    }

    /// Number of connected peers.
    pub fn peer_count(&self) -> usize {
        self.state().peers.len()
    }

    /// The ids currently subscribed to a channel.
    pub fn channel_members(&self, channel: &str) -> Vec<PeerId> {
        self.state()
            .channels
            .get(channel)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    fn subscriptions_of(&self, peer: PeerId) -> Vec<String> {
        self.state()
            .subscriptions
            .get(&peer)
            .map(|channels| channels.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NopLogger;

    fn hub() -> Arc<Hub> {
        Arc::new(Hub::new(Arc::new(NopLogger)))
    }

    fn connect(hub: &Arc<Hub>) -> (Peer, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (hub.connect(tx), rx)
    }

    fn recv_text(rx: &mut mpsc::UnboundedReceiver<Frame>) -> Option<String> {
        match rx.try_recv() {
            Ok(Frame::Text(text)) => Some(text),
            _ => None,
        }
    }

    #[test]
    fn subscribe_and_unsubscribe_keep_both_sides_in_sync() {
        let hub = hub();
        let (peer, _rx) = connect(&hub);

        peer.subscribe("room");
        assert!(hub.is_subscribed(peer.id(), "room"));
        assert_eq!(peer.subscriptions(), vec!["room".to_string()]);

        peer.unsubscribe("room");
        assert!(!hub.is_subscribed(peer.id(), "room"));
        assert!(peer.subscriptions().is_empty());
        assert!(hub.channel_members("room").is_empty());
    }

    #[test]
    fn publish_reaches_every_subscriber_exactly_once() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        a.subscribe("room");
        b.subscribe("room");

        hub.publish("room", "hi");

        assert_eq!(recv_text(&mut rx_a).as_deref(), Some("hi"));
        assert_eq!(recv_text(&mut rx_b).as_deref(), Some("hi"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn publish_includes_the_publisher_when_subscribed() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub);
        a.subscribe("room");

        a.publish("room", "echo");
        assert_eq!(recv_text(&mut rx_a).as_deref(), Some("echo"));
    }

    #[test]
    fn publish_others_excludes_the_publisher() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        a.subscribe("room");
        b.subscribe("room");

        a.publish_others("room", "from a");
        assert!(rx_a.try_recv().is_err());
        assert_eq!(recv_text(&mut rx_b).as_deref(), Some("from a"));
    }

    #[test]
    fn disconnect_removes_the_peer_from_every_channel() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        a.subscribe("room");
        a.subscribe("other");
        b.subscribe("room");

        hub.disconnect(a.id());
        assert!(!hub.is_subscribed(a.id(), "room"));
        assert!(!hub.is_subscribed(a.id(), "other"));
        assert_eq!(hub.peer_count(), 1);

        hub.publish("room", "bye");
        assert!(rx_a.try_recv().is_err());
        assert_eq!(recv_text(&mut rx_b).as_deref(), Some("bye"));
    }

    #[test]
    fn empty_channels_are_dropped() {
        let hub = hub();
        let (a, _rx) = connect(&hub);
        a.subscribe("room");
        a.unsubscribe("room");
        assert!(hub.channel_members("room").is_empty());
    }

    #[test]
    fn delivery_failure_to_one_peer_does_not_abort_the_rest() {
        let hub = hub();
        let (a, rx_a) = connect(&hub);
        let (b, mut rx_b) = connect(&hub);
        a.subscribe("room");
        b.subscribe("room");

        // Peer a's transport is gone, its receiver dropped.
        drop(rx_a);
        hub.publish("room", "still delivered");

        assert_eq!(recv_text(&mut rx_b).as_deref(), Some("still delivered"));
    }

    #[test]
    fn unknown_peers_cannot_subscribe() {
        let hub = hub();
        let (a, _rx) = connect(&hub);
        hub.disconnect(a.id());

        hub.subscribe(a.id(), "room");
        assert!(hub.channel_members("room").is_empty());
    }
}
