use crate::app::App;
use crate::router::Routing;
use crate::ws::{Frame, Peer, WsBody, WsEvent, WsHandler};
use tokio::sync::mpsc;

fn chat_app() -> App {
    let mut app = App::new();
    app.ws("/chat", |event| async move {
        match event {
            WsEvent::Open(peer) => peer.subscribe("room"),
            WsEvent::Message(peer, WsBody::Text(text)) => peer.publish("room", text),
            WsEvent::Message(_, WsBody::Binary(_)) => {}
            WsEvent::Close(_) => {}
        }
    });
    app
}

async fn open_peer(
    handler: &WsHandler,
    hub: &std::sync::Arc<crate::ws::Hub>,
) -> (Peer, mpsc::UnboundedReceiver<Frame>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let peer = hub.connect(sender);
    handler(WsEvent::Open(peer.clone())).await;
    (peer, receiver)
}

fn drain_texts(receiver: &mut mpsc::UnboundedReceiver<Frame>) -> Vec<String> {
    let mut texts = Vec::new();
    while let Ok(frame) = receiver.try_recv() {
        if let Frame::Text(text) = frame {
            texts.push(text);
        }
    }
    texts
}

#[tokio::test]
async fn fan_out_reaches_every_subscriber_exactly_once() {
    let app = chat_app();
    let dispatcher = app.dispatcher();
    let handler = dispatcher.ws_handler("/chat").expect("route registered");
    let hub = dispatcher.hub().clone();

    let (peer_a, mut rx_a) = open_peer(&handler, &hub).await;
    let (_peer_b, mut rx_b) = open_peer(&handler, &hub).await;

    handler(WsEvent::Message(peer_a.clone(), WsBody::Text("hi".to_string()))).await;

    assert_eq!(drain_texts(&mut rx_a), vec!["hi"]);
    assert_eq!(drain_texts(&mut rx_b), vec!["hi"]);
}

#[tokio::test]
async fn closed_peers_no_longer_receive_publishes() {
    let app = chat_app();
    let dispatcher = app.dispatcher();
    let handler = dispatcher.ws_handler("/chat").expect("route registered");
    let hub = dispatcher.hub().clone();

    let (peer_a, mut rx_a) = open_peer(&handler, &hub).await;
    let (_peer_b, mut rx_b) = open_peer(&handler, &hub).await;

    // Transport-side close: the handler sees Close once, then the hub
    // forgets the peer.
    handler(WsEvent::Close(peer_a.clone())).await;
    hub.disconnect(peer_a.id());

    hub.publish("room", "bye");
    assert!(drain_texts(&mut rx_a).is_empty());
    assert_eq!(drain_texts(&mut rx_b), vec!["bye"]);
}

#[tokio::test]
async fn ws_routes_are_a_distinct_literal_index() {
    let mut app = App::new();
    app.ws("/chat", |_event| async move {});
    app.get("/chat", |event| async move {
        Ok(event.send(crate::res::responder::Text::new("http side")))
    });

    let dispatcher = app.dispatcher();
    assert!(dispatcher.ws_handler("/chat").is_some());
    assert!(dispatcher.ws_handler("/chat/extra").is_none());

    // The HTTP route on the same path is untouched.
    let out = dispatcher
        .dispatch(crate::req::HttpRequest::new(crate::types::Method::GET, "/chat"))
        .await;
    assert_eq!(&out.body[..], b"http side");
}

#[tokio::test]
async fn group_ws_routes_carry_the_prefix() {
    let mut app = App::new();
    app.group("/api", |api| {
        api.ws("/live", |_event| async move {});
    });

    let dispatcher = app.dispatcher();
    assert!(dispatcher.ws_handler("/api/live").is_some());
    assert!(dispatcher.ws_handler("/live").is_none());
}

#[tokio::test]
async fn peers_can_message_each_other_without_echo() {
    let app = {
        let mut app = App::new();
        app.ws("/chat", |event| async move {
            match event {
                WsEvent::Open(peer) => peer.subscribe("room"),
                WsEvent::Message(peer, WsBody::Text(text)) => {
                    peer.publish_others("room", text)
                }
                _ => {}
            }
        });
        app
    };

    let dispatcher = app.dispatcher();
    let handler = dispatcher.ws_handler("/chat").expect("route registered");
    let hub = dispatcher.hub().clone();

    let (peer_a, mut rx_a) = open_peer(&handler, &hub).await;
    let (_peer_b, mut rx_b) = open_peer(&handler, &hub).await;

    handler(WsEvent::Message(peer_a.clone(), WsBody::Text("hello".to_string()))).await;

    assert!(drain_texts(&mut rx_a).is_empty());
    assert_eq!(drain_texts(&mut rx_b), vec!["hello"]);
}
