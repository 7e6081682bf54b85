use crate::app::Dispatcher;
use crate::error::Error;
use crate::req::HttpRequest;
use crate::res::headers::Headers;
use crate::types::Method;
use crate::ws::{Frame, Hub, WsBody, WsEvent, WsHandler};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::{Message, Role};
use tokio_tungstenite::WebSocketStream;

/// The response shape the core hands back to a transport: status, headers
/// (with `Set-Cookie` possibly repeated) and the serialised body.
pub struct OutboundResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: Headers,
    /// The serialised body bytes.
    pub body: Bytes,
}

/// The adapter the core runs on top of.
///
/// A transport binds a port, turns its own request representation into
/// [`HttpRequest`] values, feeds them through
/// [`Dispatcher::dispatch`], and emits the resulting [`OutboundResponse`].
/// For WebSockets it surfaces upgrades to the dispatcher's registered
/// handlers and pumps frames both ways.
#[async_trait]
pub trait Transport: Send {
    /// Binds the port and runs the accept loop. Only returns on a bind
    /// failure or a fatal transport error.
    async fn serve(self: Box<Self>, port: u16, dispatcher: Dispatcher) -> Result<(), Error>;
}

/// The bundled HTTP/1.1 transport, built on hyper and tokio.
///
/// Binds `127.0.0.1:<port>`, serves each connection on its own task with
/// keep-alive, and handles WebSocket upgrades for registered paths.
pub struct HyperTransport;

impl HyperTransport {
    /// Creates the default transport.
    pub fn new() -> Self {
        Self
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn serve(self: Box<Self>, port: u16, dispatcher: Dispatcher) -> Result<(), Error> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr).await?;

        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    dispatcher
                        .logger()
                        .warn(&|| format!("accept failed: {}", err));
                    continue;
                }
            };

            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn({
                    let dispatcher = dispatcher.clone();
                    move |req| {
                        let dispatcher = dispatcher.clone();
                        async move { handle_request(dispatcher, req).await }
                    }
                });

                if let Err(err) = hyper::server::conn::http1::Builder::new()
                    .keep_alive(true)
                    .serve_connection(io, service)
                    .with_upgrades()
                    .await
                {
                    dispatcher
                        .logger()
                        .debug(&|| format!("connection ended: {}", err));
                }
            });
        }
    }
}

async fn handle_request(
    dispatcher: Dispatcher,
    mut req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();

    if is_websocket_upgrade(&req) {
        if let Some(handler) = dispatcher.ws_handler(&path) {
            return Ok(accept_upgrade(&dispatcher, handler, &mut req));
        }
    }

    let method = Method::from(req.method());
    let mut our_req = HttpRequest::new(method, &path);
    if let Some(query) = req.uri().query() {
        let query = query.to_string();
        our_req.set_query_string(&query);
    }
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            our_req.set_header(name.as_str(), value);
        }
    }

    // Inbound I/O failure while reading the body counts as a body error.
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return Ok(plain_response(400, "Invalid body")),
    };
    our_req.set_body(body);

    let outbound = dispatcher.dispatch(our_req).await;

    let mut response = Response::new(Full::new(outbound.body));
    *response.status_mut() = hyper::StatusCode::from_u16(outbound.status)
        .unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
    *response.headers_mut() = outbound.headers.into_inner();
    Ok(response)
}

fn is_websocket_upgrade(req: &Request<Incoming>) -> bool {
    let upgrade = req
        .headers()
        .get(hyper::header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);
    let connection = req
        .headers()
        .get(hyper::header::CONNECTION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains("upgrade"))
        .unwrap_or(false);
    upgrade && connection
}

fn accept_upgrade(
    dispatcher: &Dispatcher,
    handler: WsHandler,
    req: &mut Request<Incoming>,
) -> Response<Full<Bytes>> {
    let key = match req
        .headers()
        .get(hyper::header::SEC_WEBSOCKET_KEY)
        .and_then(|value| value.to_str().ok())
    {
        Some(key) => key.to_string(),
        None => return plain_response(400, "Bad Request"),
    };
    let accept = derive_accept_key(key.as_bytes());

    let hub = dispatcher.hub().clone();
    let logger = dispatcher.logger().clone();
    let on_upgrade = hyper::upgrade::on(req);
    tokio::spawn(async move {
        match on_upgrade.await {
            Ok(upgraded) => drive_peer(hub, handler, upgraded).await,
            Err(err) => logger.debug(&|| format!("upgrade failed: {}", err)),
        }
    });

    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = hyper::StatusCode::SWITCHING_PROTOCOLS;
    let headers = response.headers_mut();
    headers.insert(
        hyper::header::UPGRADE,
        hyper::header::HeaderValue::from_static("websocket"),
    );
    headers.insert(
        hyper::header::CONNECTION,
        hyper::header::HeaderValue::from_static("Upgrade"),
    );
    if let Ok(accept) = hyper::header::HeaderValue::from_str(&accept) {
        headers.insert(hyper::header::SEC_WEBSOCKET_ACCEPT, accept);
    }
    response
}

async fn drive_peer(hub: Arc<Hub>, handler: WsHandler, upgraded: hyper::upgrade::Upgraded) {
    let io = TokioIo::new(upgraded);
    let socket = WebSocketStream::from_raw_socket(io, Role::Server, None).await;
    let (mut sink, mut stream) = socket.split();

    let (sender, mut outbound) = mpsc::unbounded_channel::<Frame>();

    // Writer side: drains the peer's frame queue in order.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let closing = matches!(frame, Frame::Close);
            let message = match frame {
                Frame::Text(text) => Message::Text(text),
                Frame::Binary(bytes) => Message::Binary(bytes.to_vec()),
                Frame::Pong(payload) => Message::Pong(payload),
                Frame::Close => Message::Close(None),
            };
            if sink.send(message).await.is_err() {
                break;
            }
            if closing {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let peer = hub.connect(sender);
    handler(WsEvent::Open(peer.clone())).await;

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handler(WsEvent::Message(peer.clone(), WsBody::Text(text))).await;
            }
            Ok(Message::Binary(bytes)) => {
                handler(WsEvent::Message(peer.clone(), WsBody::Binary(Bytes::from(bytes)))).await;
            }
            Ok(Message::Ping(payload)) => peer.pong(payload),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    handler(WsEvent::Close(peer.clone())).await;
    hub.disconnect(peer.id());
    peer.close();
    let _ = writer.await;
}

fn plain_response(status: u16, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = hyper::StatusCode::from_u16(status)
        .unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
