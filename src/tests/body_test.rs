use crate::app::App;
use crate::error::BodyError;
use crate::req::body::{FromRequestBody, RequestBody};
use crate::req::HttpRequest;
use crate::res::responder::Text;
use crate::router::Routing;
use crate::types::Method;
use bytes::Bytes;
use serde_json::json;

fn post(body: &'static [u8], content_type: Option<&str>) -> HttpRequest {
    let mut req = HttpRequest::new(Method::POST, "/echo");
    if let Some(content_type) = content_type {
        req.set_header("Content-Type", content_type);
    }
    req.set_body(body);
    req
}

#[test]
fn json_content_type_dispatches_to_json() {
    let req = post(br#"{"a":1}"#, Some("application/json"));
    assert_eq!(req.body().unwrap(), RequestBody::Json(json!({ "a": 1 })));
}

#[test]
fn text_content_types_dispatch_to_text() {
    let req = post(b"plain words", Some("text/plain"));
    assert_eq!(
        req.body().unwrap(),
        RequestBody::Text("plain words".to_string())
    );

    let req = post(b"<p>hi</p>", Some("text/html; charset=utf-8"));
    assert_eq!(req.body().unwrap(), RequestBody::Text("<p>hi</p>".to_string()));
}

#[test]
fn unknown_or_missing_content_type_stays_raw() {
    let req = post(&[0, 159, 146, 150], Some("image/png"));
    assert_eq!(
        req.body().unwrap(),
        RequestBody::Bytes(Bytes::from_static(&[0, 159, 146, 150]))
    );

    let req = post(b"anything", None);
    assert_eq!(
        req.body().unwrap(),
        RequestBody::Bytes(Bytes::from_static(b"anything"))
    );
}

#[test]
fn empty_bodies_are_empty() {
    let req = post(b"", Some("application/json"));
    assert_eq!(req.body().unwrap(), RequestBody::Empty);
}

#[test]
fn invalid_utf8_text_is_an_invalid_text_error() {
    let req = post(&[0xff, 0xfe], Some("text/plain"));
    assert!(matches!(req.body(), Err(BodyError::InvalidText(_))));
    assert!(matches!(req.text(), Err(BodyError::InvalidText(_))));
}

#[test]
fn invalid_utf8_json_is_a_charset_error() {
    let req = post(&[0xff, 0xfe], Some("application/json"));
    assert!(matches!(req.body(), Err(BodyError::InvalidJsonCharset(_))));
}

#[test]
fn malformed_json_is_an_invalid_json_error() {
    let req = post(b"{not json", Some("application/json"));
    assert!(matches!(req.body(), Err(BodyError::InvalidJson(_))));
    assert!(matches!(
        req.json::<serde_json::Value>(),
        Err(BodyError::InvalidJson(_))
    ));
}

#[test]
fn typed_json_extraction() {
    #[derive(serde::Deserialize)]
    struct Login {
        username: String,
    }

    let req = post(br#"{"username":"ada"}"#, Some("application/json"));
    let login: Login = req.json().unwrap();
    assert_eq!(login.username, "ada");
}

#[test]
fn built_in_body_readers() {
    let req = post(b"raw", None);
    assert_eq!(req.body_as::<String>().unwrap(), "raw");
    assert_eq!(req.body_as::<Bytes>().unwrap(), Bytes::from_static(b"raw"));

    let req = post(br#"{"n":1}"#, Some("application/json"));
    assert_eq!(req.body_as::<serde_json::Value>().unwrap(), json!({ "n": 1 }));
}

#[test]
fn user_types_can_implement_their_own_reader() {
    struct CommaList(Vec<String>);

    impl FromRequestBody for CommaList {
        fn from_request(req: &HttpRequest) -> Result<Self, BodyError> {
            Ok(CommaList(
                req.text()?
                    .split(',')
                    .map(|piece| piece.trim().to_string())
                    .collect(),
            ))
        }
    }

    let req = post(b"a, b, c", Some("text/plain"));
    let list = req.body_as::<CommaList>().unwrap();
    assert_eq!(list.0, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn uncaught_body_errors_become_400() {
    let mut app = App::new();
    app.post("/ingest", |event| async move {
        let value: serde_json::Value = event.req.json()?;
        Ok(event.send(Text::new(value.to_string())))
    });

    let mut req = HttpRequest::new(Method::POST, "/ingest");
    req.set_header("Content-Type", "application/json");
    req.set_body(&b"{broken"[..]);

    let out = app.dispatcher().dispatch(req).await;
    assert_eq!(out.status, 400);
    assert_eq!(&out.body[..], b"Invalid body");
    assert_eq!(
        out.headers.get("content-type"),
        Some("text/plain; charset=utf-8")
    );
}

#[tokio::test]
async fn handlers_may_catch_body_errors_and_respond_differently() {
    let mut app = App::new();
    app.post("/lenient", |event| async move {
        let reply = match event.req.json::<serde_json::Value>() {
            Ok(value) => value.to_string(),
            Err(_) => "fallback".to_string(),
        };
        Ok(event.send(Text::new(reply)))
    });

    let mut req = HttpRequest::new(Method::POST, "/lenient");
    req.set_header("Content-Type", "application/json");
    req.set_body(&b"{broken"[..]);

    let out = app.dispatcher().dispatch(req).await;
    assert_eq!(out.status, 200);
    assert_eq!(&out.body[..], b"fallback");
}
