use crate::app::App;
use crate::req::HttpRequest;
use crate::res::responder::Text;
use crate::router::Routing;
use crate::types::Method;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Trace = Arc<Mutex<Vec<&'static str>>>;

fn get(path: &str) -> HttpRequest {
    HttpRequest::new(Method::GET, path)
}

fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

fn recorded(trace: &Trace) -> Vec<&'static str> {
    trace.lock().unwrap().clone()
}

#[tokio::test]
async fn global_and_group_middleware_run_in_onion_order() {
    let log = trace();
    let mut app = App::new();

    let outer = log.clone();
    app.use_middleware(move |event, next| {
        let log = outer.clone();
        async move {
            log.lock().unwrap().push("m1-pre");
            let reply = next.run(event).await?;
            log.lock().unwrap().push("m1-post");
            Ok(reply)
        }
    });

    let inner = log.clone();
    let handler_log = log.clone();
    app.group("/api", move |api| {
        let inner = inner.clone();
        api.use_middleware(move |event, next| {
            let log = inner.clone();
            async move {
                log.lock().unwrap().push("m2-pre");
                let reply = next.run(event).await?;
                log.lock().unwrap().push("m2-post");
                Ok(reply)
            }
        });

        let handler_log = handler_log.clone();
        api.get("/x", move |event| {
            let log = handler_log.clone();
            async move {
                log.lock().unwrap().push("handler");
                Ok(event.send(Text::new("ok")))
            }
        });
    });

    let dispatcher = app.dispatcher();

    let out = dispatcher.dispatch(get("/api/x")).await;
    assert_eq!(out.status, 200);
    assert_eq!(
        recorded(&log),
        vec!["m1-pre", "m2-pre", "handler", "m2-post", "m1-post"]
    );

    log.lock().unwrap().clear();
    let out = dispatcher.dispatch(get("/api/y")).await;
    assert_eq!(out.status, 404);
    assert_eq!(recorded(&log), vec!["m1-pre", "m2-pre", "m2-post", "m1-post"]);
}

#[tokio::test]
async fn group_middleware_is_prefix_gated() {
    let log = trace();
    let mut app = App::new();

    let scoped = log.clone();
    app.group("/api", move |api| {
        let scoped = scoped.clone();
        api.use_middleware(move |event, next| {
            let log = scoped.clone();
            async move {
                log.lock().unwrap().push("api-mw");
                next.run(event).await
            }
        });
    });
    app.get("/other", |event| async move { Ok(event.send(Text::new("other"))) });

    let out = app.dispatcher().dispatch(get("/other")).await;
    assert_eq!(out.status, 200);
    assert!(recorded(&log).is_empty());
}

#[tokio::test]
async fn middleware_can_short_circuit() {
    let handled = Arc::new(AtomicUsize::new(0));
    let mut app = App::new();

    app.use_middleware(|event, _next| async move {
        let mut event = event;
        event.res.set_status(403);
        Ok(event.send(Text::new("blocked")))
    });

    let counter = handled.clone();
    app.get("/secret", move |event| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(event.send(Text::new("secret")))
        }
    });

    let out = app.dispatcher().dispatch(get("/secret")).await;
    assert_eq!(out.status, 403);
    assert_eq!(&out.body[..], b"blocked");
    assert_eq!(handled.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn terminal_dispatcher_runs_exactly_once_per_request() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut app = App::new();

    app.use_middleware(|event, next| async move { next.run(event).await });
    app.use_middleware(|event, next| async move { next.run(event).await });

    let counter = hits.clone();
    app.get("/once", move |event| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(event.send(Text::new("once")))
        }
    });

    app.dispatcher().dispatch(get("/once")).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn middleware_headers_survive_into_the_response() {
    let mut app = App::new();

    app.use_middleware(|mut event, next| async move {
        event.res.headers.insert("X-Powered-By", "viaduct");
        next.run(event).await
    });
    app.get("/hello", |event| async move { Ok(event.send(Text::new("hi"))) });

    let out = app.dispatcher().dispatch(get("/hello")).await;
    assert_eq!(out.headers.get("x-powered-by"), Some("viaduct"));
}

#[tokio::test]
async fn middleware_content_type_wins_over_the_responder() {
    let mut app = App::new();

    app.use_middleware(|mut event, next| async move {
        event
            .res
            .headers
            .insert("Content-Type", "application/vnd.custom");
        next.run(event).await
    });
    app.get("/hello", |event| async move { Ok(event.send(Text::new("hi"))) });

    let out = app.dispatcher().dispatch(get("/hello")).await;
    assert_eq!(out.headers.get("content-type"), Some("application/vnd.custom"));
    assert_eq!(&out.body[..], b"hi");
}

#[tokio::test]
async fn middleware_can_post_process_the_reply() {
    let mut app = App::new();

    app.use_middleware(|event, next| async move {
        let mut reply = next.run(event).await?;
        reply
            .event_mut()
            .res
            .headers
            .insert("X-Timing", "fast");
        Ok(reply)
    });
    app.get("/hello", |event| async move { Ok(event.send(Text::new("hi"))) });

    let out = app.dispatcher().dispatch(get("/hello")).await;
    assert_eq!(out.headers.get("x-timing"), Some("fast"));
}

#[tokio::test]
async fn middleware_errors_become_500() {
    let mut app = App::new();
    app.use_middleware(|_event, _next| async move {
        Err(crate::error::Error::handler("middleware gave up"))
    });
    app.get("/hello", |event| async move { Ok(event.send(Text::new("hi"))) });

    let out = app.dispatcher().dispatch(get("/hello")).await;
    assert_eq!(out.status, 500);
    assert_eq!(&out.body[..], b"Internal Server Error");
}
