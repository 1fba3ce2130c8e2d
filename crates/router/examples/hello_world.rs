use arc_router::router::get;
use arc_router::{handler_fn, Dispatcher, Request, Router};
use http::Method;
use http_body_util::BodyExt;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

async fn hello_world() -> &'static str {
    "Hello, World"
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder().route("/", get(handler_fn(hello_world))).build().expect("valid routes");
    let dispatcher = Dispatcher::new(router);

    for (method, uri) in [(Method::GET, "/"), (Method::POST, "/"), (Method::GET, "/unknown")] {
        let response = dispatcher.dispatch(Request::from_uri(method.clone(), uri)).await.expect("handler never fails");
        let status = response.status();
        let body = response.into_body().collect().await.expect("body is in memory").to_bytes();

        info!(%method, uri, %status, body = %String::from_utf8_lossy(&body), "dispatched");
    }
}
